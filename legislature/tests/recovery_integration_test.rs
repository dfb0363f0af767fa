//! Restart recovery: a fresh process rebuilds its timers from the database
//! file and applies transitions whose deadlines passed while it was down.

mod common;

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use common::{harness, settle, wait_for, BODY};
use legislature::{
    LifecycleEvent, ProposalStatus, ProposalStore, SharedProposalStore, TimerKind, VoteChoice,
    VoteLedger,
};

fn open(path: &std::path::Path) -> SharedProposalStore {
    ProposalStore::open(path).unwrap().shared()
}

#[tokio::test(start_paused = true)]
async fn test_overdue_vote_is_closed_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("governance.db");

    // First process: open voting, collect ballots, then go down
    let id = {
        let first = harness(open(&db));
        let id = first
            .legislature
            .open_proposal("Harbor Act", BODY, 1)
            .await
            .unwrap()
            .id;
        first.legislature.force_open_voting(id).await.unwrap();
        for voter in 1..=3 {
            first
                .legislature
                .cast_vote(voter, id, VoteChoice::Yes)
                .await
                .unwrap();
        }
        first
            .legislature
            .cast_vote(4, id, VoteChoice::No)
            .await
            .unwrap();
        first.legislature.shutdown();
        id
    };

    // Downtime outlasts the vote window
    let store = open(&db);
    let now = Utc::now();
    store
        .set_vote_window(id, now - ChronoDuration::days(5), now - ChronoDuration::days(1))
        .unwrap();

    let mut second = harness(store);
    let report = second.legislature.recover().unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.armed_end, 1);
    assert_eq!(report.overdue, 1);

    let closed = wait_for(&mut second.events, |e| {
        matches!(e, LifecycleEvent::VotingClosed { .. })
    })
    .await;
    assert!(matches!(
        closed,
        LifecycleEvent::VotingClosed {
            status: ProposalStatus::Passed,
            law_id: Some(_),
            ..
        }
    ));
    let laws = second.legislature.list_approved_laws().unwrap();
    assert_eq!(laws.len(), 1);
    assert_eq!(laws[0].proposal_id, id);
}

#[tokio::test(start_paused = true)]
async fn test_missed_start_opens_voting_then_keeps_stored_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir.path().join("governance.db"));

    // Crashed between deadlines: debate over, vote window still running
    let id = store.create("Rail Act", BODY, 1).unwrap();
    let now = Utc::now();
    let vote_end = now + ChronoDuration::days(2);
    store
        .set_vote_window(id, now - ChronoDuration::days(2), vote_end)
        .unwrap();
    store.set_status(id, ProposalStatus::Debating).unwrap();

    let mut h = harness(store.clone());
    let report = h.legislature.recover().unwrap();
    assert_eq!(report.armed_start, 1);
    assert_eq!(report.overdue, 1);

    wait_for(&mut h.events, |e| {
        matches!(e, LifecycleEvent::VotingOpened { forced: false, .. })
    })
    .await;
    let proposal = h.legislature.show(id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Voting);
    assert_eq!(
        h.legislature.scheduler().fire_at(id, TimerKind::End),
        proposal.vote_end
    );
    assert_eq!(
        proposal.vote_end.map(|t| t.timestamp()),
        Some(vote_end.timestamp())
    );
}

#[tokio::test(start_paused = true)]
async fn test_missed_start_and_end_applies_both_in_order() {
    let store = ProposalStore::open_in_memory().unwrap().shared();
    let id = store.create("Dam Act", BODY, 1).unwrap();
    let now = Utc::now();
    store
        .set_vote_window(id, now - ChronoDuration::days(6), now - ChronoDuration::days(2))
        .unwrap();
    store.set_status(id, ProposalStatus::Debating).unwrap();

    let mut h = harness(store);
    h.legislature.recover().unwrap();

    let opened = wait_for(&mut h.events, |e| {
        matches!(
            e,
            LifecycleEvent::VotingOpened { .. } | LifecycleEvent::VotingClosed { .. }
        )
    })
    .await;
    assert_eq!(opened.event_type(), "voting_opened");
    wait_for(&mut h.events, |e| {
        matches!(e, LifecycleEvent::VotingClosed { .. })
    })
    .await;
    assert_eq!(h.legislature.show(id).unwrap().status, ProposalStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_recover_is_repeatable() {
    let store = ProposalStore::open_in_memory().unwrap().shared();
    let h = harness(store.clone());
    let a = h
        .legislature
        .open_proposal("Alpha Act", BODY, 1)
        .await
        .unwrap()
        .id;
    let b = h
        .legislature
        .open_proposal("Bravo Act", BODY, 2)
        .await
        .unwrap()
        .id;
    h.legislature.force_open_voting(b).await.unwrap();

    let before = h.legislature.scheduler().live_timers();
    for _ in 0..3 {
        h.legislature.recover().unwrap();
    }
    assert_eq!(h.legislature.scheduler().live_timers(), before);
    assert!(h.legislature.scheduler().is_armed(a, TimerKind::Start));
    assert!(h.legislature.scheduler().is_armed(b, TimerKind::End));
}

#[tokio::test(start_paused = true)]
async fn test_terminal_and_awaiting_bills_are_not_armed() {
    let store = ProposalStore::open_in_memory().unwrap().shared();
    let awaiting = store.create("Idle Act", BODY, 1).unwrap();
    let vetoed = store.create("Vetoed Act", BODY, 1).unwrap();
    let now = Utc::now();
    store
        .set_vote_window(vetoed, now, now + ChronoDuration::days(4))
        .unwrap();
    store.set_status(vetoed, ProposalStatus::Vetoed).unwrap();

    let h = harness(store);
    let report = h.legislature.recover().unwrap();
    assert_eq!(report.scanned, 0);
    assert!(h.legislature.scheduler().is_empty());

    tokio::time::sleep(Duration::from_secs(7 * 24 * 3600)).await;
    settle().await;
    assert_eq!(
        h.legislature.show(awaiting).unwrap().status,
        ProposalStatus::Awaiting
    );
    assert_eq!(
        h.legislature.show(vetoed).unwrap().status,
        ProposalStatus::Vetoed
    );
}

#[tokio::test(start_paused = true)]
async fn test_ledger_counts_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("governance.db");
    let id = {
        let store = open(&db);
        let id = store.create("Count Act", BODY, 1).unwrap();
        let ledger = VoteLedger::new(store.clone());
        assert!(ledger.cast(1, id, VoteChoice::Abstain).unwrap());
        assert!(ledger.cast(2, id, VoteChoice::No).unwrap());
        id
    };

    let store = open(&db);
    let ledger = VoteLedger::new(store.clone());
    assert!(!ledger.cast(1, id, VoteChoice::Yes).unwrap());
    assert_eq!(ledger.get_vote(1, id).unwrap(), Some(VoteChoice::Abstain));
    let counts = store.vote_counts(id).unwrap();
    assert_eq!((counts.yes, counts.no, counts.abstain), (0, 1, 1));
    assert_eq!(store.ballot_count(id).unwrap(), 2);
}
