//! Transition handlers
//!
//! Every transition commits to the store first, then updates the timer table,
//! publishes a [`LifecycleEvent`], and finally announces. An announcement
//! failure is logged and never rolls the transition back.
//!
//! ```text
//! awaiting ──open_debate──▶ debating ──start timer──▶ voting ──end timer──▶ passed | failed
//!     │                        │                        │
//!     └────────────── veto (any non-terminal) ──────────┴──▶ vetoed
//! ```
//!
//! Handlers reached from a timer re-check the stored status and do nothing
//! when it no longer matches, so a stale timer (after a veto or a forced
//! transition) is harmless.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::error::{LifecycleError, LifecycleResult};
use crate::announce::{Announcement, Announcer};
use crate::config::LegislatureConfig;
use crate::events::{LifecycleEvent, SharedEventBus};
use crate::proposal::{
    Law, MemberId, MessageKind, MessageRef, Proposal, ProposalId, ProposalStatus, VoteChoice,
};
use crate::scheduler::{LifecycleScheduler, RecoveryReport, TimerHandler, TimerKind};
use crate::store::{BallotOutcome, ClosedVote, SharedProposalStore, StoreError, VoteLedger};

/// Result of a ballot submitted through [`Legislature::cast_vote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CastOutcome {
    Accepted,
    /// The member already voted; the earlier ballot stands.
    AlreadyVoted { existing: Option<VoteChoice> },
    /// The bill is not inside its vote window.
    VotingClosed,
}

/// The legislative core: store, ledger, scheduler and announcer wired together.
///
/// Built with [`Legislature::new`], which hands the scheduler a weak
/// reference back to this value as its timer handler.
pub struct Legislature {
    store: SharedProposalStore,
    ledger: VoteLedger,
    scheduler: LifecycleScheduler,
    announcer: Arc<dyn Announcer>,
    events: SharedEventBus,
    config: LegislatureConfig,
}

impl Legislature {
    pub fn new(
        store: SharedProposalStore,
        announcer: Arc<dyn Announcer>,
        events: SharedEventBus,
        config: LegislatureConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Legislature>| {
            let handler: Weak<dyn TimerHandler> = this.clone();
            Self {
                ledger: VoteLedger::new(store.clone()),
                scheduler: LifecycleScheduler::new(store.clone(), handler),
                store,
                announcer,
                events,
                config,
            }
        })
    }

    pub fn store(&self) -> &SharedProposalStore {
        &self.store
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub fn scheduler(&self) -> &LifecycleScheduler {
        &self.scheduler
    }

    pub fn events(&self) -> &SharedEventBus {
        &self.events
    }

    pub fn config(&self) -> &LegislatureConfig {
        &self.config
    }

    // =========================================================================
    // Submission and debate
    // =========================================================================

    /// Validate and record a new bill, announce it, then open its debate.
    pub async fn open_proposal(
        &self,
        title: &str,
        body: &str,
        proposer: MemberId,
    ) -> LifecycleResult<Proposal> {
        let title = title.trim();
        let body = body.trim();
        self.validate_submission(title, body)?;

        let id = self.store.create(title, body, proposer)?;
        info!(bill_id = id, proposer, "Bill submitted");
        self.events.publish(LifecycleEvent::ProposalCreated {
            bill_id: id,
            proposer,
            timestamp: Utc::now(),
        });

        self.announce(
            Announcement::ProposalSubmitted {
                bill_id: id,
                title: title.to_string(),
                body: body.to_string(),
                proposer,
            },
            Some(MessageKind::Proposal),
        )
        .await;

        // Awaiting bills are never rescanned; staff re-run the debate step.
        self.open_debate(id).await.map_err(|e| {
            error!(bill_id = id, error = %e, "Bill left awaiting, debate was not opened");
            e
        })
    }

    fn validate_submission(&self, title: &str, body: &str) -> LifecycleResult<()> {
        let title_len = title.chars().count();
        if title_len < self.config.min_title_len || title_len > self.config.max_title_len {
            return Err(LifecycleError::InvalidSubmission(format!(
                "title must be {}-{} characters, got {}",
                self.config.min_title_len, self.config.max_title_len, title_len
            )));
        }
        let body_len = body.chars().count();
        if body_len < self.config.min_body_len || body_len > self.config.max_body_len {
            return Err(LifecycleError::InvalidSubmission(format!(
                "bill text must be {}-{} characters, got {}",
                self.config.min_body_len, self.config.max_body_len, body_len
            )));
        }
        Ok(())
    }

    /// Stamp the vote window from `created_at` and arm the start timer.
    ///
    /// Only valid from `awaiting`.
    pub async fn open_debate(&self, id: ProposalId) -> LifecycleResult<Proposal> {
        let proposal = self.store.require(id)?;
        let vote_start = proposal.created_at + self.config.debate_delay();
        let vote_end = vote_start + self.config.vote_duration();

        let applied = self.store.transition_with_window(
            id,
            &ProposalStatus::sources_of(ProposalStatus::Debating),
            ProposalStatus::Debating,
            vote_start,
            vote_end,
        )?;
        if !applied {
            return Err(self.rejected(id, "open debate")?);
        }

        self.scheduler.arm(id, TimerKind::Start, vote_start);
        info!(bill_id = id, vote_start = %vote_start, vote_end = %vote_end, "Debate opened");
        self.events.publish(LifecycleEvent::DebateOpened {
            bill_id: id,
            vote_start,
            vote_end,
            timestamp: Utc::now(),
        });

        let announced = self
            .announce(
                Announcement::DebateOpened {
                    bill_id: id,
                    title: proposal.title.clone(),
                    body: proposal.body.clone(),
                    vote_start,
                    vote_end,
                },
                Some(MessageKind::Debate),
            )
            .await;
        if let Some(message) = announced {
            let name = format!("Debate: Bill #{}", id);
            if let Err(e) = self.announcer.create_thread(&message, &name).await {
                warn!(bill_id = id, error = %e, "Failed to open debate thread");
            }
        }

        Ok(self.store.require(id)?)
    }

    // =========================================================================
    // Voting
    // =========================================================================

    /// Open voting when the start timer fires.
    ///
    /// Returns `false` without changing anything if the bill is no longer
    /// `debating`.
    pub async fn open_voting(&self, id: ProposalId) -> LifecycleResult<bool> {
        let proposal = self.store.require(id)?;
        if proposal.status != ProposalStatus::Debating {
            debug!(bill_id = id, status = %proposal.status, "Start timer ignored");
            return Ok(false);
        }

        let (vote_start, vote_end) = match (proposal.vote_start, proposal.vote_end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                let now = Utc::now().trunc_subsecs(6);
                (now, now + self.config.vote_duration())
            }
        };
        let applied = self.store.transition_with_window(
            id,
            &[ProposalStatus::Debating],
            ProposalStatus::Voting,
            vote_start,
            vote_end,
        )?;
        if !applied {
            debug!(bill_id = id, "Start timer lost race to another transition");
            return Ok(false);
        }

        self.enter_voting(&proposal, vote_start, vote_end, false).await;
        Ok(true)
    }

    /// Administrative start: open voting now from any non-terminal status
    /// with a fresh window of the configured duration.
    pub async fn force_open_voting(&self, id: ProposalId) -> LifecycleResult<Proposal> {
        let proposal = self.store.require(id)?;
        // Stored timestamps keep microseconds; match them so timers line up
        let vote_start = Utc::now().trunc_subsecs(6);
        let vote_end = vote_start + self.config.vote_duration();

        let applied = self.store.transition_with_window(
            id,
            &ProposalStatus::sources_of(ProposalStatus::Voting),
            ProposalStatus::Voting,
            vote_start,
            vote_end,
        )?;
        if !applied {
            return Err(self.rejected(id, "start voting")?);
        }

        self.scheduler.cancel(id, TimerKind::Start);
        self.enter_voting(&proposal, vote_start, vote_end, true).await;
        Ok(self.store.require(id)?)
    }

    async fn enter_voting(
        &self,
        proposal: &Proposal,
        vote_start: DateTime<Utc>,
        vote_end: DateTime<Utc>,
        forced: bool,
    ) {
        let id = proposal.id;
        self.scheduler.arm(id, TimerKind::End, vote_end);
        info!(bill_id = id, vote_end = %vote_end, forced, "Voting opened");
        self.events.publish(LifecycleEvent::VotingOpened {
            bill_id: id,
            vote_end,
            forced,
            timestamp: Utc::now(),
        });

        self.announce(
            Announcement::VotingOpened {
                bill_id: id,
                title: proposal.title.clone(),
                body: proposal.body.clone(),
                vote_start,
                vote_end,
            },
            Some(MessageKind::Vote),
        )
        .await;
    }

    /// Record a member's ballot while the vote window is open.
    pub async fn cast_vote(
        &self,
        voter: MemberId,
        id: ProposalId,
        choice: VoteChoice,
    ) -> LifecycleResult<CastOutcome> {
        match self.ledger.cast_while_open(voter, id, choice, Utc::now())? {
            BallotOutcome::Recorded => {}
            BallotOutcome::WindowClosed => return Ok(CastOutcome::VotingClosed),
            BallotOutcome::Duplicate => {
                let existing = self.ledger.get_vote(voter, id)?;
                return Ok(CastOutcome::AlreadyVoted { existing });
            }
        }

        self.events.publish(LifecycleEvent::VoteCast {
            bill_id: id,
            voter,
            choice,
            timestamp: Utc::now(),
        });
        Ok(CastOutcome::Accepted)
    }

    /// Tally and close. A no-op returning `None` once the bill has left
    /// `voting`, so a forced close and the end timer can race safely.
    pub async fn close_voting(&self, id: ProposalId) -> LifecycleResult<Option<ClosedVote>> {
        let closed = self.store.close_voting(id, |counts| {
            if counts.passes() {
                ProposalStatus::Passed
            } else {
                ProposalStatus::Failed
            }
        })?;
        let Some(closed) = closed else {
            debug!(bill_id = id, "Close ignored, bill not in voting");
            return Ok(None);
        };

        self.scheduler.cancel(id, TimerKind::End);
        info!(
            bill_id = id,
            status = %closed.status,
            yes = closed.counts.yes,
            no = closed.counts.no,
            abstain = closed.counts.abstain,
            "Voting closed"
        );
        if let Some(law) = &closed.law {
            info!(bill_id = id, law_id = law.id, "Law enacted");
        }
        self.events.publish(LifecycleEvent::VotingClosed {
            bill_id: id,
            status: closed.status,
            counts: closed.counts,
            law_id: closed.law.as_ref().map(|law| law.id),
            timestamp: Utc::now(),
        });

        if let Some(proposal) = self.store.get(id)? {
            self.announce(
                Announcement::VotingClosed {
                    bill_id: id,
                    title: proposal.title,
                    body: proposal.body,
                    status: closed.status,
                    counts: closed.counts,
                },
                None,
            )
            .await;
        }
        Ok(Some(closed))
    }

    /// Administrative end: close now. Rejected before voting has opened or
    /// after the bill has already closed.
    pub async fn force_close_voting(&self, id: ProposalId) -> LifecycleResult<ClosedVote> {
        match self.close_voting(id).await? {
            Some(closed) => Ok(closed),
            None => Err(self.rejected(id, "end voting")?),
        }
    }

    // =========================================================================
    // Administrative
    // =========================================================================

    /// Veto from any non-terminal status. Counters are kept; pending timers
    /// are left to no-op when they fire.
    pub async fn veto(&self, id: ProposalId, reason: Option<String>) -> LifecycleResult<Proposal> {
        let proposal = self.store.require(id)?;
        let applied = self.store.compare_and_set_status(
            id,
            &ProposalStatus::sources_of(ProposalStatus::Vetoed),
            ProposalStatus::Vetoed,
        )?;
        if !applied {
            return Err(self.rejected(id, "veto")?);
        }

        info!(bill_id = id, previous = %proposal.status, reason = reason.as_deref().unwrap_or(""), "Bill vetoed");
        self.events.publish(LifecycleEvent::Vetoed {
            bill_id: id,
            previous: proposal.status,
            reason: reason.clone(),
            timestamp: Utc::now(),
        });

        self.announce(
            Announcement::Vetoed {
                bill_id: id,
                title: proposal.title,
                body: proposal.body,
                reason,
            },
            None,
        )
        .await;
        Ok(self.store.require(id)?)
    }

    /// Move any bill that is not already archived to `archived`.
    pub async fn archive(&self, id: ProposalId) -> LifecycleResult<Proposal> {
        let proposal = self.store.require(id)?;
        let from = ProposalStatus::sources_of(ProposalStatus::Archived);
        if !self
            .store
            .compare_and_set_status(id, &from, ProposalStatus::Archived)?
        {
            return Err(self.rejected(id, "archive")?);
        }

        self.scheduler.cancel_all(id);
        info!(bill_id = id, previous = %proposal.status, "Bill archived");
        self.events.publish(LifecycleEvent::Archived {
            bill_id: id,
            previous: proposal.status,
            timestamp: Utc::now(),
        });
        Ok(self.store.require(id)?)
    }

    /// Delete a bill and its ballots. Enacted laws are kept.
    pub async fn remove(&self, id: ProposalId) -> LifecycleResult<()> {
        self.scheduler.cancel_all(id);
        self.store.remove(id)?;
        self.events.publish(LifecycleEvent::Removed {
            bill_id: id,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    pub fn show(&self, id: ProposalId) -> LifecycleResult<Proposal> {
        Ok(self.store.require(id)?)
    }

    /// Enacted laws, newest first
    pub fn list_approved_laws(&self) -> LifecycleResult<Vec<Law>> {
        Ok(self.store.list_laws()?)
    }

    /// Rebuild timers from the store. Run before accepting traffic.
    pub fn recover(&self) -> LifecycleResult<RecoveryReport> {
        Ok(self.scheduler.recover()?)
    }

    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Build the rejection for an action that did not apply to the bill's
    /// current status.
    fn rejected(&self, id: ProposalId, action: &'static str) -> LifecycleResult<LifecycleError> {
        let status = self.store.require(id)?.status;
        debug!(bill_id = id, status = %status, action, "Transition rejected");
        Ok(LifecycleError::InvalidTransition { id, status, action })
    }

    /// Post an announcement and remember its reference. Failures are logged.
    async fn announce(
        &self,
        announcement: Announcement,
        kind: Option<MessageKind>,
    ) -> Option<MessageRef> {
        let bill_id = announcement.bill_id();
        let message = match self.announcer.post(&announcement).await {
            Ok(message) => message,
            Err(e) => {
                warn!(bill_id, announcement = announcement.kind(), error = %e, "Announcement failed");
                return None;
            }
        };

        if let Some(kind) = kind {
            match self.store.set_message_ref(bill_id, kind, &message) {
                Ok(()) => {}
                // Removed while the post was in flight
                Err(StoreError::NotFound(_)) => {}
                Err(e) => warn!(bill_id, error = %e, "Failed to store message reference"),
            }
        }
        Some(message)
    }
}

#[async_trait]
impl TimerHandler for Legislature {
    async fn on_timer(&self, bill_id: ProposalId, kind: TimerKind) -> anyhow::Result<()> {
        let result = match kind {
            TimerKind::Start => self.open_voting(bill_id).await.map(|_| ()),
            TimerKind::End => self.close_voting(bill_id).await.map(|_| ()),
        };
        match result {
            Err(LifecycleError::NotFound(_)) => {
                debug!(bill_id, kind = %kind, "Timer fired for a removed bill");
                Ok(())
            }
            other => Ok(other?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::{MockAnnouncer, RenderError};
    use crate::events::EventBus;
    use crate::store::ProposalStore;
    use chrono::Duration;

    const BODY: &str = "An act to establish public parks in every district.";

    fn legislature_with(announcer: MockAnnouncer) -> Arc<Legislature> {
        let store = ProposalStore::open_in_memory().unwrap().shared();
        Legislature::new(
            store,
            Arc::new(announcer),
            EventBus::new().shared(),
            LegislatureConfig::default(),
        )
    }

    fn accepting_announcer() -> MockAnnouncer {
        let mut announcer = MockAnnouncer::new();
        announcer
            .expect_post()
            .returning(|a| Ok(MessageRef::new(format!("msg-{}", a.kind()))));
        announcer
            .expect_create_thread()
            .returning(|_, name| Ok(MessageRef::new(name.to_string())));
        announcer
    }

    #[tokio::test]
    async fn test_open_proposal_stamps_window_from_created_at() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 42)
            .await
            .unwrap();

        assert_eq!(proposal.status, ProposalStatus::Debating);
        let start = proposal.vote_start.unwrap();
        let end = proposal.vote_end.unwrap();
        assert_eq!(start - proposal.created_at, Duration::hours(48));
        assert_eq!(end - start, Duration::days(4));
        assert!(legislature.scheduler().is_armed(proposal.id, TimerKind::Start));
        assert!(!legislature.scheduler().is_armed(proposal.id, TimerKind::End));

        assert_eq!(
            proposal.proposal_message,
            Some(MessageRef::new("msg-proposal_submitted"))
        );
        assert_eq!(
            proposal.debate_message,
            Some(MessageRef::new("msg-debate_opened"))
        );
    }

    #[tokio::test]
    async fn test_debate_thread_is_named_after_bill() {
        let mut announcer = MockAnnouncer::new();
        announcer
            .expect_post()
            .returning(|_| Ok(MessageRef::new("m")));
        announcer
            .expect_create_thread()
            .withf(|_, name| name == "Debate: Bill #1")
            .times(1)
            .returning(|_, _| Ok(MessageRef::new("t")));

        let legislature = legislature_with(announcer);
        legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_submissions_are_rejected() {
        let legislature = legislature_with(MockAnnouncer::new());

        let short_title = legislature.open_proposal("Act", BODY, 1).await;
        assert!(matches!(short_title, Err(LifecycleError::InvalidSubmission(_))));

        let short_body = legislature.open_proposal("Parks Act", "  too short  ", 1).await;
        assert!(matches!(short_body, Err(LifecycleError::InvalidSubmission(_))));

        let long_title = "x".repeat(101);
        let result = legislature.open_proposal(&long_title, BODY, 1).await;
        assert!(matches!(result, Err(LifecycleError::InvalidSubmission(_))));

        assert!(legislature.store().get(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_render_failure_does_not_roll_back() {
        let mut announcer = MockAnnouncer::new();
        announcer
            .expect_post()
            .returning(|_| Err(RenderError::Delivery("gateway timeout".into())));
        announcer.expect_create_thread().never();

        let legislature = legislature_with(announcer);
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 7)
            .await
            .unwrap();
        assert_eq!(proposal.status, ProposalStatus::Debating);
        assert!(proposal.proposal_message.is_none());
        assert!(proposal.debate_message.is_none());

        let forced = legislature.force_open_voting(proposal.id).await.unwrap();
        assert_eq!(forced.status, ProposalStatus::Voting);
    }

    #[tokio::test]
    async fn test_open_debate_only_from_awaiting() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();

        let again = legislature.open_debate(proposal.id).await;
        assert!(matches!(
            again,
            Err(LifecycleError::InvalidTransition {
                status: ProposalStatus::Debating,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_force_open_voting_restamps_window() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();

        let before = Utc::now();
        let voting = legislature.force_open_voting(proposal.id).await.unwrap();
        assert_eq!(voting.status, ProposalStatus::Voting);
        assert!(voting.vote_start.unwrap() >= before - Duration::seconds(1));
        assert_eq!(
            voting.vote_end.unwrap() - voting.vote_start.unwrap(),
            Duration::days(4)
        );
        assert!(!legislature.scheduler().is_armed(proposal.id, TimerKind::Start));
        assert_eq!(
            legislature.scheduler().fire_at(proposal.id, TimerKind::End),
            voting.vote_end
        );
        assert_eq!(voting.vote_message, Some(MessageRef::new("msg-voting_opened")));
    }

    #[tokio::test]
    async fn test_stale_start_timer_is_noop() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();
        legislature.veto(proposal.id, None).await.unwrap();

        assert!(!legislature.open_voting(proposal.id).await.unwrap());
        assert_eq!(
            legislature.show(proposal.id).unwrap().status,
            ProposalStatus::Vetoed
        );
    }

    #[tokio::test]
    async fn test_cast_vote_outcomes() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();

        // Debating: window not open yet
        assert_eq!(
            legislature
                .cast_vote(5, proposal.id, VoteChoice::Yes)
                .await
                .unwrap(),
            CastOutcome::VotingClosed
        );

        legislature.force_open_voting(proposal.id).await.unwrap();
        assert_eq!(
            legislature
                .cast_vote(5, proposal.id, VoteChoice::Yes)
                .await
                .unwrap(),
            CastOutcome::Accepted
        );
        assert_eq!(
            legislature
                .cast_vote(5, proposal.id, VoteChoice::No)
                .await
                .unwrap(),
            CastOutcome::AlreadyVoted {
                existing: Some(VoteChoice::Yes)
            }
        );
        assert_eq!(
            legislature.store().vote_counts(proposal.id).unwrap().total(),
            1
        );

        assert!(matches!(
            legislature.cast_vote(5, 999, VoteChoice::Yes).await,
            Err(LifecycleError::NotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_force_close_rejected_before_voting() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();

        let result = legislature.force_close_voting(proposal.id).await;
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition {
                action: "end voting",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_close_voting_idempotent() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();
        legislature.force_open_voting(proposal.id).await.unwrap();
        legislature
            .cast_vote(2, proposal.id, VoteChoice::Yes)
            .await
            .unwrap();

        let first = legislature.close_voting(proposal.id).await.unwrap().unwrap();
        assert_eq!(first.status, ProposalStatus::Passed);
        assert!(first.law.is_some());
        assert!(legislature.close_voting(proposal.id).await.unwrap().is_none());
        assert_eq!(legislature.list_approved_laws().unwrap().len(), 1);
        assert!(legislature.scheduler().is_empty());
    }

    #[tokio::test]
    async fn test_veto_rejected_after_close() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();
        legislature.force_open_voting(proposal.id).await.unwrap();
        legislature.close_voting(proposal.id).await.unwrap();

        let result = legislature.veto(proposal.id, Some("late".into())).await;
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition {
                status: ProposalStatus::Failed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_archive_cancels_timers() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();

        let archived = legislature.archive(proposal.id).await.unwrap();
        assert_eq!(archived.status, ProposalStatus::Archived);
        assert!(legislature.scheduler().is_empty());
        assert!(legislature.archive(proposal.id).await.is_err());
    }

    #[tokio::test]
    async fn test_timer_for_removed_bill_is_ignored() {
        let legislature = legislature_with(accepting_announcer());
        let proposal = legislature
            .open_proposal("Parks Act", BODY, 1)
            .await
            .unwrap();
        legislature.remove(proposal.id).await.unwrap();

        assert!(legislature.scheduler().is_empty());
        legislature
            .on_timer(proposal.id, TimerKind::End)
            .await
            .unwrap();
        assert!(matches!(
            legislature.remove(proposal.id).await,
            Err(LifecycleError::NotFound(_))
        ));
    }
}
