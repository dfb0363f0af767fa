//! Scheduler daemon loop.
//!
//! Recovers timers before doing anything else, then rescans the store on a
//! fixed interval so bills created or forced by one-shot commands in another
//! process get their timers here.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use legislature::{Legislature, LifecycleEvent};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(
    legislature: Arc<Legislature>,
    resync_interval: Duration,
    shutdown: CancellationToken,
) -> Result<()> {
    let report = legislature
        .recover()
        .context("Startup recovery failed")?;
    info!(
        armed = report.armed(),
        overdue = report.overdue,
        "Scheduler ready"
    );

    let tap = tokio::spawn(log_events(legislature.clone(), shutdown.clone()));

    let mut resync = tokio::time::interval(resync_interval);
    // The first tick completes immediately and startup already recovered.
    resync.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = resync.tick() => {
                if let Err(e) = legislature.recover() {
                    warn!(error = %e, "Periodic resync failed");
                }
            }
        }
    }

    legislature.shutdown();
    let _ = tap.await;
    info!("Daemon stopped");
    Ok(())
}

async fn log_events(legislature: Arc<Legislature>, shutdown: CancellationToken) {
    let mut events = legislature.events().subscribe();
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => return,
            event = events.recv() => event,
        };
        match event {
            Ok(event) => log_event(&event),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagged"),
            Err(RecvError::Closed) => return,
        }
    }
}

fn log_event(event: &LifecycleEvent) {
    match serde_json::to_string(event) {
        Ok(json) => info!(
            event_type = event.event_type(),
            bill_id = event.bill_id(),
            event = %json,
            "Lifecycle event"
        ),
        Err(e) => warn!(error = %e, "Failed to serialize lifecycle event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use legislature::{
        EventBus, LegislatureConfig, LogAnnouncer, ProposalStatus, ProposalStore, VoteChoice,
        VoteLedger,
    };

    #[tokio::test(start_paused = true)]
    async fn test_daemon_closes_overdue_vote_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::open(dir.path().join("governance.db"))
            .unwrap()
            .shared();

        // Simulate a bill whose vote ended while the daemon was down
        let id = store.create("Transit Act", "Extend the night bus routes.", 3).unwrap();
        let now = Utc::now();
        store
            .set_vote_window(id, now - ChronoDuration::days(5), now - ChronoDuration::hours(1))
            .unwrap();
        store.set_status(id, ProposalStatus::Voting).unwrap();
        let ledger = VoteLedger::new(store.clone());
        ledger.cast(1, id, VoteChoice::Yes).unwrap();

        let legislature = Legislature::new(
            store.clone(),
            Arc::new(LogAnnouncer::new()),
            EventBus::new().shared(),
            LegislatureConfig::default(),
        );
        let mut events = legislature.events().subscribe();

        let shutdown = CancellationToken::new();
        let daemon = tokio::spawn(run(
            legislature.clone(),
            Duration::from_secs(300),
            shutdown.clone(),
        ));

        let closed = tokio::time::timeout(Duration::from_secs(60), async {
            loop {
                if let Ok(LifecycleEvent::VotingClosed { status, .. }) = events.recv().await {
                    return status;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(closed, ProposalStatus::Passed);
        assert_eq!(store.list_laws().unwrap().len(), 1);

        shutdown.cancel();
        daemon.await.unwrap().unwrap();
        assert!(legislature.scheduler().is_shut_down());
    }
}
