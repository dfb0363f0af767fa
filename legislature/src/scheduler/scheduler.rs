//! Lifecycle scheduler - owned timer table keyed by (bill, kind)
//!
//! Each armed timer is its own Tokio task, so one slow or failing transition
//! never delays another bill's wakeup. The table is a cache of the store's
//! deadlines and is rebuilt by [`LifecycleScheduler::recover`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::recovery::{self, RecoveryAction, RecoveryReport};
use super::timer::{TimerHandler, TimerKey, TimerKind};
use crate::proposal::ProposalId;
use crate::store::{SharedProposalStore, StoreResult};

/// Shared reference to LifecycleScheduler
pub type SharedScheduler = Arc<LifecycleScheduler>;

struct TimerEntry {
    generation: u64,
    fire_at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

struct Inner {
    timers: Mutex<HashMap<TimerKey, TimerEntry>>,
    next_generation: AtomicU64,
    handler: Weak<dyn TimerHandler>,
    shutdown: CancellationToken,
}

impl Inner {
    fn timers(&self) -> MutexGuard<'_, HashMap<TimerKey, TimerEntry>> {
        // The table holds no invariants a panicking holder could break halfway.
        self.timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remove the entry if it still belongs to `generation`.
    ///
    /// A timer that loses this check was replaced or cancelled after its
    /// sleep finished and must not fire.
    fn claim(&self, key: TimerKey, generation: u64) -> bool {
        let mut timers = self.timers();
        match timers.get(&key) {
            Some(entry) if entry.generation == generation => {
                timers.remove(&key);
                true
            }
            _ => false,
        }
    }
}

/// Owns the pending deadline timers of every bill
pub struct LifecycleScheduler {
    inner: Arc<Inner>,
    store: SharedProposalStore,
}

impl LifecycleScheduler {
    /// Create a scheduler that reports fired timers to `handler`.
    ///
    /// The handler is held weakly so it can own the scheduler.
    pub fn new(store: SharedProposalStore, handler: Weak<dyn TimerHandler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                timers: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                handler,
                shutdown: CancellationToken::new(),
            }),
            store,
        }
    }

    /// Create a shared reference to this scheduler
    pub fn shared(self) -> SharedScheduler {
        Arc::new(self)
    }

    /// Schedule a callback at `fire_at`, replacing any timer with the same key.
    ///
    /// A deadline at or before now fires on the next scheduler tick. Must be
    /// called from within a Tokio runtime.
    pub fn arm(&self, bill_id: ProposalId, kind: TimerKind, fire_at: DateTime<Utc>) {
        if self.inner.shutdown.is_cancelled() {
            warn!(bill_id, kind = %kind, "Scheduler shut down, timer not armed");
            return;
        }

        let key = TimerKey::new(bill_id, kind);
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let delay = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        let weak_inner = Arc::downgrade(&self.inner);
        let shutdown = self.inner.shutdown.clone();

        // Hold the table lock across spawn so the task cannot claim its entry
        // before it is inserted.
        let mut timers = self.inner.timers();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let handler = {
                let Some(inner) = weak_inner.upgrade() else {
                    return;
                };
                if !inner.claim(key, generation) {
                    return;
                }
                inner.handler.upgrade()
            };
            let Some(handler) = handler else {
                warn!(bill_id, kind = %kind, "Timer fired after handler was dropped");
                return;
            };

            debug!(bill_id, kind = %kind, "Timer fired");
            if let Err(e) = handler.on_timer(bill_id, kind).await {
                error!(bill_id, kind = %kind, error = %e, "Transition handler failed");
            }
        });

        let replaced = timers.insert(
            key,
            TimerEntry {
                generation,
                fire_at,
                handle,
            },
        );
        drop(timers);

        if let Some(previous) = replaced {
            previous.handle.abort();
            debug!(bill_id, kind = %kind, previous = %previous.fire_at, "Timer replaced");
        }
        debug!(bill_id, kind = %kind, fire_at = %fire_at, delay_secs = delay.as_secs(), "Timer armed");
    }

    /// Cancel a pending timer. Returns whether one was pending.
    ///
    /// A timer whose handler is already running is not affected.
    pub fn cancel(&self, bill_id: ProposalId, kind: TimerKind) -> bool {
        let removed = self.inner.timers().remove(&TimerKey::new(bill_id, kind));
        match removed {
            Some(entry) => {
                entry.handle.abort();
                debug!(bill_id, kind = %kind, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel both timers of a bill
    pub fn cancel_all(&self, bill_id: ProposalId) {
        self.cancel(bill_id, TimerKind::Start);
        self.cancel(bill_id, TimerKind::End);
    }

    /// Whether a timer is pending for the key
    pub fn is_armed(&self, bill_id: ProposalId, kind: TimerKind) -> bool {
        self.inner
            .timers()
            .contains_key(&TimerKey::new(bill_id, kind))
    }

    /// Deadline of a pending timer
    pub fn fire_at(&self, bill_id: ProposalId, kind: TimerKind) -> Option<DateTime<Utc>> {
        self.inner
            .timers()
            .get(&TimerKey::new(bill_id, kind))
            .map(|entry| entry.fire_at)
    }

    /// Pending timers ordered by key
    pub fn live_timers(&self) -> Vec<(TimerKey, DateTime<Utc>)> {
        let mut timers: Vec<_> = self
            .inner
            .timers()
            .iter()
            .map(|(key, entry)| (*key, entry.fire_at))
            .collect();
        timers.sort_by_key(|(key, _)| *key);
        timers
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.inner.timers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild timers from the store's pending proposals.
    ///
    /// Safe to run repeatedly: re-arming replaces timers by key.
    pub fn recover(&self) -> StoreResult<RecoveryReport> {
        let pending = self.store.list_pending()?;
        let now = Utc::now();
        let mut report = RecoveryReport {
            scanned: pending.len(),
            ..RecoveryReport::default()
        };

        for proposal in &pending {
            let action = recovery::plan(proposal, now);
            report.record(&action, now);
            match action {
                RecoveryAction::Arm { kind, fire_at } => {
                    // Skip a re-arm that would only restart an identical timer.
                    if self.fire_at(proposal.id, kind) != Some(fire_at) {
                        self.arm(proposal.id, kind, fire_at);
                    }
                }
                RecoveryAction::Skip(reason) => {
                    warn!(bill_id = proposal.id, status = %proposal.status, reason, "Pending proposal skipped by recovery");
                }
            }
        }

        info!(
            scanned = report.scanned,
            armed_start = report.armed_start,
            armed_end = report.armed_end,
            overdue = report.overdue,
            skipped = report.skipped,
            "Scheduler recovery complete"
        );
        Ok(report)
    }

    /// Stop every pending timer. Later `arm` calls are ignored.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let drained: Vec<_> = self.inner.timers().drain().collect();
        let count = drained.len();
        for (_, entry) in drained {
            entry.handle.abort();
        }
        info!(pending = count, "Scheduler shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}

impl Drop for LifecycleScheduler {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}
