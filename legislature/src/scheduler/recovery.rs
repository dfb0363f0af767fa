//! Startup recovery: rebuild the timer table from persisted deadlines.
//!
//! Dispatch depends only on the proposal's status and its stored timestamps:
//!
//! ```text
//! debating, vote_start = s  → arm Start at s
//! debating, no vote_start   → arm Start now (voting handler stamps a window)
//! voting,   vote_end = e    → arm End at e
//! voting,   no vote_end     → skip (logged)
//! ```
//!
//! Past-due deadlines are armed like any other and fire immediately, so a
//! transition missed during downtime is applied rather than dropped. An
//! overdue Start leads to the End timer being armed by the voting handler,
//! which keeps the per-bill start-before-end order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timer::TimerKind;
use crate::proposal::{Proposal, ProposalStatus};

/// What recovery does for one pending proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Arm {
        kind: TimerKind,
        fire_at: DateTime<Utc>,
    },
    Skip(&'static str),
}

/// Decide the timer a pending proposal needs.
pub fn plan(proposal: &Proposal, now: DateTime<Utc>) -> RecoveryAction {
    match proposal.status {
        ProposalStatus::Debating => RecoveryAction::Arm {
            kind: TimerKind::Start,
            fire_at: proposal.vote_start.unwrap_or(now),
        },
        ProposalStatus::Voting => match proposal.vote_end {
            Some(end) => RecoveryAction::Arm {
                kind: TimerKind::End,
                fire_at: end,
            },
            None => RecoveryAction::Skip("voting without vote_end"),
        },
        _ => RecoveryAction::Skip("not timer-bearing"),
    }
}

/// Summary of one recovery scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    /// Pending proposals read from the store.
    pub scanned: usize,
    pub armed_start: usize,
    pub armed_end: usize,
    /// Armed timers whose deadline had already passed.
    pub overdue: usize,
    pub skipped: usize,
}

impl RecoveryReport {
    pub fn armed(&self) -> usize {
        self.armed_start + self.armed_end
    }

    pub(crate) fn record(&mut self, action: &RecoveryAction, now: DateTime<Utc>) {
        match action {
            RecoveryAction::Arm { kind, fire_at } => {
                match kind {
                    TimerKind::Start => self.armed_start += 1,
                    TimerKind::End => self.armed_end += 1,
                }
                if *fire_at <= now {
                    self.overdue += 1;
                }
            }
            RecoveryAction::Skip(_) => self.skipped += 1,
        }
    }
}
