//! Timer identity and the callback seam.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::proposal::ProposalId;

/// Which deadline a timer guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Fires at `vote_start` and opens voting.
    Start,
    /// Fires at `vote_end` and tallies.
    End,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
        }
    }
}

/// At most one live timer exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerKey {
    pub bill_id: ProposalId,
    pub kind: TimerKind,
}

impl TimerKey {
    pub fn new(bill_id: ProposalId, kind: TimerKind) -> Self {
        Self { bill_id, kind }
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.bill_id)
    }
}

/// Receives fired timers.
///
/// Errors are logged by the scheduler with the bill id and timer kind; they
/// never cancel other timers.
#[async_trait]
pub trait TimerHandler: Send + Sync {
    async fn on_timer(&self, bill_id: ProposalId, kind: TimerKind) -> anyhow::Result<()>;
}
