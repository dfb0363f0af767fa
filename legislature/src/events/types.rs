//! Lifecycle event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proposal::{LawId, MemberId, ProposalId, ProposalStatus, VoteChoice, VoteCounts};

/// Everything observable about a bill's lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A proposal was submitted
    ProposalCreated {
        bill_id: ProposalId,
        proposer: MemberId,
        timestamp: DateTime<Utc>,
    },

    /// The vote window was stamped and the start timer armed
    DebateOpened {
        bill_id: ProposalId,
        vote_start: DateTime<Utc>,
        vote_end: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// Ballots are now accepted
    VotingOpened {
        bill_id: ProposalId,
        vote_end: DateTime<Utc>,
        forced: bool,
        timestamp: DateTime<Utc>,
    },

    /// A ballot was accepted
    VoteCast {
        bill_id: ProposalId,
        voter: MemberId,
        choice: VoteChoice,
        timestamp: DateTime<Utc>,
    },

    /// The tally was applied
    VotingClosed {
        bill_id: ProposalId,
        status: ProposalStatus,
        counts: VoteCounts,
        law_id: Option<LawId>,
        timestamp: DateTime<Utc>,
    },

    /// Staff vetoed the bill
    Vetoed {
        bill_id: ProposalId,
        previous: ProposalStatus,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Moved to the archive
    Archived {
        bill_id: ProposalId,
        previous: ProposalStatus,
        timestamp: DateTime<Utc>,
    },

    /// Deleted with its ballots
    Removed {
        bill_id: ProposalId,
        timestamp: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ProposalCreated { .. } => "proposal_created",
            Self::DebateOpened { .. } => "debate_opened",
            Self::VotingOpened { .. } => "voting_opened",
            Self::VoteCast { .. } => "vote_cast",
            Self::VotingClosed { .. } => "voting_closed",
            Self::Vetoed { .. } => "vetoed",
            Self::Archived { .. } => "archived",
            Self::Removed { .. } => "removed",
        }
    }

    /// Bill this event concerns
    pub fn bill_id(&self) -> ProposalId {
        match self {
            Self::ProposalCreated { bill_id, .. }
            | Self::DebateOpened { bill_id, .. }
            | Self::VotingOpened { bill_id, .. }
            | Self::VoteCast { bill_id, .. }
            | Self::VotingClosed { bill_id, .. }
            | Self::Vetoed { bill_id, .. }
            | Self::Archived { bill_id, .. }
            | Self::Removed { bill_id, .. } => *bill_id,
        }
    }

    /// Get the event timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ProposalCreated { timestamp, .. }
            | Self::DebateOpened { timestamp, .. }
            | Self::VotingOpened { timestamp, .. }
            | Self::VoteCast { timestamp, .. }
            | Self::VotingClosed { timestamp, .. }
            | Self::Vetoed { timestamp, .. }
            | Self::Archived { timestamp, .. }
            | Self::Removed { timestamp, .. } => *timestamp,
        }
    }
}
