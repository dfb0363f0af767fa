//! Announcement seam to the chat platform.
//!
//! Lifecycle state is committed before anything is announced, so a failed
//! post is logged and never rolls a transition back.

pub mod log;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proposal::{MessageRef, ProposalId, ProposalStatus, VoteCounts};

pub use self::log::LogAnnouncer;

/// Channels announcements are posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Proposals,
    Debate,
    Voting,
    PastLegislation,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proposals => write!(f, "proposals"),
            Self::Debate => write!(f, "debate"),
            Self::Voting => write!(f, "voting"),
            Self::PastLegislation => write!(f, "past_legislation"),
        }
    }
}

/// Failure reported by the rendering collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Channel {0} is not configured")]
    ChannelUnavailable(Channel),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// What to announce. Carries data only; formatting belongs to the announcer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Announcement {
    ProposalSubmitted {
        bill_id: ProposalId,
        title: String,
        body: String,
        proposer: i64,
    },
    DebateOpened {
        bill_id: ProposalId,
        title: String,
        body: String,
        vote_start: DateTime<Utc>,
        vote_end: DateTime<Utc>,
    },
    VotingOpened {
        bill_id: ProposalId,
        title: String,
        body: String,
        vote_start: DateTime<Utc>,
        vote_end: DateTime<Utc>,
    },
    VotingClosed {
        bill_id: ProposalId,
        title: String,
        body: String,
        status: ProposalStatus,
        counts: VoteCounts,
    },
    Vetoed {
        bill_id: ProposalId,
        title: String,
        body: String,
        reason: Option<String>,
    },
}

impl Announcement {
    pub fn bill_id(&self) -> ProposalId {
        match self {
            Self::ProposalSubmitted { bill_id, .. }
            | Self::DebateOpened { bill_id, .. }
            | Self::VotingOpened { bill_id, .. }
            | Self::VotingClosed { bill_id, .. }
            | Self::Vetoed { bill_id, .. } => *bill_id,
        }
    }

    /// Channel this announcement belongs in.
    pub fn channel(&self) -> Channel {
        match self {
            Self::ProposalSubmitted { .. } => Channel::Proposals,
            Self::DebateOpened { .. } => Channel::Debate,
            Self::VotingOpened { .. } => Channel::Voting,
            Self::VotingClosed { .. } | Self::Vetoed { .. } => Channel::PastLegislation,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProposalSubmitted { .. } => "proposal_submitted",
            Self::DebateOpened { .. } => "debate_opened",
            Self::VotingOpened { .. } => "voting_opened",
            Self::VotingClosed { .. } => "voting_closed",
            Self::Vetoed { .. } => "vetoed",
        }
    }
}

/// Posts announcements and opens discussion threads on the chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Post an announcement, returning a reference to the rendered message.
    async fn post(&self, announcement: &Announcement) -> Result<MessageRef, RenderError>;

    /// Open a discussion thread attached to a posted message.
    async fn create_thread(&self, message: &MessageRef, name: &str)
        -> Result<MessageRef, RenderError>;
}
