//! Proposal, vote and law records with the proposal status machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monotonically assigned bill number.
pub type ProposalId = i64;

/// Enacted-law number.
pub type LawId = i64;

/// Chat-platform member identity.
pub type MemberId = i64;

/// Lifecycle status of a proposal.
///
/// ```text
/// Awaiting → Debating → Voting → Passed | Failed
///    └──────────┴─────────┴──→ Vetoed
/// any non-archived ─────────→ Archived
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Submitted, debate not yet scheduled.
    Awaiting,
    /// Vote window stamped, waiting for `vote_start`.
    Debating,
    /// Ballots accepted until `vote_end`.
    Voting,
    /// Strict yes-over-no majority; a law was enacted.
    Passed,
    /// Tie, no-majority or no votes.
    Failed,
    /// Stopped by staff.
    Vetoed,
    /// Housekeeping terminal state.
    Archived,
}

impl ProposalStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ProposalStatus; 7] = [
        Self::Awaiting,
        Self::Debating,
        Self::Voting,
        Self::Passed,
        Self::Failed,
        Self::Vetoed,
        Self::Archived,
    ];

    /// Whether the lifecycle has ended for this proposal.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Passed | Self::Failed | Self::Vetoed | Self::Archived
        )
    }

    /// Valid transitions from this status.
    ///
    /// `Awaiting → Voting` and `Voting → Voting` (a restarted window) only
    /// happen through an administrative force-start.
    pub fn valid_transitions(self) -> &'static [ProposalStatus] {
        match self {
            Self::Awaiting => &[Self::Debating, Self::Voting, Self::Vetoed, Self::Archived],
            Self::Debating => &[Self::Voting, Self::Vetoed, Self::Archived],
            Self::Voting => &[
                Self::Voting,
                Self::Passed,
                Self::Failed,
                Self::Vetoed,
                Self::Archived,
            ],
            Self::Passed | Self::Failed | Self::Vetoed => &[Self::Archived],
            Self::Archived => &[],
        }
    }

    /// Whether `self → to` is an edge of the status machine.
    pub fn can_transition_to(self, to: ProposalStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Every status with an edge into `to`; the `from` set for a
    /// compare-and-set transition.
    pub fn sources_of(to: ProposalStatus) -> Vec<ProposalStatus> {
        Self::ALL
            .into_iter()
            .filter(|status| status.can_transition_to(to))
            .collect()
    }

    /// Column value used by the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Awaiting => "awaiting",
            Self::Debating => "debating",
            Self::Voting => "voting",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Vetoed => "vetoed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown proposal status '{}'", s))
    }
}

/// A ballot choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

impl VoteChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Abstain => "abstain",
        }
    }

    /// Counter column incremented when this choice is cast.
    pub(crate) fn counter_column(self) -> &'static str {
        match self {
            Self::Yes => "yes_count",
            Self::No => "no_count",
            Self::Abstain => "abstain_count",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            "abstain" => Ok(Self::Abstain),
            other => Err(format!("unknown vote choice '{}'", other)),
        }
    }
}

/// Cached yes/no/abstain counters of a proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub yes: u32,
    pub no: u32,
    pub abstain: u32,
}

impl VoteCounts {
    pub fn total(&self) -> u32 {
        self.yes + self.no + self.abstain
    }

    /// Strict majority of yes over no. Abstentions do not count either way,
    /// so a tie (including zero votes) does not pass.
    pub fn passes(&self) -> bool {
        self.yes > self.no
    }
}

impl fmt::Display for VoteCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Yes: {} | No: {} | Abstain: {}",
            self.yes, self.no, self.abstain
        )
    }
}

/// Which announcement a stored message reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Proposal,
    Debate,
    Vote,
}

impl MessageKind {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Proposal => "proposal_message_id",
            Self::Debate => "debate_message_id",
            Self::Vote => "vote_message_id",
        }
    }
}

/// Opaque reference to a message owned by the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef(pub String);

impl MessageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bill moving through the legislative lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub body: String,
    pub proposer: MemberId,
    pub created_at: DateTime<Utc>,
    pub status: ProposalStatus,
    pub vote_start: Option<DateTime<Utc>>,
    pub vote_end: Option<DateTime<Utc>>,
    pub proposal_message: Option<MessageRef>,
    pub debate_message: Option<MessageRef>,
    pub vote_message: Option<MessageRef>,
    pub counts: VoteCounts,
}

impl Proposal {
    /// Stored reference for an announcement kind.
    pub fn message_ref(&self, kind: MessageKind) -> Option<&MessageRef> {
        match kind {
            MessageKind::Proposal => self.proposal_message.as_ref(),
            MessageKind::Debate => self.debate_message.as_ref(),
            MessageKind::Vote => self.vote_message.as_ref(),
        }
    }

    /// Compact status line for logs and admin replies.
    pub fn status_line(&self) -> String {
        format!(
            "Bill #{} [{}] \"{}\" | {}",
            self.id, self.status, self.title, self.counts
        )
    }
}

/// One member's ballot on one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: MemberId,
    pub proposal_id: ProposalId,
    pub choice: VoteChoice,
    pub cast_at: DateTime<Utc>,
}

/// An enacted law, appended once per passed proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Law {
    pub id: LawId,
    pub proposal_id: ProposalId,
    pub title: String,
    pub text: String,
    pub enacted_at: DateTime<Utc>,
}
