//! Proposal records and the status machine they move through.

pub mod types;

pub use types::{
    Law, LawId, MemberId, MessageKind, MessageRef, Proposal, ProposalId, ProposalStatus, Vote,
    VoteChoice, VoteCounts,
};
