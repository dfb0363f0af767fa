//! Legislature Core Library
//!
//! This library provides the lifecycle engine behind the chamber's bill
//! workflow:
//! - Proposal store and vote ledger backed by SQLite
//! - Lifecycle scheduler owning the vote start/end timers, rebuilt from the
//!   store on startup
//! - Transition handlers and the administrative surface
//!
//! # Lifecycle
//!
//! ```text
//! submit ─▶ awaiting ─▶ debating ──(vote_start)──▶ voting ──(vote_end)──▶ passed | failed
//!                          48h                       4d
//! ```
//!
//! A bill passes when yes votes strictly outnumber no votes; abstentions are
//! recorded but do not count either way. Staff may force voting open or
//! closed, veto any bill that has not concluded, archive, or remove.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use legislature::{EventBus, Legislature, LegislatureConfig, LogAnnouncer, ProposalStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = LegislatureConfig::from_env();
//! let store = ProposalStore::open(&config.database_path)?.shared();
//! let legislature = Legislature::new(
//!     store,
//!     Arc::new(LogAnnouncer::new()),
//!     EventBus::new().shared(),
//!     config,
//! );
//! legislature.recover()?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod announce;
pub mod config;
pub mod events;
pub mod lifecycle;
pub mod proposal;
pub mod scheduler;
pub mod store;

// Re-export key model types
pub use proposal::{
    Law, LawId, MemberId, MessageKind, MessageRef, Proposal, ProposalId, ProposalStatus, Vote,
    VoteChoice, VoteCounts,
};

// Re-export store types
pub use store::{
    BallotOutcome, ClosedVote, ProposalStore, SharedProposalStore, StoreError, StoreResult,
    VoteLedger,
};

// Re-export scheduler types
pub use scheduler::{
    LifecycleScheduler, RecoveryAction, RecoveryReport, TimerHandler, TimerKey, TimerKind,
};

// Re-export lifecycle types
pub use lifecycle::{
    AdminReply, AdminStatus, CastOutcome, Legislature, LifecycleError, LifecycleResult,
};

// Re-export announcement types
pub use announce::{Announcement, Announcer, Channel, LogAnnouncer, RenderError};

// Re-export event types
pub use events::{EventBus, LifecycleEvent, SharedEventBus};

pub use config::{ChannelConfig, LegislatureConfig};
