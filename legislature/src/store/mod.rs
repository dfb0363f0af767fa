//! Persistent proposal store
//!
//! SQLite-backed system of record for the bill lifecycle:
//!
//! - `proposals`: one row per bill with status, vote window, announcement
//!   references and cached yes/no/abstain counters
//! - `votes`: one row per ballot, unique on (voter, bill), cascading on removal
//! - `laws`: append-only archive, one row per passed bill
//!
//! # Usage
//!
//! ```ignore
//! use legislature::store::{ProposalStore, VoteLedger};
//!
//! let store = ProposalStore::open("database/governance.db")?.shared();
//! let id = store.create("Onboarding Act", "Welcome new members.", 42)?;
//!
//! let ledger = VoteLedger::new(store.clone());
//! assert!(ledger.cast(7, id, VoteChoice::Yes)?);
//! assert!(!ledger.cast(7, id, VoteChoice::No)?); // already voted
//! ```

pub mod ledger;
pub mod schema;
pub mod store;

pub use ledger::{BallotOutcome, VoteLedger};
pub use store::{ClosedVote, ProposalStore, SharedProposalStore, StoreError, StoreResult};
