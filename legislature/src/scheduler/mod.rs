//! Deadline scheduling for the bill lifecycle
//!
//! Timers live only in memory; the store's `vote_start`/`vote_end` columns
//! are the source of truth and [`LifecycleScheduler::recover`] rebuilds the
//! table from them after a restart.

pub mod recovery;
pub mod scheduler;
pub mod timer;

pub use recovery::{RecoveryAction, RecoveryReport};
pub use scheduler::{LifecycleScheduler, SharedScheduler};
pub use timer::{TimerHandler, TimerKey, TimerKind};
