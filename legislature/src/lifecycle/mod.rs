//! Bill lifecycle: transition handlers and the administrative surface

pub mod admin;
pub mod error;
pub mod handlers;

pub use admin::{AdminReply, AdminStatus};
pub use error::{LifecycleError, LifecycleResult};
pub use handlers::{CastOutcome, Legislature};
