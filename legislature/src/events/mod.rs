//! Lifecycle event system
//!
//! Transition handlers publish a [`LifecycleEvent`] after every committed
//! state change. Subscribers (the daemon's log tap, tests waiting for a
//! timer to fire) receive them over a broadcast channel.

pub mod bus;
pub mod types;

pub use bus::{EventBus, SharedEventBus};
pub use types::LifecycleEvent;
