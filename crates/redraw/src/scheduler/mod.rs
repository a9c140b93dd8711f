//! Periodic redraw scheduler with single-flight passes and overload recovery.
//!
//! A ticker thread fires every interval. If the previous pass has finished,
//! a new one is launched on the pass pool. If it is still in flight the
//! timer is suspended, the ticker waits (in bounded poll steps) for the pass
//! to finish, launches the next one immediately and restarts the timer from
//! zero. Under sustained overload passes therefore run back to back, and at
//! most one is ever in flight.

pub mod metrics;
pub mod runner;
pub mod types;

pub use metrics::RedrawMetrics;
pub use runner::RedrawScheduler;
pub use types::{RedrawConfig, SchedulerEvent, SchedulerState, DEFAULT_OVERLOAD_POLL};
