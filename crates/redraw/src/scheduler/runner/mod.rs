//! Redraw scheduler runner -- ticker, pass launches and overload recovery.
//!
//! Split into focused submodules:
//! - `core`: RedrawScheduler struct, constructor, public accessors and disposal
//! - `execution`: tick handling, pass launch and completion bookkeeping
//! - `overload`: timer suspension while an overrunning pass finishes

mod core;
mod execution;
mod overload;

pub use self::core::RedrawScheduler;
