//! Redraw scheduler error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedrawError {
    #[error("redraw interval must be a positive, finite number of milliseconds, got {0}")]
    InvalidInterval(f64),

    #[error("redraw scheduler has been disposed")]
    Disposed,

    #[error("failed to start redraw scheduler: {0}")]
    Startup(String),
}
