pub mod behaviors;
pub mod error;
pub mod pass;
pub mod registry;
pub mod scheduler;
pub mod timer;

pub use behaviors::{FallBehavior, FlyBehavior};
pub use error::RedrawError;
pub use pass::{CancelToken, PassHandle, PassReport, PassRunner, PassStatus};
pub use registry::{ShapeRegistry, Traversal};
pub use scheduler::{
    RedrawConfig, RedrawMetrics, RedrawScheduler, SchedulerEvent, SchedulerState,
};
