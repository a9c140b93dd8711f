pub mod canvas;
pub mod config;
pub mod error;
pub mod shape;

pub use canvas::CanvasBounds;
pub use config::Config;
pub use error::*;
pub use shape::*;
