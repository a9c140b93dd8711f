use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use canvas_core::{CanvasBounds, MoveStrategy};
use canvas_redraw::{FallBehavior, FlyBehavior};
use clap::{Parser, ValueEnum};

/// Headless redraw simulation.
///
/// Populates a canvas with shapes driven by a stock movement strategy and
/// runs the redraw scheduler for a bounded time, then reports its metrics.
#[derive(Parser, Debug)]
#[command(name = "canvas-sim", about = "Headless redraw scheduler simulation")]
pub struct CliArgs {
    /// Redraw interval in milliseconds (overrides env and config file)
    #[arg(long)]
    pub interval_ms: Option<f64>,

    /// Number of shapes to place on the canvas
    #[arg(long, env = "CANVAS_SHAPES", default_value_t = 25)]
    pub shapes: usize,

    /// Movement strategy applied to every shape
    #[arg(long, env = "CANVAS_BEHAVIOR", value_enum, default_value_t = Behavior::Fall)]
    pub behavior: Behavior,

    /// How long to run before disposing the scheduler
    #[arg(long, default_value_t = 5)]
    pub run_for_secs: u64,

    /// TOML file with [canvas] and [redraw] sections (replaces env settings)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed for shape placement and respawn positions
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Behavior {
    /// Shapes move down and wrap to the top
    Fall,
    /// Shapes move right and wrap to the left
    Fly,
}

impl Behavior {
    pub fn strategy(self, bounds: Arc<CanvasBounds>, seed: Option<u64>) -> Arc<dyn MoveStrategy> {
        match (self, seed) {
            (Behavior::Fall, Some(seed)) => Arc::new(FallBehavior::with_seed(bounds, seed)),
            (Behavior::Fall, None) => Arc::new(FallBehavior::new(bounds)),
            (Behavior::Fly, Some(seed)) => Arc::new(FlyBehavior::with_seed(bounds, seed)),
            (Behavior::Fly, None) => Arc::new(FlyBehavior::new(bounds)),
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Fall => f.write_str("fall"),
            Behavior::Fly => f.write_str("fly"),
        }
    }
}
