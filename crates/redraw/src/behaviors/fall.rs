use std::sync::Arc;

use canvas_core::{CanvasBounds, CanvasError, MoveStrategy, Point, Shape};

use super::{Respawn, DEFAULT_STEP};

/// Moves a shape down by a fixed step. Once it drops below the bottom edge it
/// reappears just above the top edge at a random column.
#[derive(Debug)]
pub struct FallBehavior {
    bounds: Arc<CanvasBounds>,
    step: f64,
    respawn: Respawn,
}

impl FallBehavior {
    pub fn new(bounds: Arc<CanvasBounds>) -> Self {
        Self {
            bounds,
            step: DEFAULT_STEP,
            respawn: Respawn::from_entropy(),
        }
    }

    /// Deterministic respawn positions.
    pub fn with_seed(bounds: Arc<CanvasBounds>, seed: u64) -> Self {
        Self {
            bounds,
            step: DEFAULT_STEP,
            respawn: Respawn::seeded(seed),
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }
}

impl MoveStrategy for FallBehavior {
    fn move_shape(&self, shape: &Shape) -> Result<(), CanvasError> {
        let position = shape.translate(0.0, self.step)?;
        let canvas = self.bounds.size();
        if position.y > canvas.height {
            let size = shape.size();
            let x = self.respawn.offset(canvas.width - size.width);
            shape.set_position(Point::new(x, -size.height))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fall"
    }
}
