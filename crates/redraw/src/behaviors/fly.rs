use std::sync::Arc;

use canvas_core::{CanvasBounds, CanvasError, MoveStrategy, Point, Shape};

use super::{Respawn, DEFAULT_STEP};

/// Moves a shape right by a fixed step. Once it passes the right edge it
/// reappears just left of the canvas at a random row.
#[derive(Debug)]
pub struct FlyBehavior {
    bounds: Arc<CanvasBounds>,
    step: f64,
    respawn: Respawn,
}

impl FlyBehavior {
    pub fn new(bounds: Arc<CanvasBounds>) -> Self {
        Self {
            bounds,
            step: DEFAULT_STEP,
            respawn: Respawn::from_entropy(),
        }
    }

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

impl MoveStrategy for FlyBehavior {
    fn move_shape(&self, shape: &Shape) -> Result<(), CanvasError> {
        let position = shape.translate(self.step, 0.0)?;
        let canvas = self.bounds.size();
        if position.x > canvas.width {
            let size = shape.size();
            let y = self.respawn.offset(canvas.height - size.height);
            shape.set_position(Point::new(-size.width, y))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_core::{Color, Size};

    fn bounds() -> Arc<CanvasBounds> {
        Arc::new(CanvasBounds::new(Size::new(200.0, 100.0)).unwrap())
    }

    fn shape_at(x: f64, y: f64) -> Shape {
        Shape::new(Point::new(x, y), Size::new(20.0, 15.0), Color::BLUE).unwrap()
    }

    #[test]
    fn moves_right_by_step() {
        let fly = FlyBehavior::with_seed(bounds(), 1);
        let shape = shape_at(30.0, 40.0);
        fly.move_shape(&shape).unwrap();
        assert_eq!(shape.position(), Point::new(40.0, 40.0));
    }

    #[test]
    fn respawns_left_of_the_canvas() {
        let fly = FlyBehavior::with_seed(bounds(), 9);
        for _ in 0..50 {
            let shape = shape_at(195.0, 40.0);
            fly.move_shape(&shape).unwrap();
            assert_eq!(shape.x(), -20.0);
            assert!((0.0..85.0).contains(&shape.y()));
        }
    }

    #[test]
    fn entropy_seeded_instance_stays_in_range() {
        let fly = FlyBehavior::new(bounds());
        let shape = shape_at(199.0, 0.0);
        fly.move_shape(&shape).unwrap();
        assert!((0.0..85.0).contains(&shape.y()));
    }
}
