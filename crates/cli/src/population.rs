use std::sync::Arc;

use canvas_core::{CanvasBounds, CanvasError, Color, MoveStrategy, Point, Shape, Size};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const PALETTE: [Color; 5] = [Color::RED, Color::GREEN, Color::BLUE, Color::ORANGE, Color::BLACK];

/// Side length range for generated squares.
const MIN_SIDE: f64 = 10.0;
const MAX_SIDE: f64 = 40.0;

/// Scatter `count` squares across the canvas, all driven by `strategy`.
pub fn populate(
    bounds: &CanvasBounds,
    count: usize,
    strategy: &Arc<dyn MoveStrategy>,
    seed: Option<u64>,
) -> Result<Vec<Arc<Shape>>, CanvasError> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let canvas = bounds.size();

    (0..count)
        .map(|_| {
            let side = rng.gen_range(MIN_SIDE..=MAX_SIDE);
            let x = rng.gen_range(0.0..=(canvas.width - side).max(0.0));
            let y = rng.gen_range(0.0..=(canvas.height - side).max(0.0));
            let color = PALETTE.choose(&mut rng).copied().unwrap_or(Color::BLACK);

            let shape = Arc::new(Shape::new(Point::new(x, y), Size::new(side, side), color)?);
            shape.set_strategy(Some(Arc::clone(strategy)));
            Ok(shape)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_redraw::FallBehavior;

    fn bounds() -> Arc<CanvasBounds> {
        Arc::new(CanvasBounds::new(Size::new(200.0, 150.0)).unwrap())
    }

    #[test]
    fn shapes_start_inside_the_canvas() {
        let bounds = bounds();
        let strategy: Arc<dyn MoveStrategy> = Arc::new(FallBehavior::with_seed(bounds.clone(), 1));
        let shapes = populate(&bounds, 50, &strategy, Some(9)).unwrap();
        assert_eq!(shapes.len(), 50);
        for shape in &shapes {
            let (p, s) = (shape.position(), shape.size());
            assert!(p.x >= 0.0 && p.x + s.width <= 200.0);
            assert!(p.y >= 0.0 && p.y + s.height <= 150.0);
            assert!(shape.strategy().is_some());
        }
    }

    #[test]
    fn seed_makes_layout_reproducible() {
        let bounds = bounds();
        let strategy: Arc<dyn MoveStrategy> = Arc::new(FallBehavior::with_seed(bounds.clone(), 1));
        let a = populate(&bounds, 5, &strategy, Some(4)).unwrap();
        let b = populate(&bounds, 5, &strategy, Some(4)).unwrap();
        let positions = |shapes: &[Arc<Shape>]| shapes.iter().map(|s| s.position()).collect::<Vec<_>>();
        assert_eq!(positions(&a), positions(&b));
    }
}
