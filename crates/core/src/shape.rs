//! Tracked shapes and the movement strategy contract.
//!
//! A [`Shape`] is a mutable record shared between its owner and the redraw
//! scheduler. Geometry and strategy sit behind separate locks so that a
//! strategy can mutate the shape it is moving without deadlocking.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ensure_finite, ensure_positive, CanvasError};

pub type ShapeId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Validate both components as finite and strictly positive.
    pub fn validated(self) -> Result<Self, CanvasError> {
        ensure_positive("width", self.width)?;
        ensure_positive("height", self.height)?;
        Ok(self)
    }
}

/// RGBA appearance tag. The scheduler never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Per-shape behavior invoked once per redraw pass.
///
/// Implementations are shared between shapes and called from the scheduler's
/// pass pool, so they must not assume any particular thread. Returning an
/// error aborts the pass that invoked it.
///
/// `move_shape` runs while the shape's strategy lock is held: calling
/// [`Shape::set_strategy`] on the same shape from inside it deadlocks.
pub trait MoveStrategy: Send + Sync {
    /// Advance `shape` by one step.
    fn move_shape(&self, shape: &Shape) -> Result<(), CanvasError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[derive(Debug, Clone, Copy)]
struct Geometry {
    position: Point,
    size: Size,
    color: Color,
}

/// A tracked, movable shape.
pub struct Shape {
    id: ShapeId,
    geometry: Mutex<Geometry>,
    strategy: Mutex<Option<Arc<dyn MoveStrategy>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shape {
    /// Create a shape with no strategy. Fails if the position is not finite
    /// or the size is not finite and positive.
    pub fn new(position: Point, size: Size, color: Color) -> Result<Self, CanvasError> {
        ensure_finite("x", position.x)?;
        ensure_finite("y", position.y)?;
        let size = size.validated()?;
        Ok(Self {
            id: Uuid::new_v4(),
            geometry: Mutex::new(Geometry { position, size, color }),
            strategy: Mutex::new(None),
        })
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn position(&self) -> Point {
        lock(&self.geometry).position
    }

    pub fn x(&self) -> f64 {
        self.position().x
    }

    pub fn y(&self) -> f64 {
        self.position().y
    }

    pub fn set_x(&self, x: f64) -> Result<(), CanvasError> {
        let x = ensure_finite("x", x)?;
        lock(&self.geometry).position.x = x;
        Ok(())
    }

    pub fn set_y(&self, y: f64) -> Result<(), CanvasError> {
        let y = ensure_finite("y", y)?;
        lock(&self.geometry).position.y = y;
        Ok(())
    }

    pub fn set_position(&self, position: Point) -> Result<(), CanvasError> {
        ensure_finite("x", position.x)?;
        ensure_finite("y", position.y)?;
        lock(&self.geometry).position = position;
        Ok(())
    }

    /// Move by `(dx, dy)` under a single lock acquisition. Returns the new
    /// position; on overflow to infinity nothing changes.
    pub fn translate(&self, dx: f64, dy: f64) -> Result<Point, CanvasError> {
        let mut geometry = lock(&self.geometry);
        let x = ensure_finite("x", geometry.position.x + dx)?;
        let y = ensure_finite("y", geometry.position.y + dy)?;
        geometry.position = Point { x, y };
        Ok(geometry.position)
    }

    pub fn size(&self) -> Size {
        lock(&self.geometry).size
    }

    pub fn set_size(&self, size: Size) -> Result<(), CanvasError> {
        let size = size.validated()?;
        lock(&self.geometry).size = size;
        Ok(())
    }

    pub fn color(&self) -> Color {
        lock(&self.geometry).color
    }

    pub fn set_color(&self, color: Color) {
        lock(&self.geometry).color = color;
    }

    /// Replace the active strategy. Waits for a `run_step` in progress on
    /// this shape to finish first.
    pub fn set_strategy(&self, strategy: Option<Arc<dyn MoveStrategy>>) {
        *lock(&self.strategy) = strategy;
    }

    pub fn strategy(&self) -> Option<Arc<dyn MoveStrategy>> {
        lock(&self.strategy).clone()
    }

    /// Apply the current strategy once. No-op without a strategy.
    pub fn run_step(&self) -> Result<(), CanvasError> {
        let strategy = lock(&self.strategy);
        match strategy.as_ref() {
            Some(strategy) => strategy.move_shape(self),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geometry = *lock(&self.geometry);
        f.debug_struct("Shape")
            .field("id", &self.id)
            .field("position", &geometry.position)
            .field("size", &geometry.size)
            .field("color", &geometry.color)
            .finish_non_exhaustive()
    }
}
