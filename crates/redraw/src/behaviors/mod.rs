//! Stock movement strategies that scroll shapes across the canvas and wrap
//! them back in at a random spot once they leave it.

mod fall;
mod fly;

pub use fall::FallBehavior;
pub use fly::FlyBehavior;

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Distance moved per step, in canvas units.
pub const DEFAULT_STEP: f64 = 10.0;

/// Random source shared by a behavior across all shapes it drives.
#[derive(Debug)]
struct Respawn {
    rng: Mutex<StdRng>,
}

impl Respawn {
    fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform offset in `[0, span)`. A span that leaves no room (shape
    /// larger than the canvas) yields 0.
    fn offset(&self, span: f64) -> f64 {
        if span <= 0.0 {
            return 0.0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0.0..span)
    }
}
