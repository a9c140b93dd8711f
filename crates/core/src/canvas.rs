use std::sync::{PoisonError, RwLock};

use crate::error::CanvasError;
use crate::shape::Size;

/// Canvas dimensions shared between the owner (who may resize at any time)
/// and strategies that wrap shapes around the edges.
#[derive(Debug)]
pub struct CanvasBounds {
    size: RwLock<Size>,
}

impl CanvasBounds {
    pub fn new(size: Size) -> Result<Self, CanvasError> {
        Ok(Self {
            size: RwLock::new(size.validated()?),
        })
    }

    pub fn size(&self) -> Size {
        *self.size.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn resize(&self, size: Size) -> Result<(), CanvasError> {
        let size = size.validated()?;
        *self.size.write().unwrap_or_else(PoisonError::into_inner) = size;
        Ok(())
    }
}
