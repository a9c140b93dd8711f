use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

/// Reject NaN and infinities.
pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64, CanvasError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CanvasError::NonFinite { field, value })
    }
}

/// Reject anything that is not a finite, strictly positive number.
pub fn ensure_positive(field: &'static str, value: f64) -> Result<f64, CanvasError> {
    let value = ensure_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(CanvasError::NonPositive { field, value })
    }
}
