use crate::irr::IrrError;

/// Validates a candidate IRR result before it may be persisted. Non-finite
/// values are rejected, never silently coerced.
pub fn validate(value: f64) -> Result<f64, IrrError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(IrrError::CalculationRejected(format!(
            "Refusing to persist non-finite IRR result: {}",
            value
        )))
    }
}

/// Substitutes `default` only for an explicitly absent value. An invalid
/// present value still fails.
pub fn validate_or_default(value: Option<f64>, default: f64) -> Result<f64, IrrError> {
    match value {
        None => Ok(default),
        Some(v) => validate(v),
    }
}
