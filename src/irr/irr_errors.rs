use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for IRR engine operations.
///
/// Note that an incomplete portfolio is not an error: it is a valid state
/// meaning no portfolio-level derived row should exist, and is reported
/// through the completeness checker's boolean result instead.
#[derive(Debug, Error)]
pub enum IrrError {
    /// The numeric guard refused to persist a non-finite result. The
    /// affected (fund, date) or (portfolio, date) write is skipped; prior
    /// rows for that key are left unchanged.
    #[error("Calculation rejected: {0}")]
    CalculationRejected(String),
    /// The solver could not find a rate for the given schedule.
    #[error("Unsolvable cash-flow schedule: {0}")]
    Unsolvable(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DieselError> for IrrError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => IrrError::NotFound("Record not found".to_string()),
            _ => IrrError::DatabaseError(err.to_string()),
        }
    }
}
