use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for valuation operations
#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for ValuationError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ValuationError::NotFound("Record not found".to_string()),
            _ => ValuationError::DatabaseError(err.to_string()),
        }
    }
}
