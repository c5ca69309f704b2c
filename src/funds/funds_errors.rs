use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for fund and portfolio operations
#[derive(Debug, Error)]
pub enum FundError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for FundError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => FundError::NotFound("Record not found".to_string()),
            _ => FundError::DatabaseError(err.to_string()),
        }
    }
}
