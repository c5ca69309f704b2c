use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for activity-related operations
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for ActivityError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ActivityError::NotFound("Record not found".to_string()),
            _ => ActivityError::DatabaseError(err.to_string()),
        }
    }
}
