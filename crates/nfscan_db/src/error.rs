//! Error types for the storage layer.

use thiserror::Error;

/// Storage operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Storage errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation on insert
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Foreign key violation (e.g. points for a missing task)
    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    /// Task status change violates the state machine
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Queue item operation in the wrong lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    return Self::DuplicateKey(db_err.message().to_string());
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return Self::ForeignKey(db_err.message().to_string());
                }
                _ => {}
            }
        }
        Self::Sqlx(err)
    }
}

impl DbError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid transition error.
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
