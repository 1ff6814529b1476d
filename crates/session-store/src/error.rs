use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when reading or writing the checkout session.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A value could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The update would leave the session in an invalid state.
    #[error("Rejected session update: {0}")]
    Rejected(#[from] DomainError),

    /// The backend could not be reached.
    #[error("Session backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
