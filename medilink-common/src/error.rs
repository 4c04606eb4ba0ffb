//! Common error types for MediLink

use thiserror::Error;

/// Common result type for MediLink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the MediLink crates
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup miss (unknown identifier, national ID or credentials)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attachment token could not be split or decoded
    #[error("Malformed attachment token: {0}")]
    MalformedToken(String),

    /// Attachment payload above the storage ceiling
    #[error("Attachment too large: {size} bytes (limit {limit} bytes)")]
    OversizeInput { size: usize, limit: usize },

    /// Entity vanished or changed between load and mutate
    #[error("Stale write for {id}: {reason}")]
    StaleWrite { id: String, reason: String },

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collection serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors a portal reports to the user and keeps running
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::MalformedToken(_)
                | Error::OversizeInput { .. }
                | Error::InvalidInput(_)
                | Error::StaleWrite { .. }
        )
    }
}
