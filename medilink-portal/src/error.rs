//! Portal error types

use medilink_ai::TranscriptionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortalError>;

/// Failure surfaced to a portal user
#[derive(Error, Debug)]
pub enum PortalError {
    /// Record store, codec or mutation failure
    #[error(transparent)]
    Store(#[from] medilink_common::Error),

    /// Transcription gateway or capture failure
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    /// Credentials did not match any account
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl PortalError {
    /// True when the user can correct the input and retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            PortalError::Store(e) => e.is_recoverable(),
            PortalError::Transcription(e) => !matches!(e, TranscriptionError::MissingApiKey),
            PortalError::Unauthorized(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_pass_through() {
        let err: PortalError = medilink_common::Error::NotFound("MED-1".to_string()).into();
        assert_eq!(err.to_string(), "Not found: MED-1");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_missing_key_not_recoverable() {
        let err: PortalError = TranscriptionError::MissingApiKey.into();
        assert!(!err.is_recoverable());
    }
}
