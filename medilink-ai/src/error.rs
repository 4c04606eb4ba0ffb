//! Error types for medilink-ai
//!
//! Transcription failures travel on this channel only; they are never
//! folded into transcript text.

use thiserror::Error;

/// Transcription gateway and capture errors
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Transcription timed out after {0} s")]
    Timeout(u64),

    #[error("Transcription cancelled")]
    Cancelled,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Service returned no text")]
    EmptyResponse,

    #[error("Transcription API key not configured")]
    MissingApiKey,

    #[error("Recorded clip is empty")]
    EmptyClip,

    #[error("A transcription for {0} is already in progress")]
    Busy(String),

    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: String, action: &'static str },
}

pub type Result<T> = std::result::Result<T, TranscriptionError>;
