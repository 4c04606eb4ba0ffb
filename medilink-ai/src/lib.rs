//! medilink-ai: voice note transcription
//!
//! Wraps the external speech-to-text/translation service behind the
//! [`TranscriptionGateway`] trait, and drives one recorded clip through
//! capture, encoding and transcription with [`capture::VoiceNoteCapture`].

pub mod capture;
pub mod error;
pub mod gateway;
pub mod gemini_client;

pub use capture::{CaptureState, InFlightRegistry, VoiceNoteCapture};
pub use error::TranscriptionError;
pub use gateway::{AudioClip, Transcript, TranscriptionGateway, DEFAULT_AUDIO_MIME};
pub use gemini_client::GeminiClient;
