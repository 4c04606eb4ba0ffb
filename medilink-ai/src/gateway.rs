//! Transcription gateway boundary

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// MIME type recorded clips are sent as
pub const DEFAULT_AUDIO_MIME: &str = "audio/wav";

/// Literal the service answers with for a silent clip
pub const NO_SPEECH_SENTINEL: &str = "No speech detected";

/// Instruction sent alongside every clip
pub const TRANSLATION_INSTRUCTION: &str = "Translate this medical voice note from its original Indian language (Tamil, Hindi, Telugu, Kannada, or Malayalam) into clear medical English. If no speech is detected, return 'No speech detected'. Return only the translated text.";

/// One finite recorded clip
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Successful transcription outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    Text(String),
    NoSpeech,
}

impl Transcript {
    /// Classify raw service output
    pub fn from_service_text(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let bare = text.trim_end_matches('.').trim_matches(|c| c == '\'' || c == '"');
        if bare.eq_ignore_ascii_case(NO_SPEECH_SENTINEL) {
            return Some(Transcript::NoSpeech);
        }
        Some(Transcript::Text(text.to_string()))
    }

    /// Text to store as the profile's voice note
    pub fn as_note(&self) -> &str {
        match self {
            Transcript::Text(text) => text,
            Transcript::NoSpeech => NO_SPEECH_SENTINEL,
        }
    }
}

/// External speech-to-text and translation service
#[async_trait]
pub trait TranscriptionGateway: Send + Sync {
    /// Gateway identifier for logs
    fn source_id(&self) -> &'static str;

    /// Transcribe one clip into English text
    async fn transcribe(&self, clip: &AudioClip) -> Result<Transcript>;
}
