//! Voice note capture
//!
//! A clip moves through `Idle -> Recording -> Encoding ->
//! AwaitingTranscription` and back to `Idle` holding either the transcript
//! or the failure. Every non-idle state can be cancelled; while awaiting
//! the service, cancellation goes through the session's
//! [`CancellationToken`] and the round trip is bounded by a timeout.
//!
//! [`InFlightRegistry`] keeps a second transcription for the same profile
//! from racing the first into the same voice-note slot.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, TranscriptionError};
use crate::gateway::{AudioClip, Transcript, TranscriptionGateway};

/// Result of the last completed capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Transcribed(Transcript),
    Failed(String),
    Cancelled,
}

/// Capture session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle { last: Option<CaptureOutcome> },
    Recording,
    Encoding,
    AwaitingTranscription,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureState::Idle { .. } => "idle",
            CaptureState::Recording => "recording",
            CaptureState::Encoding => "encoding",
            CaptureState::AwaitingTranscription => "awaiting transcription",
        };
        f.write_str(name)
    }
}

/// One profile's voice-note capture session
pub struct VoiceNoteCapture {
    session_id: Uuid,
    state: CaptureState,
    timeout: Duration,
    cancel: CancellationToken,
}

impl VoiceNoteCapture {
    pub fn new(timeout: Duration) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: CaptureState::Idle { last: None },
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Session whose transcription is aborted by an external token
    pub fn with_cancel_token(timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::new(timeout)
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Token that aborts an outstanding transcription when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn invalid(&self, action: &'static str) -> TranscriptionError {
        TranscriptionError::InvalidTransition {
            state: self.state.to_string(),
            action,
        }
    }

    /// `Idle -> Recording`
    pub fn start_recording(&mut self) -> Result<()> {
        if !matches!(self.state, CaptureState::Idle { .. }) {
            return Err(self.invalid("start recording"));
        }
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        self.state = CaptureState::Recording;
        debug!(session = %self.session_id, "Recording started");
        Ok(())
    }

    /// `Recording -> Encoding -> AwaitingTranscription`, yielding the clip to send
    pub fn stop_recording(&mut self, bytes: Vec<u8>, mime_type: &str) -> Result<AudioClip> {
        if self.state != CaptureState::Recording {
            return Err(self.invalid("stop recording"));
        }
        self.state = CaptureState::Encoding;

        if bytes.is_empty() {
            self.state = CaptureState::Idle {
                last: Some(CaptureOutcome::Failed(TranscriptionError::EmptyClip.to_string())),
            };
            return Err(TranscriptionError::EmptyClip);
        }

        let clip = AudioClip::new(bytes, mime_type);
        self.state = CaptureState::AwaitingTranscription;
        debug!(session = %self.session_id, ?clip, "Clip ready for transcription");
        Ok(clip)
    }

    /// Send the clip and return to `Idle` with the outcome
    pub async fn transcribe(
        &mut self,
        gateway: &dyn TranscriptionGateway,
        clip: &AudioClip,
    ) -> Result<Transcript> {
        if self.state != CaptureState::AwaitingTranscription {
            return Err(self.invalid("transcribe"));
        }

        let result = tokio::select! {
            _ = self.cancel.cancelled() => Err(TranscriptionError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, gateway.transcribe(clip)) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(TranscriptionError::Timeout(self.timeout.as_secs())),
                }
            }
        };

        let last = match &result {
            Ok(transcript) => {
                info!(session = %self.session_id, source = gateway.source_id(), "Voice note transcribed");
                CaptureOutcome::Transcribed(transcript.clone())
            }
            Err(TranscriptionError::Cancelled) => {
                info!(session = %self.session_id, "Transcription cancelled");
                CaptureOutcome::Cancelled
            }
            Err(e) => {
                warn!(session = %self.session_id, source = gateway.source_id(), error = %e, "Transcription failed");
                CaptureOutcome::Failed(e.to_string())
            }
        };
        self.state = CaptureState::Idle { last: Some(last) };
        result
    }

    /// Abandon the current capture from any non-idle state
    pub fn cancel(&mut self) {
        if matches!(self.state, CaptureState::Idle { .. }) {
            return;
        }
        self.cancel.cancel();
        if self.state != CaptureState::AwaitingTranscription {
            self.state = CaptureState::Idle {
                last: Some(CaptureOutcome::Cancelled),
            };
        }
        info!(session = %self.session_id, "Capture cancelled");
    }
}

/// Profiles with a transcription currently outstanding
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `profile_id`; `Busy` if already claimed
    pub fn acquire(&self, profile_id: &str) -> Result<InFlightGuard> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(profile_id.to_string()) {
            return Err(TranscriptionError::Busy(profile_id.to_string()));
        }
        Ok(InFlightGuard {
            registry: self.clone(),
            profile_id: profile_id.to_string(),
        })
    }

    pub fn is_active(&self, profile_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(profile_id)
    }
}

/// Releases the profile's slot on drop
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    profile_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.profile_id);
    }
}
