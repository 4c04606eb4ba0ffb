//! Gemini API client
//!
//! Sends one clip inline (base64) to the `generateContent` endpoint together
//! with the translation instruction and returns the text parts of the first
//! candidate.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use medilink_common::config::TranscriptionConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TranscriptionError};
use crate::gateway::{AudioClip, Transcript, TranscriptionGateway, TRANSLATION_INSTRUCTION};

const USER_AGENT: &str = concat!("MediLink/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

/// `generateContent` response (only the fields read here)
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Gemini transcription client
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, config: &TranscriptionConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(TranscriptionError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| TranscriptionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        })
    }

    /// Build from config, resolving the key from the environment or TOML
    pub fn from_config(config: &TranscriptionConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .map_err(|_| TranscriptionError::MissingApiKey)?;
        Self::new(api_key, config)
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn request_body<'a>(clip: &'a AudioClip) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: &clip.mime_type,
                            data: general_purpose::STANDARD.encode(&clip.bytes),
                        },
                    },
                    RequestPart::Text {
                        text: TRANSLATION_INSTRUCTION,
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl TranscriptionGateway for GeminiClient {
    fn source_id(&self) -> &'static str {
        "Gemini"
    }

    async fn transcribe(&self, clip: &AudioClip) -> Result<Transcript> {
        if clip.bytes.is_empty() {
            return Err(TranscriptionError::EmptyClip);
        }

        tracing::debug!(
            model = %self.model,
            bytes = clip.bytes.len(),
            "Querying Gemini API"
        );

        let response = self
            .http_client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(clip))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranscriptionError::Timeout(self.timeout.as_secs())
                } else {
                    TranscriptionError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        let text = body.text().ok_or(TranscriptionError::EmptyResponse)?;
        let transcript =
            Transcript::from_service_text(&text).ok_or(TranscriptionError::EmptyResponse)?;

        tracing::info!(
            no_speech = matches!(transcript, Transcript::NoSpeech),
            chars = text.len(),
            "Gemini transcription successful"
        );

        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::DEFAULT_AUDIO_MIME;

    fn config() -> TranscriptionConfig {
        TranscriptionConfig::default()
    }

    #[test]
    fn test_client_creation() {
        assert!(GeminiClient::new("test_key".to_string(), &config()).is_ok());
    }

    #[test]
    fn test_blank_key_rejected() {
        let result = GeminiClient::new("  ".to_string(), &config());
        assert!(matches!(result, Err(TranscriptionError::MissingApiKey)));
    }

    #[test]
    fn test_url_uses_model() {
        let mut cfg = config();
        cfg.endpoint = "https://example.test/v1beta/".to_string();
        cfg.model = "test-model".to_string();
        let client = GeminiClient::new("k".to_string(), &cfg).unwrap();
        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/test-model:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let clip = AudioClip::new(b"RIFF".to_vec(), DEFAULT_AUDIO_MIME);
        let body = serde_json::to_value(GeminiClient::request_body(&clip)).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "audio/wav");
        assert_eq!(parts[0]["inlineData"]["data"], "UklGRg==");
        assert_eq!(parts[1]["text"], TRANSLATION_INSTRUCTION);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Chest pain "},{"text":"and fever."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.text().as_deref(), Some("Chest pain and fever."));
    }

    #[test]
    fn test_response_without_text() {
        let body: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(body.text(), None);

        let body: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.text(), None);
    }

    #[tokio::test]
    async fn test_empty_clip_rejected_before_request() {
        let client = GeminiClient::new("k".to_string(), &config()).unwrap();
        let result = client.transcribe(&AudioClip::new(Vec::new(), DEFAULT_AUDIO_MIME)).await;
        assert!(matches!(result, Err(TranscriptionError::EmptyClip)));
    }
}
