//! Attachment codec
//!
//! Uploaded reports are kept inline in the profile as self-describing data
//! URLs: `data:<mime>;base64,<payload>`. The store has a small total
//! capacity and base64 inflates payloads by about a third, so source
//! payloads above [`MAX_ATTACHMENT_BYTES`] are refused before encoding.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Ceiling for a single source payload (1.2 MiB)
pub const MAX_ATTACHMENT_BYTES: usize = 1_258_291;

/// MIME type used when content sniffing finds nothing
pub const FALLBACK_MIME: &str = "application/octet-stream";

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = "base64";

/// Encoded attachment as stored in a profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentToken(String);

impl AttachmentToken {
    /// Wrap an already-encoded token without validating it
    #[cfg(test)]
    pub(crate) fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encoded length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// MIME type from the header, without decoding the payload
    pub fn mime_type(&self) -> Option<&str> {
        let (header, _) = self.0.split_once(',')?;
        let header = header.strip_prefix(DATA_PREFIX)?;
        header.split(';').next().filter(|m| !m.is_empty())
    }
}

impl fmt::Display for AttachmentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mime_type() {
            Some(mime) => write!(f, "{} ({} bytes encoded)", mime, self.0.len()),
            None => write!(f, "<unrecognized> ({} bytes encoded)", self.0.len()),
        }
    }
}

/// Decoded attachment ready for display or export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAttachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DecodedAttachment {
    /// File extension to use when exporting
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

/// Reject payloads above the storage ceiling
pub fn check_size(size: usize) -> Result<()> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(Error::OversizeInput {
            size,
            limit: MAX_ATTACHMENT_BYTES,
        });
    }
    Ok(())
}

/// Encode raw bytes into a data-URL token
pub fn encode(bytes: &[u8], mime_type: &str) -> Result<AttachmentToken> {
    check_size(bytes.len())?;

    let mime_type = mime_type.trim();
    if mime_type.is_empty() || mime_type.contains([';', ',']) || !mime_type.contains('/') {
        return Err(Error::InvalidInput(format!(
            "unusable MIME type '{}'",
            mime_type
        )));
    }

    let payload = general_purpose::STANDARD.encode(bytes);
    Ok(AttachmentToken(format!(
        "{}{};{},{}",
        DATA_PREFIX, mime_type, BASE64_MARKER, payload
    )))
}

/// Decode a data-URL token back into MIME type and bytes
pub fn decode(token: &AttachmentToken) -> Result<DecodedAttachment> {
    let (header, payload) = token
        .0
        .split_once(',')
        .ok_or_else(|| Error::MalformedToken("missing ',' between header and payload".into()))?;

    let header = header
        .strip_prefix(DATA_PREFIX)
        .ok_or_else(|| Error::MalformedToken("missing 'data:' prefix".into()))?;

    let (mime_type, encoding) = header
        .rsplit_once(';')
        .ok_or_else(|| Error::MalformedToken("missing encoding marker".into()))?;

    if encoding != BASE64_MARKER {
        return Err(Error::MalformedToken(format!(
            "unsupported encoding '{}'",
            encoding
        )));
    }
    if mime_type.is_empty() {
        return Err(Error::MalformedToken("empty MIME type".into()));
    }

    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::MalformedToken(format!("invalid base64 payload: {}", e)))?;

    Ok(DecodedAttachment {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Sniff a MIME type from file content
pub fn detect_mime(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or(FALLBACK_MIME)
}

/// Map a MIME type to a file extension for export
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "application/pdf" => "pdf",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "text/plain" => "txt",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/webm" => "webm",
        _ => "bin",
    }
}
