//! Request and response values exchanged with the worker.
//!
//! Every response type has a `failed` constructor: transport failures are
//! folded into a value with `succeeded == false` instead of propagating.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;

/// Errors raised when building a request from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Text to synthesize cannot be empty")]
    EmptyText,
}

/// A single text-to-speech request.
///
/// Serialized with the field names the worker's `/generate` endpoint parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub text: String,
    pub voice: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    #[serde(rename = "force_audio_gen")]
    pub force_generation: bool,
}

impl GenerationRequest {
    /// Build a request using the decoding parameters from `settings`.
    pub fn from_settings(
        text: impl Into<String>,
        voice: Option<String>,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }

        Ok(Self {
            text,
            voice: voice.filter(|v| !v.trim().is_empty()),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_p: settings.top_p,
            force_generation: true,
        })
    }
}

/// Result of a generation request.
///
/// Accepts both the camelCase and snake_case spellings the worker has used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationResponse {
    /// Base64-encoded audio bytes.
    #[serde(rename = "audioData", alias = "audio_data")]
    pub audio_payload: String,
    #[serde(rename = "text")]
    pub source_text: String,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
    #[serde(rename = "samplingRate", alias = "sampling_rate")]
    pub sample_rate: u32,
    #[serde(rename = "success")]
    pub succeeded: bool,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl GenerationResponse {
    /// A locally synthesized failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Error text for display, falling back to a generic message.
    pub fn error_text(&self) -> &str {
        self.error_message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown error")
    }
}

/// Request to register a reference recording as a new voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCloneRequest {
    pub audio_file: PathBuf,
    /// Transcript of the reference recording.
    pub text: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceCloneResponse {
    #[serde(rename = "success")]
    pub succeeded: bool,
    #[serde(alias = "voiceId", skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl VoiceCloneResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            voice_id: None,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceListResponse {
    pub voices: Vec<String>,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

impl VoiceListResponse {
    pub fn ok(voices: Vec<String>) -> Self {
        Self {
            voices,
            succeeded: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            voices: Vec::new(),
            succeeded: false,
            error_message: Some(message.into()),
        }
    }
}

/// One record of the worker's own conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
    #[serde(default, rename = "audio_data", alias = "audioData")]
    pub audio_payload: Option<String>,
    /// ISO-8601 timestamp as reported by the worker.
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

impl HistoryResponse {
    pub fn ok(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries,
            succeeded: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            succeeded: false,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearHistoryResponse {
    pub succeeded: bool,
    pub error_message: Option<String>,
}

impl ClearHistoryResponse {
    pub const fn ok() -> Self {
        Self {
            succeeded: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error_message: Some(message.into()),
        }
    }
}
