//! Transcript entries shown in the chat view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text shown in the assistant placeholder while audio is being generated.
pub const PLACEHOLDER_TEXT: &str = "Generating audio...";

/// Correlation id of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a transcript entry's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub role: Role,
    pub text: String,
    pub audio_payload: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub in_progress: bool,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            role: Role::User,
            text: text.into(),
            audio_payload: None,
            timestamp: Utc::now(),
            in_progress: false,
        }
    }

    /// An assistant entry that will be filled in once the worker answers.
    pub fn placeholder() -> Self {
        Self {
            id: EntryId::new(),
            role: Role::Assistant,
            text: PLACEHOLDER_TEXT.to_string(),
            audio_payload: None,
            timestamp: Utc::now(),
            in_progress: true,
        }
    }

    /// Replace the content of this entry, keeping its id and position.
    pub fn finish(&mut self, text: impl Into<String>, audio_payload: Option<String>) {
        self.text = text.into();
        self.audio_payload = audio_payload.filter(|p| !p.is_empty());
        self.timestamp = Utc::now();
        self.in_progress = false;
    }

    pub fn has_audio(&self) -> bool {
        self.audio_payload.as_deref().is_some_and(|p| !p.is_empty())
    }
}
