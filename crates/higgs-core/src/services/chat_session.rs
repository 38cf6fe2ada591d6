//! Chat session - the interaction surface's state and flows.
//!
//! Owns the in-memory transcript and turns user actions into calls on the
//! `AudioBackend` port. Each generation cycle appends a user entry and an
//! in-progress assistant placeholder, then fills the placeholder in place,
//! matched by its correlation id rather than by position.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::{debug, warn};

use crate::domain::{
    EntryId, GenerationRequest, GenerationResponse, TranscriptEntry, VoiceCloneRequest,
};
use crate::ports::{AudioBackend, Notification, NotificationSink};
use crate::settings::Settings;

/// A generation whose placeholder is in the transcript but whose request has
/// not completed yet.
#[derive(Debug, Clone)]
pub struct PendingGeneration {
    /// Id of the assistant placeholder to fill.
    pub id: EntryId,
    pub request: GenerationRequest,
}

/// What happened to a generate action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The text was blank; nothing was appended.
    Ignored,
    /// The placeholder was filled.
    Completed {
        id: EntryId,
        succeeded: bool,
        /// The host should start playback of the entry's audio.
        autoplay: bool,
    },
    /// The placeholder was gone (transcript cleared) when the response arrived.
    Orphaned { id: EntryId },
}

/// User input for the clone-voice flow. Any missing field cancels the flow.
#[derive(Debug, Clone, Default)]
pub struct CloneVoiceInput {
    pub audio_file: Option<PathBuf>,
    pub name: Option<String>,
    pub text: Option<String>,
}

impl CloneVoiceInput {
    /// Whether every required field is present and non-blank.
    pub fn is_complete(&self) -> bool {
        ChatSession::clone_request(self.clone()).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    /// Required input was missing; treated as user cancellation.
    Cancelled,
    Cloned { voice_id: Option<String> },
    Failed { error: String },
}

/// The chat view's state.
pub struct ChatSession {
    backend: Arc<dyn AudioBackend>,
    notifier: Arc<dyn NotificationSink>,
    settings: RwLock<Settings>,
    transcript: Mutex<Vec<TranscriptEntry>>,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        notifier: Arc<dyn NotificationSink>,
        settings: Settings,
    ) -> Self {
        Self {
            backend,
            notifier,
            settings: RwLock::new(settings),
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Replace the settings used for new requests.
    pub fn update_settings(&self, settings: Settings) {
        *self
            .settings
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = settings;
    }

    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn transcript(&self) -> MutexGuard<'_, Vec<TranscriptEntry>> {
        self.transcript
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Copy of the current transcript.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.transcript().clone()
    }

    pub fn len(&self) -> usize {
        self.transcript().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript().is_empty()
    }

    /// Drop every transcript entry. Pending generations become orphaned.
    pub fn clear(&self) {
        self.transcript().clear();
    }

    /// Append the user entry and the in-progress placeholder.
    ///
    /// Returns `None` when the text is blank.
    pub fn begin_generation(
        &self,
        text: &str,
        voice: Option<String>,
    ) -> Option<PendingGeneration> {
        let request = GenerationRequest::from_settings(text, voice, &self.settings()).ok()?;

        let user = TranscriptEntry::user(text);
        let placeholder = TranscriptEntry::placeholder();
        let id = placeholder.id;

        {
            let mut transcript = self.transcript();
            transcript.push(user);
            transcript.push(placeholder);
        }

        debug!(entry = %id, "Generation placeholder appended");
        Some(PendingGeneration { id, request })
    }

    /// Fill the placeholder `id` with the final content built from `response`.
    pub fn complete_generation(
        &self,
        id: EntryId,
        response: &GenerationResponse,
    ) -> GenerationOutcome {
        let (text, audio) = if response.succeeded {
            (
                response.source_text.clone(),
                Some(response.audio_payload.clone()),
            )
        } else {
            (format!("Generation failed: {}", response.error_text()), None)
        };

        let mut transcript = self.transcript();
        let Some(entry) = transcript.iter_mut().find(|e| e.id == id) else {
            warn!(entry = %id, "Placeholder no longer in transcript, dropping response");
            return GenerationOutcome::Orphaned { id };
        };

        entry.finish(text, audio);
        let autoplay = response.succeeded && entry.has_audio() && self.settings().auto_play;

        GenerationOutcome::Completed {
            id,
            succeeded: response.succeeded,
            autoplay,
        }
    }

    /// The full generate action: append, request, fill.
    pub async fn generate(&self, text: &str, voice: Option<String>) -> GenerationOutcome {
        let Some(pending) = self.begin_generation(text, voice) else {
            return GenerationOutcome::Ignored;
        };

        let response = self.backend.generate_audio(pending.request).await;
        self.complete_generation(pending.id, &response)
    }

    /// Register a voice sample. Results are notified, never added to the transcript.
    pub async fn clone_voice(&self, input: CloneVoiceInput) -> CloneOutcome {
        let Some(request) = Self::clone_request(input) else {
            debug!("Clone voice cancelled: missing input");
            return CloneOutcome::Cancelled;
        };

        let name = request.name.clone();
        let response = self.backend.clone_voice(request).await;

        if response.succeeded {
            self.notifier
                .notify(Notification::info(format!("Voice cloned: {name}")));
            CloneOutcome::Cloned {
                voice_id: response.voice_id,
            }
        } else {
            let error = response
                .error_message
                .unwrap_or_else(|| "Unknown error".to_string());
            self.notifier
                .notify(Notification::error(format!("Voice cloning failed: {error}")));
            CloneOutcome::Failed { error }
        }
    }

    fn clone_request(input: CloneVoiceInput) -> Option<VoiceCloneRequest> {
        let audio_file = input.audio_file.filter(|p| !p.as_os_str().is_empty())?;
        let name = input.name.filter(|n| !n.trim().is_empty())?;
        let text = input.text.filter(|t| !t.trim().is_empty())?;
        Some(VoiceCloneRequest {
            audio_file,
            text,
            name,
        })
    }
}
