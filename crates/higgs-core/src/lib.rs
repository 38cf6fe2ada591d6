//! Core domain types and port definitions for the Higgs Audio companion.
//!
//! This crate has no knowledge of processes or HTTP. It defines:
//!
//! - `domain` - request/response values exchanged with the worker, transcript entries
//!   and the supervisor lifecycle states
//! - `settings` - the recognised configuration options and their validation
//! - `ports` - the traits adapters implement (`AudioBackend`, `WorkerControl`,
//!   `NotificationSink`)
//! - `events` - supervisor lifecycle events
//! - `services` - the interaction surface: chat session, renderer, sidebar model and
//!   audio export

pub mod domain;
pub mod events;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    ClearHistoryResponse, EntryId, GenerationRequest, GenerationResponse, HistoryEntry,
    HistoryResponse, Role, SupervisorState, TranscriptEntry, ValidationError, VoiceCloneRequest,
    VoiceCloneResponse, VoiceListResponse,
};
pub use events::SupervisorEvent;
pub use ports::{
    AudioBackend, NoopNotifier, Notification, NotificationLevel, NotificationSink,
    SupervisorError, WorkerControl,
};
pub use services::{
    Affordance, ChatSession, CloneOutcome, CloneVoiceInput, ExportError, GenerationOutcome,
    PendingGeneration, RenderedEntry, SidebarCommand, SidebarItem, SidebarTree, export_audio,
    render,
};
pub use settings::{
    DEFAULT_STARTUP_TIMEOUT_SECS, DEFAULT_WORKER_PORT, READY_MARKER, ReadinessProbe, Settings,
    SettingsError, SettingsUpdate, validate_settings,
};
