//! Domain types for the Higgs Audio companion.
//!
//! Pure data with no infrastructure concerns. Wire-format renames for the
//! worker's JSON live on the types themselves so adapters can (de)serialize
//! them directly.

mod audio;
mod supervisor;
mod transcript;

pub use audio::{
    ClearHistoryResponse, GenerationRequest, GenerationResponse, HistoryEntry, HistoryResponse,
    ValidationError, VoiceCloneRequest, VoiceCloneResponse, VoiceListResponse,
};
pub use supervisor::SupervisorState;
pub use transcript::{EntryId, Role, TranscriptEntry};
