//! Interaction surface services.
//!
//! These operate on the `AudioBackend` port and on plain domain values; none
//! of them knows how the worker is hosted.

mod audio_export;
mod chat_session;
mod render;
mod sidebar;

pub use audio_export::{ExportError, default_file_name, export_audio};
pub use chat_session::{
    ChatSession, CloneOutcome, CloneVoiceInput, GenerationOutcome, PendingGeneration,
};
pub use render::{Affordance, Render, RenderedEntry, render, render_entry};
pub use sidebar::{SidebarCommand, SidebarItem, SidebarTree};
