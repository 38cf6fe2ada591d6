//! Command handlers.
//!
//! Each handler takes the composed `CliContext` and its command arguments.

pub mod chat;
pub mod config;
pub mod generate;
pub mod history;
pub mod playback;
pub mod sidebar;
pub mod upload_voice;
pub mod voices;
