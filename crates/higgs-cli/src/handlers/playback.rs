//! Play and download affordances for transcript entries.

use std::path::{Path, PathBuf};

use anyhow::Result;
use higgs_core::services::default_file_name;
use higgs_core::{TranscriptEntry, export_audio};

use crate::error::CliError;

/// Write an entry's audio to `path`, or to a timestamped file in the working directory.
pub async fn save_entry_audio(entry: &TranscriptEntry, path: Option<&Path>) -> Result<PathBuf> {
    let payload = entry.audio_payload.as_deref().unwrap_or_default();
    let target = path.map_or_else(|| PathBuf::from(default_file_name(entry)), Path::to_path_buf);

    let bytes = export_audio(payload, &target).await.map_err(CliError::from)?;
    println!("✓ Saved {bytes} bytes of audio to {}", target.display());
    Ok(target)
}

/// Stage an entry's audio in the temp directory for an external player.
pub async fn stage_for_playback(entry: &TranscriptEntry) -> Result<PathBuf> {
    let target = std::env::temp_dir().join(default_file_name(entry));
    let payload = entry.audio_payload.as_deref().unwrap_or_default();

    export_audio(payload, &target).await.map_err(CliError::from)?;
    println!("▶ Audio ready: {}", target.display());
    Ok(target)
}
