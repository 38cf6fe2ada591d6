//! Saving generated audio to a user-chosen file.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::info;

use crate::domain::TranscriptEntry;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Entry has no audio to save")]
    EmptyPayload,

    #[error("Audio payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Decode `payload` and write the bytes verbatim to `path`.
///
/// Returns the number of bytes written.
pub async fn export_audio(payload: &str, path: &Path) -> Result<usize, ExportError> {
    if payload.trim().is_empty() {
        return Err(ExportError::EmptyPayload);
    }

    let bytes = STANDARD.decode(payload.trim())?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;

    info!(path = %path.display(), bytes = bytes.len(), "Audio saved");
    Ok(bytes.len())
}

/// Suggested file name for an entry's audio.
pub fn default_file_name(entry: &TranscriptEntry) -> String {
    format!(
        "higgs_audio_{}.wav",
        entry.timestamp.format("%Y%m%d_%H%M%S")
    )
}
