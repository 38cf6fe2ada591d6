//! Generate-from-selection handler.
//!
//! Text comes from the argument or, when omitted, from stdin. The audio is
//! written to `--output` or a timestamped file.

use std::path::PathBuf;

use anyhow::Result;
use higgs_core::{EntryId, GenerationOutcome, TranscriptEntry};
use tracing::debug;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::playback::save_entry_audio;
use crate::utils::input::read_stdin_text;

pub async fn execute(
    ctx: &CliContext,
    text: Option<String>,
    voice: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => read_stdin_text()?,
    };

    eprintln!("Generating audio...");
    let outcome = ctx.session().generate(&text, voice).await;

    let id = match outcome {
        GenerationOutcome::Ignored => {
            debug!("No text to generate from");
            return Ok(());
        }
        GenerationOutcome::Orphaned { id } => {
            debug!(%id, "Generation completed after the transcript was cleared");
            return Ok(());
        }
        GenerationOutcome::Completed { id, .. } => id,
    };

    let entry = find_entry(&ctx.session().snapshot(), id)
        .ok_or_else(|| CliError::Operation("Generated entry disappeared".to_string()))?;

    if !entry.has_audio() {
        return Err(CliError::Operation(entry.text).into());
    }

    if !entry.text.trim().is_empty() {
        println!("{}", entry.text);
    }
    save_entry_audio(&entry, output.as_deref()).await?;
    Ok(())
}

fn find_entry(entries: &[TranscriptEntry], id: EntryId) -> Option<TranscriptEntry> {
    entries.iter().find(|e| e.id == id).cloned()
}
