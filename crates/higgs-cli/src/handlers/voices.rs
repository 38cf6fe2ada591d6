//! Voice library listing.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let response = ctx.backend().list_voices().await;
    if !response.succeeded {
        let error = response
            .error_message
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(CliError::Operation(format!("Failed to list voices: {error}")).into());
    }

    if response.voices.is_empty() {
        println!("No voices yet. Add one with `higgs upload-voice`.");
        return Ok(());
    }

    println!("Available voices ({}):", response.voices.len());
    for voice in &response.voices {
        println!("  • {voice}");
    }
    Ok(())
}
