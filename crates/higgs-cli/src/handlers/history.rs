//! Worker conversation history.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::format_history;

pub async fn execute(ctx: &CliContext, clear: bool) -> Result<()> {
    if clear {
        let response = ctx.backend().clear_history().await;
        if !response.succeeded {
            let error = response
                .error_message
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(CliError::Operation(format!("Failed to clear history: {error}")).into());
        }
        println!("✓ History cleared.");
        return Ok(());
    }

    let response = ctx.backend().get_history().await;
    if !response.succeeded {
        let error = response
            .error_message
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(CliError::Operation(format!("Failed to load history: {error}")).into());
    }

    if response.entries.is_empty() {
        println!("History is empty.");
        return Ok(());
    }

    for line in format_history(&response.entries) {
        println!("{line}");
    }
    Ok(())
}
