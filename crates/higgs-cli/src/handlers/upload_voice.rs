//! Clone-voice handler.
//!
//! Missing fields are prompted for; leaving any of them empty cancels quietly.
//! The worker is only started once the input is complete.

use std::path::PathBuf;

use anyhow::Result;
use higgs_core::{CloneOutcome, CloneVoiceInput};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::utils::input::value_or_prompt;

pub async fn execute(
    ctx: &CliContext,
    file: Option<PathBuf>,
    name: Option<String>,
    text: Option<String>,
) -> Result<()> {
    let input = collect_input(file, name, text)?;
    submit(ctx, input).await
}

/// Send a complete input, starting the worker first. Incomplete input cancels.
pub async fn submit(ctx: &CliContext, input: CloneVoiceInput) -> Result<()> {
    if !input.is_complete() {
        println!("Voice upload cancelled.");
        return Ok(());
    }

    eprintln!("Starting Higgs Audio server...");
    ctx.control().start().await.map_err(CliError::from)?;

    match ctx.session().clone_voice(input).await {
        CloneOutcome::Cancelled => {
            println!("Voice upload cancelled.");
            Ok(())
        }
        CloneOutcome::Cloned { voice_id } => {
            if let Some(id) = voice_id {
                println!("Voice id: {id}");
            }
            Ok(())
        }
        CloneOutcome::Failed { error } => Err(CliError::Operation(error).into()),
    }
}

/// Gather the three required fields, prompting for any not given.
pub fn collect_input(
    file: Option<PathBuf>,
    name: Option<String>,
    text: Option<String>,
) -> Result<CloneVoiceInput> {
    let file = value_or_prompt(
        file.map(|p| p.to_string_lossy().into_owned()),
        "Reference audio file",
    )?;
    let Some(file) = file else {
        return Ok(CloneVoiceInput::default());
    };

    let name = value_or_prompt(name, "Voice name")?;
    if name.is_none() {
        return Ok(CloneVoiceInput {
            audio_file: Some(PathBuf::from(file)),
            ..CloneVoiceInput::default()
        });
    }

    let text = value_or_prompt(text, "Transcript of the reference audio")?;

    Ok(CloneVoiceInput {
        audio_file: Some(PathBuf::from(file)),
        name,
        text,
    })
}
