//! Interactive voice chat.
//!
//! Plain lines are sent for generation; lines starting with `/` are REPL
//! commands. Each generation adds the user message and a placeholder that is
//! filled when the worker answers.

use std::path::PathBuf;

use anyhow::Result;
use higgs_core::{
    CloneOutcome, GenerationOutcome, Settings, SettingsUpdate, TranscriptEntry, render,
    validate_settings,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::bootstrap::CliContext;
use crate::handlers::config::print_settings;
use crate::handlers::playback::{save_entry_audio, stage_for_playback};
use crate::handlers::sidebar::build as build_sidebar;
use crate::handlers::upload_voice::collect_input;
use crate::presentation::{format_history, format_sidebar, print_transcript};

const HELP: &str = "\
Commands:
  /voice [name]          use a voice for following messages (no name: default)
  /voices                list available voices
  /clone                 clone a voice from a reference recording
  /play <n>              stage entry n's audio for playback
  /save <n> [path]       save entry n's audio
  /transcript            show this session's transcript
  /history [clear]       show or clear the worker's history
  /sidebar               show the sidebar overview
  /set <option> <value>  change a setting (restarts the worker)
  /config                show current settings
  /clear                 clear this session's transcript
  /help                  show this help
  /quit                  leave the chat";

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Say(String),
    Voice(Option<String>),
    Voices,
    Clone,
    Play(usize),
    Save { index: usize, path: Option<PathBuf> },
    Transcript,
    History { clear: bool },
    Sidebar,
    Set { option: String, value: String },
    Config,
    Clear,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ReplCommand::Say(line.to_string());
    };

    let (command, args) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(c, a)| (c, a.trim()));

    match command {
        "voice" => ReplCommand::Voice((!args.is_empty()).then(|| args.to_string())),
        "voices" => ReplCommand::Voices,
        "clone" => ReplCommand::Clone,
        "play" => parse_index(args).map_or_else(
            || ReplCommand::Invalid("usage: /play <n>".to_string()),
            ReplCommand::Play,
        ),
        "save" => {
            let (index, path) = args
                .split_once(char::is_whitespace)
                .map_or((args, ""), |(i, p)| (i, p.trim()));
            parse_index(index).map_or_else(
                || ReplCommand::Invalid("usage: /save <n> [path]".to_string()),
                |index| ReplCommand::Save {
                    index,
                    path: (!path.is_empty()).then(|| PathBuf::from(path)),
                },
            )
        }
        "transcript" => ReplCommand::Transcript,
        "history" => match args {
            "" => ReplCommand::History { clear: false },
            "clear" => ReplCommand::History { clear: true },
            _ => ReplCommand::Invalid("usage: /history [clear]".to_string()),
        },
        "sidebar" => ReplCommand::Sidebar,
        "set" => match args.split_once(char::is_whitespace) {
            Some((option, value)) => ReplCommand::Set {
                option: option.to_string(),
                value: value.trim().to_string(),
            },
            // Allows clearing nullable options such as pythonPath
            None if !args.is_empty() => ReplCommand::Set {
                option: args.to_string(),
                value: String::new(),
            },
            None => ReplCommand::Invalid("usage: /set <option> <value>".to_string()),
        },
        "config" => ReplCommand::Config,
        "clear" => ReplCommand::Clear,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => ReplCommand::Invalid(format!("unknown command '/{other}', try /help")),
    }
}

/// 1-based entry number.
fn parse_index(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok().filter(|n| *n > 0)
}

/// Apply a `/set` change to `current`, returning the new validated settings.
pub fn apply_set(current: &Settings, option: &str, value: &str) -> Result<Option<Settings>> {
    let update = SettingsUpdate::parse_option(option, value)?;
    let mut next = current.clone();
    if !next.merge(&update) {
        return Ok(None);
    }
    validate_settings(&next)?;
    Ok(Some(next))
}

struct ChatState {
    voice: Option<String>,
}

pub async fn execute(ctx: &CliContext, voice: Option<String>) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut state = ChatState { voice };

    println!("Higgs Audio chat. Type a message to hear it, /help for commands.");

    loop {
        let prompt = state
            .voice
            .as_ref()
            .map_or_else(|| "you> ".to_string(), |v| format!("you ({v})> "));
        let line = match tokio::task::block_in_place(|| editor.readline(&prompt)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let _ = editor.add_history_entry(line.as_str());

        let command = parse_line(&line);
        if command == ReplCommand::Quit {
            break;
        }
        if let Err(e) = dispatch(ctx, &mut state, command).await {
            eprintln!("✗ {e}");
        }
    }

    Ok(())
}

async fn dispatch(ctx: &CliContext, state: &mut ChatState, command: ReplCommand) -> Result<()> {
    match command {
        ReplCommand::Say(text) => say(ctx, &text, state.voice.clone()).await?,
        ReplCommand::Voice(voice) => {
            match &voice {
                Some(v) => println!("Using voice '{v}'."),
                None => println!("Using the default voice."),
            }
            state.voice = voice;
        }
        ReplCommand::Voices => crate::handlers::voices::execute(ctx).await?,
        ReplCommand::Clone => {
            let input = collect_input(None, None, None)?;
            match ctx.session().clone_voice(input).await {
                CloneOutcome::Cancelled => println!("Voice upload cancelled."),
                // Success and failure were already notified
                CloneOutcome::Cloned { .. } | CloneOutcome::Failed { .. } => {}
            }
        }
        ReplCommand::Play(index) => {
            let entry = entry_with_audio(ctx, index)?;
            stage_for_playback(&entry).await?;
        }
        ReplCommand::Save { index, path } => {
            let entry = entry_with_audio(ctx, index)?;
            save_entry_audio(&entry, path.as_deref()).await?;
        }
        ReplCommand::Transcript => {
            let entries = ctx.session().snapshot();
            if entries.is_empty() {
                println!("Transcript is empty.");
            } else {
                print_transcript(&entries);
            }
        }
        ReplCommand::History { clear } => {
            if clear {
                crate::handlers::history::execute(ctx, true).await?;
            } else {
                let response = ctx.backend().get_history().await;
                for line in format_history(&response.entries) {
                    println!("{line}");
                }
                if let Some(error) = response.error_message {
                    eprintln!("✗ {error}");
                }
            }
        }
        ReplCommand::Sidebar => {
            let tree = build_sidebar(ctx).await;
            print!("{}", format_sidebar(&tree));
        }
        ReplCommand::Set { option, value } => {
            let current = ctx.session().settings();
            match apply_set(&current, &option, &value)? {
                Some(next) => {
                    println!("Applying {option} = {value}...");
                    ctx.apply_settings(next).await?;
                    println!("✓ Settings updated.");
                }
                None => println!("{option} is already {value}."),
            }
        }
        ReplCommand::Config => print_settings(&ctx.session().settings()),
        ReplCommand::Clear => {
            ctx.session().clear();
            println!("Transcript cleared.");
        }
        ReplCommand::Help => println!("{HELP}"),
        ReplCommand::Invalid(message) => eprintln!("{message}"),
        ReplCommand::Empty | ReplCommand::Quit => {}
    }
    Ok(())
}

async fn say(ctx: &CliContext, text: &str, voice: Option<String>) -> Result<()> {
    let session = ctx.session();
    let Some(pending) = session.begin_generation(text, voice) else {
        return Ok(());
    };
    print_tail(&session.snapshot(), 2);

    let response = ctx.backend().generate_audio(pending.request).await;
    let outcome = session.complete_generation(pending.id, &response);

    match outcome {
        GenerationOutcome::Completed { id, autoplay, .. } => {
            let entries = session.snapshot();
            if let Some(entry) = entries.iter().find(|e| e.id == id) {
                print_tail(std::slice::from_ref(entry), 1);
                if autoplay {
                    stage_for_playback(entry).await?;
                }
            }
        }
        GenerationOutcome::Orphaned { id } => debug!(%id, "Dropped completion for cleared entry"),
        GenerationOutcome::Ignored => {}
    }
    Ok(())
}

fn print_tail(entries: &[TranscriptEntry], count: usize) {
    let skip = entries.len().saturating_sub(count);
    for rendered in render(entries).skip(skip) {
        println!("{rendered}");
    }
}

fn entry_with_audio(ctx: &CliContext, index: usize) -> Result<TranscriptEntry> {
    let entries = ctx.session().snapshot();
    let entry = entries
        .get(index - 1)
        .ok_or_else(|| anyhow::anyhow!("No entry #{index}, see /transcript"))?;
    if !entry.has_audio() {
        anyhow::bail!("Entry #{index} has no audio");
    }
    Ok(entry.clone())
}
