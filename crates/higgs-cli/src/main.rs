//! CLI entry point - the composition root.
//!
//! Parses arguments, resolves settings, starts the worker when the command
//! needs one, dispatches, and always stops the worker before exiting.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use higgs_cli::error::exit_code_for;
use higgs_cli::{Cli, CliContext, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    // RUST_LOG wins over -v
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn dispatch(ctx: &CliContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Chat { voice } => handlers::chat::execute(ctx, voice).await,
        Commands::Generate {
            text,
            voice,
            output,
        } => handlers::generate::execute(ctx, text, voice, output).await,
        Commands::UploadVoice { file, name, text } => {
            handlers::upload_voice::execute(ctx, file, name, text).await
        }
        Commands::Sidebar => handlers::sidebar::execute(ctx).await,
        Commands::Voices => handlers::voices::execute(ctx).await,
        Commands::History { clear } => handlers::history::execute(ctx, clear).await,
        Commands::Config { json } => {
            handlers::config::execute(&ctx.session().settings(), json)
        }
    }
}

async fn start_and_dispatch(ctx: &CliContext, command: Commands) -> anyhow::Result<()> {
    if command.needs_worker() {
        eprintln!("Starting Higgs Audio server...");
        ctx.control().start().await.map_err(CliError::from)?;
    }
    dispatch(ctx, command).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings.resolve().map_err(CliError::from)?;

    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(settings)?;

    let result = start_and_dispatch(&ctx, command).await;

    debug!("Shutting down");
    ctx.shutdown().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads HIGGS_*
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = exit_code_for(&err);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
