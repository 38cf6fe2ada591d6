//! Main CLI parser and top-level argument handling.
//!
//! Global options cover logging and every worker setting; each setting can also
//! come from a `HIGGS_*` environment variable (or a `.env` file).

use std::path::PathBuf;

use clap::{Args, Parser};
use higgs_core::{
    ReadinessProbe, Settings, SettingsError, SettingsUpdate, validate_settings,
};

use crate::commands::Commands;

/// Command-line host for the Higgs Audio speech generation worker.
#[derive(Parser)]
#[command(name = "higgs")]
#[command(about = "Chat with and generate speech from a local Higgs Audio worker")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (repeat for debug)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Worker settings overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Python interpreter used to run the worker
    #[arg(long, global = true, env = "HIGGS_PYTHON_PATH")]
    pub python_path: Option<PathBuf>,

    /// Worker server script
    #[arg(long, global = true, env = "HIGGS_SCRIPT_PATH")]
    pub script_path: Option<PathBuf>,

    /// Port the worker listens on
    #[arg(long, global = true, env = "HIGGS_PORT")]
    pub port: Option<u16>,

    /// Generation model (local path or hub id)
    #[arg(long, global = true, env = "HIGGS_MODEL_PATH")]
    pub model_path: Option<String>,

    /// Audio tokenizer (local path or hub id)
    #[arg(long, global = true, env = "HIGGS_AUDIO_TOKENIZER_PATH")]
    pub audio_tokenizer_path: Option<String>,

    /// Inference device: auto, cuda or cpu
    #[arg(long, global = true, env = "HIGGS_DEVICE")]
    pub device: Option<String>,

    #[arg(long, global = true, env = "HIGGS_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    #[arg(long, global = true, env = "HIGGS_TEMPERATURE")]
    pub temperature: Option<f32>,

    #[arg(long, global = true, env = "HIGGS_TOP_P")]
    pub top_p: Option<f32>,

    /// Play generated audio automatically (true/false)
    #[arg(long, global = true, env = "HIGGS_AUTO_PLAY")]
    pub auto_play: Option<bool>,

    /// Readiness probe: marker or health
    #[arg(long, global = true, env = "HIGGS_READINESS", value_parser = parse_readiness)]
    pub readiness: Option<ReadinessProbe>,

    /// Seconds to wait for the worker to become ready
    #[arg(long, global = true, env = "HIGGS_STARTUP_TIMEOUT")]
    pub startup_timeout_secs: Option<u64>,
}

fn parse_readiness(value: &str) -> Result<ReadinessProbe, String> {
    ReadinessProbe::parse(value).ok_or_else(|| format!("expected 'marker' or 'health', got '{value}'"))
}

impl SettingsArgs {
    pub fn to_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            python_path: self.python_path.clone().map(Some),
            script_path: self.script_path.clone(),
            port: self.port,
            model_path: self.model_path.clone(),
            audio_tokenizer_path: self.audio_tokenizer_path.clone(),
            device: self.device.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            auto_play: self.auto_play,
            readiness: self.readiness,
            startup_timeout_secs: self.startup_timeout_secs,
        }
    }

    /// Defaults overlaid with these arguments, validated.
    pub fn resolve(&self) -> Result<Settings, SettingsError> {
        let mut settings = Settings::default();
        settings.merge(&self.to_update());
        validate_settings(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "higgs",
            "-vv",
            "--port",
            "9100",
            "--temperature",
            "0.7",
            "voices",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.settings.port, Some(9100));

        let settings = cli.settings.resolve().unwrap();
        assert_eq!(settings.port, 9100);
        assert!((settings.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(settings.max_tokens, 1024);
    }

    #[test]
    fn test_readiness_flag() {
        let cli = Cli::parse_from(["higgs", "--readiness", "health", "chat"]);
        assert_eq!(cli.settings.readiness, Some(ReadinessProbe::Health));

        assert!(Cli::try_parse_from(["higgs", "--readiness", "smoke", "chat"]).is_err());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let args = SettingsArgs {
            top_p: Some(1.5),
            ..SettingsArgs::default()
        };
        assert_eq!(args.resolve(), Err(SettingsError::InvalidTopP(1.5)));
    }
}
