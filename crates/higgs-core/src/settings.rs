//! Settings domain types and validation.
//!
//! These are the options of the `higgsAudio` configuration namespace plus the
//! few process-level knobs needed to launch the worker. Any accepted change is
//! expected to trigger a supervisor reload.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default port the worker listens on.
pub const DEFAULT_WORKER_PORT: u16 = 8765;

/// Seconds to wait for the worker to report readiness.
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 60;

/// Substring the worker prints on stdout once it accepts requests.
pub const READY_MARKER: &str = "Server started";

pub const DEFAULT_MODEL_PATH: &str = "bosonai/higgs-audio-v2-generation-3B-base";
pub const DEFAULT_AUDIO_TOKENIZER_PATH: &str = "bosonai/higgs-audio-v2-tokenizer";
pub const DEFAULT_SCRIPT_PATH: &str = "python/higgs_audio_server.py";

/// How the supervisor decides that a freshly launched worker is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessProbe {
    /// Wait for [`READY_MARKER`] on the worker's stdout.
    #[default]
    Marker,
    /// Poll `GET /health` until it answers 2xx.
    Health,
}

impl ReadinessProbe {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" | "stdout" => Some(Self::Marker),
            "health" | "http" => Some(Self::Health),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::Health => "health",
        }
    }
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Python interpreter; resolved from `PATH` when unset or missing.
    pub python_path: Option<PathBuf>,
    /// Worker server script passed as the interpreter's first argument.
    pub script_path: PathBuf,
    pub port: u16,
    pub model_path: String,
    pub audio_tokenizer_path: String,
    /// `auto`, `cuda` or `cpu`.
    pub device: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Start playback as soon as a generation completes.
    pub auto_play: bool,
    pub readiness: ReadinessProbe,
    pub startup_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            python_path: None,
            script_path: PathBuf::from(DEFAULT_SCRIPT_PATH),
            port: DEFAULT_WORKER_PORT,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            audio_tokenizer_path: DEFAULT_AUDIO_TOKENIZER_PATH.to_string(),
            device: "auto".to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            top_p: 0.95,
            auto_play: true,
            readiness: ReadinessProbe::Marker,
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Base URL of the worker's HTTP interface.
    pub fn worker_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Merge an update into these settings, returning whether anything changed.
    pub fn merge(&mut self, update: &SettingsUpdate) -> bool {
        let before = self.clone();

        if let Some(ref path) = update.python_path {
            self.python_path.clone_from(path);
        }
        if let Some(ref path) = update.script_path {
            self.script_path.clone_from(path);
        }
        if let Some(port) = update.port {
            self.port = port;
        }
        if let Some(ref path) = update.model_path {
            self.model_path.clone_from(path);
        }
        if let Some(ref path) = update.audio_tokenizer_path {
            self.audio_tokenizer_path.clone_from(path);
        }
        if let Some(ref device) = update.device {
            self.device.clone_from(device);
        }
        if let Some(max_tokens) = update.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(top_p) = update.top_p {
            self.top_p = top_p;
        }
        if let Some(auto_play) = update.auto_play {
            self.auto_play = auto_play;
        }
        if let Some(readiness) = update.readiness {
            self.readiness = readiness;
        }
        if let Some(secs) = update.startup_timeout_secs {
            self.startup_timeout_secs = secs;
        }

        *self != before
    }
}

/// Partial settings update.
///
/// `None` leaves a field unchanged. `python_path` is nullable, so it uses
/// `Some(None)` to clear the configured interpreter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub python_path: Option<Option<PathBuf>>,
    pub script_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub model_path: Option<String>,
    pub audio_tokenizer_path: Option<String>,
    pub device: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub auto_play: Option<bool>,
    pub readiness: Option<ReadinessProbe>,
    pub startup_timeout_secs: Option<u64>,
}

impl SettingsUpdate {
    /// Names accepted by [`SettingsUpdate::parse_option`].
    pub const OPTION_NAMES: &'static [&'static str] = &[
        "modelPath",
        "audioTokenizerPath",
        "device",
        "maxTokens",
        "temperature",
        "topP",
        "autoPlay",
        "pythonPath",
        "scriptPath",
        "port",
        "readiness",
        "startupTimeoutSecs",
    ];

    /// Parse a single `option value` pair using the configuration namespace names.
    pub fn parse_option(option: &str, value: &str) -> Result<Self, SettingsError> {
        let value = value.trim();
        let invalid = || SettingsError::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
        };

        let mut update = Self::default();
        match option {
            "modelPath" => update.model_path = Some(value.to_string()),
            "audioTokenizerPath" => update.audio_tokenizer_path = Some(value.to_string()),
            "device" => update.device = Some(value.to_string()),
            "maxTokens" => update.max_tokens = Some(value.parse().map_err(|_| invalid())?),
            "temperature" => update.temperature = Some(value.parse().map_err(|_| invalid())?),
            "topP" => update.top_p = Some(value.parse().map_err(|_| invalid())?),
            "autoPlay" => update.auto_play = Some(parse_bool(value).ok_or_else(invalid)?),
            "pythonPath" => {
                update.python_path = Some((!value.is_empty()).then(|| PathBuf::from(value)));
            }
            "scriptPath" => update.script_path = Some(PathBuf::from(value)),
            "port" => update.port = Some(value.parse().map_err(|_| invalid())?),
            "readiness" => update.readiness = Some(ReadinessProbe::parse(value).ok_or_else(invalid)?),
            "startupTimeoutSecs" => {
                update.startup_timeout_secs = Some(value.parse().map_err(|_| invalid())?);
            }
            _ => return Err(SettingsError::UnknownOption(option.to_string())),
        }
        Ok(update)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),

    #[error("Top-p must be in (0.0, 1.0], got {0}")]
    InvalidTopP(f32),

    #[error("Max tokens must be between 1 and 8192, got {0}")]
    InvalidMaxTokens(u32),

    #[error("Port should be >= 1024 (privileged ports require root), got {0}")]
    InvalidPort(u16),

    #[error("Startup timeout must be at least one second")]
    InvalidStartupTimeout,

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Unknown option '{0}'")]
    UnknownOption(String),

    #[error("Invalid value '{value}' for option '{option}'")]
    InvalidValue { option: String, value: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if !(0.0..=2.0).contains(&settings.temperature) {
        return Err(SettingsError::InvalidTemperature(settings.temperature));
    }

    if !(settings.top_p > 0.0 && settings.top_p <= 1.0) {
        return Err(SettingsError::InvalidTopP(settings.top_p));
    }

    if !(1..=8192).contains(&settings.max_tokens) {
        return Err(SettingsError::InvalidMaxTokens(settings.max_tokens));
    }

    if settings.port < 1024 {
        return Err(SettingsError::InvalidPort(settings.port));
    }

    if settings.startup_timeout_secs == 0 {
        return Err(SettingsError::InvalidStartupTimeout);
    }

    if settings.model_path.trim().is_empty() {
        return Err(SettingsError::EmptyField("modelPath"));
    }
    if settings.audio_tokenizer_path.trim().is_empty() {
        return Err(SettingsError::EmptyField("audioTokenizerPath"));
    }
    if settings.device.trim().is_empty() {
        return Err(SettingsError::EmptyField("device"));
    }
    if settings.script_path.as_os_str().is_empty() {
        return Err(SettingsError::EmptyField("scriptPath"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.port, DEFAULT_WORKER_PORT);
        assert_eq!(settings.max_tokens, 1024);
        assert_eq!(settings.device, "auto");
        assert!(settings.auto_play);
        assert_eq!(settings.readiness, ReadinessProbe::Marker);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_worker_base_url() {
        let settings = Settings {
            port: 9100,
            ..Settings::default()
        };
        assert_eq!(settings.worker_base_url(), "http://127.0.0.1:9100");
    }

    #[test]
    fn test_merge_reports_change() {
        let mut settings = Settings::default();
        let update = SettingsUpdate {
            temperature: Some(0.9),
            ..Default::default()
        };
        assert!(settings.merge(&update));
        assert!((settings.temperature - 0.9).abs() < f32::EPSILON);

        // Same value again is not a change
        assert!(!settings.merge(&update));
    }

    #[test]
    fn test_merge_clears_python_path() {
        let mut settings = Settings {
            python_path: Some(PathBuf::from("/usr/bin/python3")),
            ..Settings::default()
        };
        let update = SettingsUpdate {
            python_path: Some(None),
            ..Default::default()
        };
        assert!(settings.merge(&update));
        assert!(settings.python_path.is_none());
    }

    #[test]
    fn test_parse_option_known_names() {
        let update = SettingsUpdate::parse_option("topP", "0.5").unwrap();
        assert_eq!(update.top_p, Some(0.5));

        let update = SettingsUpdate::parse_option("autoPlay", "off").unwrap();
        assert_eq!(update.auto_play, Some(false));

        let update = SettingsUpdate::parse_option("readiness", "health").unwrap();
        assert_eq!(update.readiness, Some(ReadinessProbe::Health));

        let update = SettingsUpdate::parse_option("pythonPath", "").unwrap();
        assert_eq!(update.python_path, Some(None));
    }

    #[test]
    fn test_parse_option_errors() {
        assert_eq!(
            SettingsUpdate::parse_option("volume", "11"),
            Err(SettingsError::UnknownOption("volume".to_string()))
        );
        assert!(matches!(
            SettingsUpdate::parse_option("maxTokens", "lots"),
            Err(SettingsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_ranges() {
        let hot = Settings {
            temperature: 2.5,
            ..Settings::default()
        };
        assert_eq!(
            validate_settings(&hot),
            Err(SettingsError::InvalidTemperature(2.5))
        );

        let zero_top_p = Settings {
            top_p: 0.0,
            ..Settings::default()
        };
        assert!(matches!(
            validate_settings(&zero_top_p),
            Err(SettingsError::InvalidTopP(_))
        ));

        let low_port = Settings {
            port: 80,
            ..Settings::default()
        };
        assert_eq!(validate_settings(&low_port), Err(SettingsError::InvalidPort(80)));

        let no_device = Settings {
            device: " ".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            validate_settings(&no_device),
            Err(SettingsError::EmptyField("device"))
        );
    }

    #[test]
    fn test_serialization_uses_namespace_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert!(json["topP"].is_number());
        assert_eq!(json["maxTokens"], 1024);
        assert_eq!(json["autoPlay"], true);
        assert_eq!(json["readiness"], "marker");
    }
}
