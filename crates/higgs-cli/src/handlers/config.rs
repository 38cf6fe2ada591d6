//! Config command handler.

use anyhow::Result;
use higgs_core::Settings;

/// Human-readable listing using the configuration option names.
pub fn format_settings(settings: &Settings) -> Vec<(&'static str, String)> {
    vec![
        ("modelPath", settings.model_path.clone()),
        ("audioTokenizerPath", settings.audio_tokenizer_path.clone()),
        ("device", settings.device.clone()),
        ("maxTokens", settings.max_tokens.to_string()),
        ("temperature", settings.temperature.to_string()),
        ("topP", settings.top_p.to_string()),
        ("autoPlay", settings.auto_play.to_string()),
        (
            "pythonPath",
            settings
                .python_path
                .as_ref()
                .map_or_else(|| "(auto)".to_string(), |p| p.display().to_string()),
        ),
        ("scriptPath", settings.script_path.display().to_string()),
        ("port", settings.port.to_string()),
        ("readiness", settings.readiness.as_str().to_string()),
        ("startupTimeoutSecs", settings.startup_timeout_secs.to_string()),
    ]
}

pub fn print_settings(settings: &Settings) {
    for (name, value) in format_settings(settings) {
        println!("  {name:<20} {value}");
    }
}

pub fn execute(settings: &Settings, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
    } else {
        println!("Current settings:");
        print_settings(settings);
    }
    Ok(())
}
