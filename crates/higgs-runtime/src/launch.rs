//! Worker command construction.
//!
//! Builds the interpreter invocation from `Settings`. Kept separate from the
//! supervisor so the argument list can be checked without spawning anything.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use higgs_core::Settings;
use tokio::process::Command;
use tracing::debug;

/// Interpreters tried, in order, when no usable one is configured.
const FALLBACK_INTERPRETERS: &[&str] = &["python3", "python", "py"];

/// Fully resolved worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerLaunchSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
}

impl WorkerLaunchSpec {
    /// Resolve the interpreter and lay out the fixed argument list.
    pub fn from_settings(settings: &Settings) -> Self {
        let program = resolve_python_path(settings.python_path.as_deref());
        let script = absolute_script_path(&settings.script_path);
        let working_dir = script
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);

        let args: Vec<OsString> = vec![
            script.into_os_string(),
            "--port".into(),
            settings.port.to_string().into(),
            "--model-path".into(),
            settings.model_path.clone().into(),
            "--audio-tokenizer-path".into(),
            settings.audio_tokenizer_path.clone().into(),
            "--device".into(),
            settings.device.clone().into(),
            "--max-tokens".into(),
            settings.max_tokens.to_string().into(),
            "--temperature".into(),
            settings.temperature.to_string().into(),
            "--top-p".into(),
            settings.top_p.to_string().into(),
        ];

        Self {
            program,
            args,
            working_dir,
        }
    }

    /// Build the command with piped output streams.
    ///
    /// The child is killed if its handle is dropped without an explicit shutdown.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        cmd
    }
}

/// The worker runs from the script's directory, so a relative script path
/// is anchored to our own working directory first.
fn absolute_script_path(script: &Path) -> PathBuf {
    std::path::absolute(script).unwrap_or_else(|e| {
        debug!(script = %script.display(), error = %e, "Could not make script path absolute");
        script.to_path_buf()
    })
}

/// Pick the interpreter: the configured one if it exists (as a path or on
/// `PATH`), otherwise the first fallback found on `PATH`, otherwise `python`.
pub fn resolve_python_path(configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        if path.exists() {
            return path.to_path_buf();
        }
        if let Ok(found) = which::which(path) {
            return found;
        }
        debug!(path = %path.display(), "Configured interpreter not found, falling back");
    }

    FALLBACK_INTERPRETERS
        .iter()
        .find_map(|name| which::which(name).ok())
        .unwrap_or_else(|| PathBuf::from("python"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_as_strings(spec: &WorkerLaunchSpec) -> Vec<String> {
        spec.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_argument_layout() {
        let settings = Settings {
            script_path: PathBuf::from("/opt/higgs/server.py"),
            port: 9001,
            device: "cpu".to_string(),
            max_tokens: 256,
            temperature: 0.5,
            top_p: 0.9,
            ..Settings::default()
        };

        let spec = WorkerLaunchSpec::from_settings(&settings);
        assert_eq!(
            args_as_strings(&spec),
            vec![
                "/opt/higgs/server.py",
                "--port",
                "9001",
                "--model-path",
                "bosonai/higgs-audio-v2-generation-3B-base",
                "--audio-tokenizer-path",
                "bosonai/higgs-audio-v2-tokenizer",
                "--device",
                "cpu",
                "--max-tokens",
                "256",
                "--temperature",
                "0.5",
                "--top-p",
                "0.9",
            ]
        );
        assert_eq!(spec.working_dir, Some(PathBuf::from("/opt/higgs")));
    }

    #[test]
    fn test_relative_script_is_passed_absolute() {
        let settings = Settings {
            script_path: PathBuf::from("python/higgs_audio_server.py"),
            ..Settings::default()
        };
        let cwd = std::env::current_dir().unwrap();

        let spec = WorkerLaunchSpec::from_settings(&settings);
        assert_eq!(
            PathBuf::from(&spec.args[0]),
            cwd.join("python/higgs_audio_server.py")
        );
        assert_eq!(spec.working_dir, Some(cwd.join("python")));
    }

    #[test]
    fn test_bare_script_runs_from_current_dir() {
        let settings = Settings {
            script_path: PathBuf::from("server.py"),
            ..Settings::default()
        };
        let spec = WorkerLaunchSpec::from_settings(&settings);
        assert_eq!(spec.working_dir, Some(std::env::current_dir().unwrap()));
    }

    #[test]
    fn test_existing_configured_interpreter_wins() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("python-custom");
        std::fs::write(&fake, "").unwrap();

        assert_eq!(resolve_python_path(Some(&fake)), fake);
    }

    #[test]
    #[cfg(unix)]
    fn test_configured_name_is_looked_up_on_path() {
        let resolved = resolve_python_path(Some(Path::new("sh")));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("sh"));
    }

    #[test]
    fn test_missing_interpreter_falls_back() {
        let resolved = resolve_python_path(Some(Path::new("/definitely/not/here/python")));
        assert_ne!(resolved, PathBuf::from("/definitely/not/here/python"));
    }
}
