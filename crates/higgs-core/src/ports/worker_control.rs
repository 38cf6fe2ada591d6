//! Worker lifecycle control port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::SupervisorState;
use crate::settings::Settings;

/// Errors that can occur while starting or stopping the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// The readiness signal did not arrive in time. The process is left running.
    #[error("Worker startup timed out after {secs}s")]
    StartupTimeout { secs: u64 },

    /// The worker exited before it became ready.
    #[error("Worker exited before becoming ready ({})", exit_code_text(.code))]
    ProcessExit { code: Option<i32> },

    /// The interpreter could not be launched.
    #[error("Failed to launch worker: {0}")]
    Spawn(String),

    /// The HTTP readiness probe gave up.
    #[error("Worker health check failed: {0}")]
    HealthProbe(String),

    /// `stop()` was called while the start attempt was in flight.
    #[error("Worker startup was aborted by a stop request")]
    Aborted,

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

#[allow(clippy::ref_option)]
fn exit_code_text(code: &Option<i32>) -> String {
    code.map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"))
}

/// Port for controlling the worker process lifecycle.
#[async_trait]
pub trait WorkerControl: Send + Sync {
    /// Launch the worker and wait for readiness. No-op when already ready.
    async fn start(&self) -> Result<(), SupervisorError>;

    /// Terminate the worker if one exists. Idempotent.
    async fn stop(&self);

    /// Apply new settings, restarting the worker only if it is ready.
    async fn reload_configuration(&self, settings: Settings) -> Result<(), SupervisorError>;

    /// Current lifecycle state.
    fn state(&self) -> SupervisorState;

    /// Settings the next launch will use.
    fn settings(&self) -> Settings;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_exit_message_carries_code() {
        let err = SupervisorError::ProcessExit { code: Some(1) };
        assert_eq!(
            err.to_string(),
            "Worker exited before becoming ready (exit code 1)"
        );

        let err = SupervisorError::ProcessExit { code: None };
        assert!(err.to_string().contains("signal"));
    }
}
