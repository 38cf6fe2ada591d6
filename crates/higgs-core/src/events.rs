//! Worker lifecycle events.
//!
//! Emitted by the supervisor and consumed by the interaction surface, which turns
//! the failure events into one-shot notifications.

use serde::{Deserialize, Serialize};

use crate::ports::{Notification, SupervisorError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SupervisorEvent {
    /// A worker process has been spawned and is initializing.
    Starting { port: u16, pid: Option<u32> },
    /// The worker reported readiness.
    Ready { port: u16 },
    /// Startup failed; the message is the rendered `SupervisorError`.
    StartupFailed { reason: String },
    /// A ready worker exited on its own.
    WorkerExited { code: Option<i32> },
    /// The worker was stopped on request.
    Stopped,
    /// A configuration change is restarting the worker.
    Reloading,
}

impl SupervisorEvent {
    pub fn startup_failed(error: &SupervisorError) -> Self {
        Self::StartupFailed {
            reason: error.to_string(),
        }
    }

    /// The notification a user should see for this event, if any.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Self::Ready { port } => Some(Notification::info(format!(
                "Higgs Audio server ready on port {port}"
            ))),
            Self::StartupFailed { reason } => Some(Notification::error(format!(
                "Higgs Audio server failed to start: {reason}"
            ))),
            Self::WorkerExited { code } => Some(Notification::warning(match code {
                Some(code) => format!("Higgs Audio server exited with code {code}"),
                None => "Higgs Audio server was terminated by a signal".to_string(),
            })),
            Self::Starting { .. } | Self::Stopped | Self::Reloading => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NotificationLevel;

    #[test]
    fn test_failure_events_notify() {
        let event = SupervisorEvent::startup_failed(&SupervisorError::StartupTimeout { secs: 60 });
        let notification = event.notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(notification.message.contains("60"));

        let exited = SupervisorEvent::WorkerExited { code: Some(1) };
        assert_eq!(
            exited.notification().unwrap().level,
            NotificationLevel::Warning
        );
    }

    #[test]
    fn test_quiet_events() {
        assert!(SupervisorEvent::Stopped.notification().is_none());
        assert!(SupervisorEvent::Reloading.notification().is_none());
    }

    #[test]
    fn test_serialization_tag() {
        let json = serde_json::to_string(&SupervisorEvent::Ready { port: 8765 }).unwrap();
        assert!(json.contains("\"type\":\"ready\""));
    }
}
