//! Worker lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle of the supervised worker process.
///
/// `NotStarted -> Starting -> Ready -> Stopped`, with `Failed` reachable from
/// `Starting` when the readiness signal never arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SupervisorState {
    #[default]
    NotStarted,
    Starting,
    Ready,
    Stopped,
    Failed,
}

impl SupervisorState {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether a new `start()` call would launch a process.
    #[must_use]
    pub const fn can_launch(&self) -> bool {
        matches!(self, Self::NotStarted | Self::Stopped | Self::Failed)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launchable_states() {
        assert!(SupervisorState::NotStarted.can_launch());
        assert!(SupervisorState::Stopped.can_launch());
        assert!(SupervisorState::Failed.can_launch());
        assert!(!SupervisorState::Starting.can_launch());
        assert!(!SupervisorState::Ready.can_launch());
    }
}
