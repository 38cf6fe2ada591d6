//! Worker termination: polite request first, forced kill after a grace period.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;

/// Default time a worker gets to exit after SIGTERM.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// How a worker ended.
#[derive(Debug, Clone, Copy)]
pub struct Termination {
    pub status: ExitStatus,
    /// The worker outlived its grace period and was killed.
    pub forced: bool,
}

/// Terminate a worker and reap it.
///
/// On Unix the worker gets SIGTERM and `grace` to exit before SIGKILL. Elsewhere
/// there is no polite signal, so it is killed right away. Either way the child
/// is waited on so no zombie is left behind.
pub async fn terminate_worker(mut child: Child, grace: Duration) -> io::Result<Termination> {
    if request_exit(&child)? {
        if let Ok(status) = timeout(grace, child.wait()).await {
            return Ok(Termination {
                status: status?,
                forced: false,
            });
        }
    }

    if let Ok(Some(status)) = child.try_wait() {
        return Ok(Termination {
            status,
            forced: false,
        });
    }

    child.kill().await?;
    Ok(Termination {
        status: child.wait().await?,
        forced: true,
    })
}

/// Ask the worker to exit. `false` means no signal was delivered and the
/// caller should go straight to reaping or killing.
#[cfg(unix)]
fn request_exit(child: &Child) -> io::Result<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return Ok(false);
    };

    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => Ok(true),
        // Gone already; wait() will collect it
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) -> io::Result<bool> {
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;
    use tokio::time::sleep;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_is_enough_for_a_cooperative_worker() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();

        let ended = terminate_worker(child, DEFAULT_SHUTDOWN_GRACE).await.unwrap();
        assert!(!ended.forced);
        assert!(!ended.status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stubborn_worker_is_killed() {
        let child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 30"])
            .spawn()
            .unwrap();
        sleep(Duration::from_millis(200)).await;

        let ended = terminate_worker(child, Duration::from_millis(200)).await.unwrap();
        assert!(ended.forced);
    }

    #[tokio::test]
    async fn test_exited_worker_is_reaped() {
        let child = Command::new("true").spawn().unwrap();
        sleep(Duration::from_millis(100)).await;

        let ended = terminate_worker(child, DEFAULT_SHUTDOWN_GRACE).await.unwrap();
        assert!(!ended.forced);
    }
}
