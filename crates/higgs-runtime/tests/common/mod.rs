//! Common test utilities.
//!
//! Fake workers are small `sh` scripts launched through the real supervisor;
//! the HTTP side is an axum stub bound to an ephemeral port.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use higgs_core::Settings;
use higgs_runtime::{ProcessSupervisor, SupervisorConfig};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Prints the readiness marker and stays up.
pub const READY_SCRIPT: &str = "echo 'INFO: Server started on port' \"$2\"\nexec sleep 30\n";

/// Becomes ready after a short delay.
pub const SLOW_READY_SCRIPT: &str = "sleep 0.3\necho 'Server started'\nexec sleep 30\n";

/// Fails before readiness.
pub const CRASH_SCRIPT: &str = "echo 'loading model'\necho 'CUDA not available' >&2\nexit 1\n";

/// Never prints the marker.
pub const SILENT_SCRIPT: &str = "echo 'loading model'\nexec sleep 30\n";

/// Ready, then exits on its own.
pub const SHORT_LIVED_SCRIPT: &str = "echo 'Server started'\nsleep 0.3\nexit 3\n";

/// A port nothing is listening on at the time of the call.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// Settings launching `body` through `sh`, with a throwaway script directory.
pub fn fake_worker(body: &str) -> (TempDir, Settings) {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("worker.sh");
    std::fs::write(&script, body).expect("write worker script");

    let settings = Settings {
        python_path: Some(PathBuf::from("sh")),
        script_path: script,
        port: free_port(),
        startup_timeout_secs: 10,
        ..Settings::default()
    };
    (dir, settings)
}

/// Supervisor with short shutdown and restart delays.
pub fn supervisor(settings: Settings) -> ProcessSupervisor {
    let config = SupervisorConfig {
        restart_delay: Duration::from_millis(50),
        shutdown_grace: Duration::from_millis(500),
        ..SupervisorConfig::default()
    };
    ProcessSupervisor::with_config(settings, config).expect("build supervisor")
}

/// Serve `router` on an ephemeral port and return the port.
pub async fn serve_stub(router: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let port = listener.local_addr().expect("local addr").port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    port
}
