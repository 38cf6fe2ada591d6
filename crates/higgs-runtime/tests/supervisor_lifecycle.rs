//! Lifecycle tests for `ProcessSupervisor` against fake `sh` workers.

#![cfg(unix)]

mod common;

use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use common::{
    CRASH_SCRIPT, READY_SCRIPT, SHORT_LIVED_SCRIPT, SILENT_SCRIPT, SLOW_READY_SCRIPT,
    fake_worker, serve_stub, supervisor,
};
use higgs_core::{
    ReadinessProbe, Settings, SupervisorError, SupervisorEvent, SupervisorState, WorkerControl,
};
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_marker_makes_worker_ready() {
    let (_dir, settings) = fake_worker(READY_SCRIPT);
    let sup = supervisor(settings);

    assert_ok!(sup.start().await);
    assert_eq!(sup.state(), SupervisorState::Ready);
    assert!(sup.worker_pid().await.is_some());

    // Second start is a no-op
    assert_ok!(sup.start().await);
    assert_eq!(sup.spawned_workers(), 1);

    sup.stop().await;
}

#[tokio::test]
async fn test_relative_script_path_with_parent_dir() {
    // A directory under the crate root, referred to relatively
    let dir = tempfile::Builder::new()
        .prefix("worker-scripts")
        .tempdir_in(".")
        .unwrap();
    std::fs::write(dir.path().join("worker.sh"), READY_SCRIPT).unwrap();
    let script = PathBuf::from(dir.path().file_name().unwrap()).join("worker.sh");
    assert!(script.is_relative());

    let (_unused, settings) = fake_worker(READY_SCRIPT);
    let sup = supervisor(Settings {
        script_path: script,
        ..settings
    });

    assert_ok!(sup.start().await);
    assert_eq!(sup.state(), SupervisorState::Ready);

    sup.stop().await;
}

#[tokio::test]
async fn test_exit_before_ready_reports_code() {
    let (_dir, settings) = fake_worker(CRASH_SCRIPT);
    let sup = supervisor(settings);

    let err = assert_err!(sup.start().await);
    assert_eq!(err, SupervisorError::ProcessExit { code: Some(1) });
    assert_eq!(sup.state(), SupervisorState::NotStarted);
    assert_eq!(sup.last_error(), Some(err));
    assert!(sup.worker_pid().await.is_none());
}

#[tokio::test]
async fn test_missing_script_reports_exit_code() {
    let (_dir, mut settings) = fake_worker(READY_SCRIPT);
    settings.script_path = PathBuf::from("/definitely/not/a/worker.py");
    let sup = supervisor(settings);

    let err = assert_err!(sup.start().await);
    assert!(matches!(err, SupervisorError::ProcessExit { code: Some(c) } if c != 0));
    assert_eq!(sup.state(), SupervisorState::NotStarted);
}

#[tokio::test]
async fn test_concurrent_starts_spawn_one_worker() {
    let (_dir, settings) = fake_worker(SLOW_READY_SCRIPT);
    let sup = supervisor(settings);

    let (a, b, c) = tokio::join!(sup.start(), sup.start(), sup.start());
    assert_ok!(a);
    assert_ok!(b);
    assert_ok!(c);
    assert_eq!(sup.spawned_workers(), 1);
    assert_eq!(sup.state(), SupervisorState::Ready);

    sup.stop().await;
}

#[tokio::test]
async fn test_concurrent_starts_share_failure() {
    let (_dir, settings) = fake_worker(CRASH_SCRIPT);
    let sup = supervisor(settings);

    let (a, b) = tokio::join!(sup.start(), sup.start());
    assert_eq!(a, Err(SupervisorError::ProcessExit { code: Some(1) }));
    assert_eq!(a, b);
    assert_eq!(sup.spawned_workers(), 1);
}

#[tokio::test]
async fn test_stop_before_start_is_noop() {
    let (_dir, settings) = fake_worker(READY_SCRIPT);
    let sup = supervisor(settings);
    let mut events = sup.subscribe();

    sup.stop().await;
    sup.stop().await;

    assert_eq!(sup.state(), SupervisorState::NotStarted);
    assert_eq!(sup.spawned_workers(), 0);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_stop_terminates_ready_worker() {
    let (_dir, settings) = fake_worker(READY_SCRIPT);
    let sup = supervisor(settings);

    assert_ok!(sup.start().await);
    sup.stop().await;

    assert_eq!(sup.state(), SupervisorState::Stopped);
    assert!(sup.worker_pid().await.is_none());

    // Idempotent
    sup.stop().await;
    assert_eq!(sup.state(), SupervisorState::Stopped);

    // Restartable
    assert_ok!(sup.start().await);
    assert_eq!(sup.spawned_workers(), 2);
    sup.stop().await;
}

#[tokio::test]
async fn test_stop_during_startup_aborts_waiters() {
    let (_dir, settings) = fake_worker(SILENT_SCRIPT);
    let sup = supervisor(settings);

    let starter = {
        let sup = sup.clone();
        tokio::spawn(async move { sup.start().await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sup.state(), SupervisorState::Starting);

    sup.stop().await;
    let result = starter.await.unwrap();

    assert_eq!(result, Err(SupervisorError::Aborted));
    assert_eq!(sup.state(), SupervisorState::Stopped);
    assert!(sup.worker_pid().await.is_none());
}

#[tokio::test]
async fn test_startup_timeout_leaves_worker_tracked() {
    let (_dir, mut settings) = fake_worker(SILENT_SCRIPT);
    settings.startup_timeout_secs = 1;
    let sup = supervisor(settings);

    let err = assert_err!(sup.start().await);
    assert_eq!(err, SupervisorError::StartupTimeout { secs: 1 });
    assert_eq!(sup.state(), SupervisorState::Failed);

    // Known gap: the process is still running until stopped
    assert!(sup.worker_pid().await.is_some());

    sup.stop().await;
    assert_eq!(sup.state(), SupervisorState::Stopped);
    assert!(sup.worker_pid().await.is_none());
}

#[tokio::test]
async fn test_exit_after_ready_reverts_state() {
    let (_dir, settings) = fake_worker(SHORT_LIVED_SCRIPT);
    let sup = supervisor(settings);
    let mut events = sup.subscribe();

    assert_ok!(sup.start().await);

    let exited = timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(SupervisorEvent::WorkerExited { code }) = events.recv().await {
                return code;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(exited, Some(3));
    assert_eq!(sup.state(), SupervisorState::NotStarted);
}

#[tokio::test]
async fn test_reload_when_not_ready_only_stores_settings() {
    let (_dir, settings) = fake_worker(READY_SCRIPT);
    let sup = supervisor(settings.clone());

    let updated = Settings {
        temperature: 0.9,
        ..settings
    };
    assert_ok!(sup.reload_configuration(updated).await);

    assert_eq!(sup.spawned_workers(), 0);
    assert_eq!(sup.state(), SupervisorState::NotStarted);
    assert!((sup.settings().temperature - 0.9).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_reload_when_ready_restarts_worker() {
    let (_dir, settings) = fake_worker(READY_SCRIPT);
    let sup = supervisor(settings.clone());
    let mut events = sup.subscribe();

    assert_ok!(sup.start().await);
    let first_pid = sup.worker_pid().await;

    let updated = Settings {
        max_tokens: 512,
        ..settings
    };
    assert_ok!(sup.reload_configuration(updated).await);

    assert_eq!(sup.state(), SupervisorState::Ready);
    assert_eq!(sup.spawned_workers(), 2);
    assert_ne!(sup.worker_pid().await, first_pid);
    assert_eq!(sup.settings().max_tokens, 512);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&SupervisorEvent::Reloading));
    assert!(seen.contains(&SupervisorEvent::Stopped));

    sup.stop().await;
}

#[tokio::test]
async fn test_failure_event_is_broadcast() {
    let (_dir, settings) = fake_worker(CRASH_SCRIPT);
    let sup = supervisor(settings);
    let mut events = sup.subscribe();

    assert_err!(sup.start().await);

    let reason = timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(SupervisorEvent::StartupFailed { reason }) = events.recv().await {
                return reason;
            }
        }
    })
    .await
    .unwrap();
    assert!(reason.contains("exit code 1"));
}

#[tokio::test]
async fn test_health_probe_readiness() {
    let port = serve_stub(Router::new().route("/health", get(|| async { "ok" }))).await;
    let (_dir, mut settings) = fake_worker(SILENT_SCRIPT);
    settings.port = port;
    settings.readiness = ReadinessProbe::Health;
    let sup = supervisor(settings);

    assert_ok!(sup.start().await);
    assert_eq!(sup.state(), SupervisorState::Ready);

    sup.stop().await;
}

#[tokio::test]
async fn test_ready_worker_serves_generation() {
    use axum::Json;
    use axum::routing::post;
    use higgs_core::{AudioBackend, GenerationRequest};
    use serde_json::json;

    let stub = Router::new().route(
        "/generate",
        post(|| async {
            Json(json!({
                "success": true,
                "audioData": "QUJD",
                "text": "hello",
                "duration": 1.2,
                "samplingRate": 24000,
            }))
        }),
    );
    let port = serve_stub(stub).await;
    let (_dir, mut settings) = fake_worker(READY_SCRIPT);
    settings.port = port;
    let sup = supervisor(settings.clone());

    assert_ok!(sup.start().await);

    let request = GenerationRequest::from_settings("hello", None, &settings).unwrap();
    let response = sup.generate_audio(request).await;
    assert!(response.succeeded);
    assert!((response.duration_seconds - 1.2).abs() < f64::EPSILON);

    sup.stop().await;
}
