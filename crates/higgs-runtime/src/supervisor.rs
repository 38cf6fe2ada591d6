//! Worker process supervisor.
//!
//! Owns at most one worker process. The lifecycle state lives in a `watch`
//! channel: `start()` does its check-and-set inside `send_if_modified`, so two
//! concurrent callers can never both launch. Every caller then waits on the
//! same channel for the outcome of the attempt it joined.
//!
//! The child itself is owned by a monitor task which either observes the exit
//! or is told to shut the process down.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Child;
use tokio::sync::{Mutex, broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use higgs_core::{
    AudioBackend, ClearHistoryResponse, GenerationRequest, GenerationResponse, HistoryResponse,
    READY_MARKER, ReadinessProbe, Settings, SupervisorError, SupervisorEvent, SupervisorState,
    VoiceCloneRequest, VoiceCloneResponse, VoiceListResponse, WorkerControl,
};

use crate::broadcaster::SupervisorEventBroadcaster;
use crate::client::{DEFAULT_REQUEST_TIMEOUT, WorkerClient, build_http_client};
use crate::health::wait_for_http_health;
use crate::launch::WorkerLaunchSpec;
use crate::shutdown::{DEFAULT_SHUTDOWN_GRACE, terminate_worker};
use crate::stream::{MarkerWatch, StreamKind, spawn_stream_reader};

/// Timing knobs that are not user settings.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Pause between stop and start during a reload.
    pub restart_delay: Duration,
    /// SIGTERM grace period before SIGKILL.
    pub shutdown_grace: Duration,
    /// Per-request timeout for worker API calls.
    pub request_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_delay: Duration::from_secs(1),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Phase {
    state: SupervisorState,
    /// Incremented for every launch attempt.
    attempt: u64,
    /// Result of the most recently settled attempt.
    outcome: Option<(u64, Result<(), SupervisorError>)>,
}

struct WorkerHandle {
    attempt: u64,
    pid: Option<u32>,
    kill_tx: oneshot::Sender<()>,
    monitor: JoinHandle<()>,
}

impl WorkerHandle {
    async fn shutdown(self) {
        debug!(pid = ?self.pid, "Shutting down worker");
        let _ = self.kill_tx.send(());
        if let Err(e) = self.monitor.await {
            warn!(error = %e, "Worker monitor task failed");
        }
    }
}

struct Inner {
    settings: RwLock<Settings>,
    client: RwLock<Arc<WorkerClient>>,
    http: reqwest::Client,
    phase: watch::Sender<Phase>,
    worker: Mutex<Option<WorkerHandle>>,
    events: SupervisorEventBroadcaster,
    spawned: AtomicUsize,
    config: SupervisorConfig,
}

/// Supervises the worker process and talks to it over HTTP.
///
/// Cheap to clone; clones share the same worker.
#[derive(Clone)]
pub struct ProcessSupervisor {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("state", &self.state())
            .field("base_url", &self.inner.current_client().base_url())
            .finish_non_exhaustive()
    }
}

impl ProcessSupervisor {
    pub fn new(settings: Settings) -> Result<Self, SupervisorError> {
        Self::with_config(settings, SupervisorConfig::default())
    }

    pub fn with_config(
        settings: Settings,
        config: SupervisorConfig,
    ) -> Result<Self, SupervisorError> {
        let http = build_http_client(config.request_timeout)
            .map_err(|e| SupervisorError::Client(e.to_string()))?;
        let client = WorkerClient::with_http(http.clone(), settings.worker_base_url());
        let (phase, _) = watch::channel(Phase::default());

        Ok(Self {
            inner: Arc::new(Inner {
                settings: RwLock::new(settings),
                client: RwLock::new(Arc::new(client)),
                http,
                phase,
                worker: Mutex::new(None),
                events: SupervisorEventBroadcaster::new(),
                spawned: AtomicUsize::new(0),
                config,
            }),
        })
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.inner.events.subscribe()
    }

    /// PID of the live worker, if any.
    pub async fn worker_pid(&self) -> Option<u32> {
        self.inner.worker.lock().await.as_ref().and_then(|h| h.pid)
    }

    /// Number of processes spawned over this supervisor's lifetime.
    pub fn spawned_workers(&self) -> usize {
        self.inner.spawned.load(Ordering::SeqCst)
    }

    /// Most recent startup error, if the last attempt failed.
    pub fn last_error(&self) -> Option<SupervisorError> {
        match &self.inner.phase.borrow().outcome {
            Some((_, Err(e))) => Some(e.clone()),
            _ => None,
        }
    }
}

enum Entry {
    AlreadyReady,
    Join(u64),
    Launch(u64),
}

#[async_trait]
impl WorkerControl for ProcessSupervisor {
    async fn start(&self) -> Result<(), SupervisorError> {
        let mut entry = Entry::AlreadyReady;
        self.inner.phase.send_if_modified(|p| match p.state {
            SupervisorState::Ready => false,
            SupervisorState::Starting => {
                entry = Entry::Join(p.attempt);
                false
            }
            SupervisorState::NotStarted | SupervisorState::Stopped | SupervisorState::Failed => {
                p.attempt += 1;
                p.state = SupervisorState::Starting;
                entry = Entry::Launch(p.attempt);
                true
            }
        });

        let attempt = match entry {
            Entry::AlreadyReady => return Ok(()),
            Entry::Join(attempt) => {
                debug!(attempt, "Start already in progress, waiting for it");
                attempt
            }
            Entry::Launch(attempt) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move { inner.launch(attempt).await });
                attempt
            }
        };

        self.inner.wait_outcome(attempt).await
    }

    async fn stop(&self) {
        let changed = self.inner.phase.send_if_modified(|p| match p.state {
            SupervisorState::NotStarted | SupervisorState::Stopped => false,
            SupervisorState::Starting => {
                p.state = SupervisorState::Stopped;
                p.outcome = Some((p.attempt, Err(SupervisorError::Aborted)));
                true
            }
            SupervisorState::Ready | SupervisorState::Failed => {
                p.state = SupervisorState::Stopped;
                true
            }
        });

        let reaped = self.inner.reap_worker().await;

        if changed || reaped {
            info!("Worker stopped");
            self.inner.events.broadcast(SupervisorEvent::Stopped);
        }
    }

    async fn reload_configuration(&self, settings: Settings) -> Result<(), SupervisorError> {
        self.inner.apply_settings(settings);

        if !self.state().is_ready() {
            debug!("Worker not ready; new settings apply on next start");
            return Ok(());
        }

        info!("Restarting worker with new settings");
        self.inner.events.broadcast(SupervisorEvent::Reloading);
        self.stop().await;
        sleep(self.inner.config.restart_delay).await;
        self.start().await
    }

    fn state(&self) -> SupervisorState {
        self.inner.phase.borrow().state
    }

    fn settings(&self) -> Settings {
        self.inner.settings()
    }
}

#[async_trait]
impl AudioBackend for ProcessSupervisor {
    async fn generate_audio(&self, request: GenerationRequest) -> GenerationResponse {
        self.inner.current_client().generate_audio(request).await
    }

    async fn clone_voice(&self, request: VoiceCloneRequest) -> VoiceCloneResponse {
        AudioBackend::clone_voice(self.inner.current_client().as_ref(), request).await
    }

    async fn list_voices(&self) -> VoiceListResponse {
        self.inner.current_client().list_voices().await
    }

    async fn get_history(&self) -> HistoryResponse {
        self.inner.current_client().get_history().await
    }

    async fn clear_history(&self) -> ClearHistoryResponse {
        AudioBackend::clear_history(self.inner.current_client().as_ref()).await
    }
}

impl Inner {
    fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn current_client(&self) -> Arc<WorkerClient> {
        Arc::clone(&self.client.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn apply_settings(&self, settings: Settings) {
        let client = WorkerClient::with_http(self.http.clone(), settings.worker_base_url());
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(client);
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    async fn wait_outcome(&self, attempt: u64) -> Result<(), SupervisorError> {
        let mut rx = self.phase.subscribe();
        let settled = rx
            .wait_for(|p| {
                p.attempt > attempt || matches!(&p.outcome, Some((a, _)) if *a == attempt)
            })
            .await;

        match settled {
            Ok(p) => match &p.outcome {
                Some((a, result)) if *a == attempt => result.clone(),
                _ => Err(SupervisorError::Aborted),
            },
            Err(_) => Err(SupervisorError::Aborted),
        }
    }

    /// Settle `attempt` if it is still the one starting. Returns whether it applied.
    fn finish(
        &self,
        attempt: u64,
        result: Result<(), SupervisorError>,
        state: SupervisorState,
    ) -> bool {
        self.phase.send_if_modified(|p| {
            if p.attempt != attempt || p.state != SupervisorState::Starting {
                return false;
            }
            p.state = state;
            p.outcome = Some((attempt, result));
            true
        })
    }

    fn fail(&self, attempt: u64, error: SupervisorError, state: SupervisorState) {
        if self.finish(attempt, Err(error.clone()), state) {
            error!(attempt, "Worker startup failed: {}", error);
            self.events
                .broadcast(SupervisorEvent::startup_failed(&error));
        }
    }

    /// Shut down the tracked worker, if any. Returns whether one existed.
    async fn reap_worker(&self) -> bool {
        let handle = self.worker.lock().await.take();
        match handle {
            Some(handle) => {
                handle.shutdown().await;
                true
            }
            None => false,
        }
    }

    async fn launch(self: &Arc<Self>, attempt: u64) {
        // A worker left behind by a timed-out attempt is reaped first
        if self.reap_worker().await {
            debug!("Reaped worker from previous attempt");
        }

        let settings = self.settings();
        let spec = WorkerLaunchSpec::from_settings(&settings);
        info!(
            program = %spec.program.display(),
            script = %settings.script_path.display(),
            port = settings.port,
            "Launching worker"
        );

        let mut child = match spec.command().spawn() {
            Ok(child) => child,
            Err(e) => {
                let error =
                    SupervisorError::Spawn(format!("{}: {e}", spec.program.display()));
                self.fail(attempt, error, SupervisorState::NotStarted);
                return;
            }
        };
        self.spawned.fetch_add(1, Ordering::SeqCst);
        let pid = child.id();

        let (marker_tx, marker_rx) = oneshot::channel();
        let marker = (settings.readiness == ReadinessProbe::Marker).then_some(MarkerWatch {
            needle: READY_MARKER,
            found: marker_tx,
        });
        if let Some(stdout) = child.stdout.take() {
            spawn_stream_reader(stdout, StreamKind::Stdout, marker);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(stderr, StreamKind::Stderr, None);
        }

        let (kill_tx, kill_rx) = oneshot::channel();
        let monitor = spawn_monitor(
            Arc::downgrade(self),
            attempt,
            child,
            kill_rx,
            self.config.shutdown_grace,
        );
        let handle = WorkerHandle {
            attempt,
            pid,
            kill_tx,
            monitor,
        };

        {
            let mut guard = self.worker.lock().await;
            let current = {
                let p = self.phase.borrow();
                p.attempt == attempt && p.state == SupervisorState::Starting
            };
            if !current {
                drop(guard);
                debug!(attempt, "Start was cancelled while spawning");
                handle.shutdown().await;
                return;
            }
            *guard = Some(handle);
        }

        self.events.broadcast(SupervisorEvent::Starting {
            port: settings.port,
            pid,
        });

        let port = settings.port;
        let readiness = async {
            match settings.readiness {
                ReadinessProbe::Marker => {
                    // Closed without the marker: the exit path settles the attempt
                    if marker_rx.await.is_err() {
                        std::future::pending::<()>().await;
                    }
                    Ok(())
                }
                ReadinessProbe::Health => wait_for_http_health(port).await,
            }
        };

        let mut rx = self.phase.subscribe();
        let settled_elsewhere = rx.wait_for(|p| {
            p.attempt != attempt || matches!(&p.outcome, Some((a, _)) if *a == attempt)
        });

        let timeout_secs = settings.startup_timeout_secs;
        tokio::select! {
            result = readiness => match result {
                Ok(()) => {
                    if self.finish(attempt, Ok(()), SupervisorState::Ready) {
                        info!(port, pid = ?pid, "Worker ready");
                        self.events.broadcast(SupervisorEvent::Ready { port });
                    }
                }
                Err(e) => self.fail(attempt, e, SupervisorState::Failed),
            },
            () = sleep(Duration::from_secs(timeout_secs)) => {
                warn!(pid = ?pid, "Worker did not become ready; process left running");
                self.fail(
                    attempt,
                    SupervisorError::StartupTimeout { secs: timeout_secs },
                    SupervisorState::Failed,
                );
            }
            _ = settled_elsewhere => {
                debug!(attempt, "Start attempt settled by exit or stop");
            }
        }
    }

    async fn on_worker_exit(&self, attempt: u64, code: Option<i32>) {
        {
            let mut guard = self.worker.lock().await;
            if guard.as_ref().is_some_and(|h| h.attempt == attempt) {
                guard.take();
            }
        }

        if self.finish(
            attempt,
            Err(SupervisorError::ProcessExit { code }),
            SupervisorState::NotStarted,
        ) {
            let error = SupervisorError::ProcessExit { code };
            error!(attempt, "Worker startup failed: {}", error);
            self.events
                .broadcast(SupervisorEvent::startup_failed(&error));
            return;
        }

        let exited = self.phase.send_if_modified(|p| {
            if p.attempt == attempt && p.state == SupervisorState::Ready {
                p.state = SupervisorState::NotStarted;
                true
            } else {
                false
            }
        });
        if exited {
            warn!(code = ?code, "Worker exited");
            self.events.broadcast(SupervisorEvent::WorkerExited { code });
        }
    }
}

enum MonitorExit {
    Exited(Option<i32>),
    Kill,
}

fn spawn_monitor(
    inner: Weak<Inner>,
    attempt: u64,
    mut child: Child,
    kill_rx: oneshot::Receiver<()>,
    grace: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // A dropped sender also means shut down
        let exit = tokio::select! {
            status = child.wait() => MonitorExit::Exited(match status {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(error = %e, "Failed to wait for worker");
                    None
                }
            }),
            _ = kill_rx => MonitorExit::Kill,
        };

        match exit {
            MonitorExit::Exited(code) => {
                debug!(code = ?code, "Worker process exited");
                if let Some(inner) = inner.upgrade() {
                    inner.on_worker_exit(attempt, code).await;
                }
            }
            MonitorExit::Kill => match terminate_worker(child, grace).await {
                Ok(ended) => debug!(status = %ended.status, forced = ended.forced, "Worker terminated"),
                Err(e) => warn!(error = %e, "Failed to terminate worker"),
            },
        }
    })
}
