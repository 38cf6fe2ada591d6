//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Process supervisor and worker client (via higgs-runtime)
//! - Chat session (via higgs-core)
//! - Console notifications for supervisor events
//!
//! Command handlers receive the composed `CliContext`.

use std::sync::Arc;

use anyhow::Result;
use higgs_core::{
    AudioBackend, ChatSession, NotificationSink, Settings, SupervisorEvent, WorkerControl,
};
use higgs_runtime::ProcessSupervisor;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::presentation::ConsoleNotifier;

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub supervisor: ProcessSupervisor,
    pub session: Arc<ChatSession>,
    pub notifier: Arc<dyn NotificationSink>,
    events_task: JoinHandle<()>,
}

impl CliContext {
    /// Worker lifecycle control.
    pub fn control(&self) -> &dyn WorkerControl {
        &self.supervisor
    }

    /// Worker API calls.
    pub fn backend(&self) -> &dyn AudioBackend {
        &self.supervisor
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Apply settings to the supervisor (restarting a ready worker) and the session.
    pub async fn apply_settings(&self, settings: Settings) -> Result<()> {
        self.session.update_settings(settings.clone());
        self.supervisor.reload_configuration(settings).await?;
        Ok(())
    }

    /// Stop the worker and the event forwarder.
    pub async fn shutdown(self) {
        self.supervisor.stop().await;
        self.events_task.abort();
    }
}

/// Bootstrap the CLI application.
pub fn bootstrap(settings: Settings) -> Result<CliContext> {
    bootstrap_with(settings, Arc::new(ConsoleNotifier))
}

/// Bootstrap with a custom notification sink.
pub fn bootstrap_with(
    settings: Settings,
    notifier: Arc<dyn NotificationSink>,
) -> Result<CliContext> {
    let supervisor = ProcessSupervisor::new(settings.clone())?;
    let backend: Arc<dyn AudioBackend> = Arc::new(supervisor.clone());
    let session = Arc::new(ChatSession::new(backend, Arc::clone(&notifier), settings));

    let events_task = forward_events(supervisor.subscribe(), Arc::clone(&notifier));

    Ok(CliContext {
        supervisor,
        session,
        notifier,
        events_task,
    })
}

/// Turn supervisor events into one-shot notifications.
pub fn forward_events(
    mut events: broadcast::Receiver<SupervisorEvent>,
    notifier: Arc<dyn NotificationSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(notification) = event.notification() {
                        notifier.notify(notification);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Notification forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use higgs_core::{Notification, NotificationLevel};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notification>>);

    impl NotificationSink for Recorder {
        fn notify(&self, notification: Notification) {
            self.0.lock().unwrap().push(notification);
        }
    }

    #[tokio::test]
    async fn test_forward_events_only_notifies_user_facing_events() {
        let (tx, rx) = broadcast::channel(8);
        let recorder = Arc::new(Recorder::default());
        let task = forward_events(rx, recorder.clone());

        tx.send(SupervisorEvent::Starting { port: 8765, pid: Some(1) }).unwrap();
        tx.send(SupervisorEvent::WorkerExited { code: Some(1) }).unwrap();
        tx.send(SupervisorEvent::Stopped).unwrap();
        drop(tx);
        task.await.unwrap();

        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, NotificationLevel::Warning);
    }

    #[tokio::test]
    async fn test_bootstrap_starts_idle() {
        let ctx = bootstrap_with(Settings::default(), Arc::new(higgs_core::NoopNotifier)).unwrap();
        assert!(ctx.session().is_empty());
        assert!(!ctx.control().state().is_ready());
        ctx.shutdown().await;
    }
}
