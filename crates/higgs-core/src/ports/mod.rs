//! Port definitions (trait abstractions) for the companion.
//!
//! Ports define the interfaces the core expects from adapters. The process
//! supervisor in `higgs-runtime` implements `AudioBackend` and `WorkerControl`;
//! hosts implement `NotificationSink`.
//!
//! # Design Rules
//!
//! - No process or HTTP types in any signature
//! - `AudioBackend` methods are infallible: transport failures are folded into
//!   response values by the adapter

mod audio_backend;
mod notification;
mod worker_control;

pub use audio_backend::AudioBackend;
#[cfg(test)]
pub use audio_backend::MockAudioBackend;
pub use notification::{NoopNotifier, Notification, NotificationLevel, NotificationSink};
pub use worker_control::{SupervisorError, WorkerControl};
