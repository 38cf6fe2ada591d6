//! Worker process supervision and HTTP client.
//!
//! `ProcessSupervisor` implements both core ports: `WorkerControl` for the
//! lifecycle of the Python worker and `AudioBackend` for the calls made to it.
//! `WorkerClient` can also be used alone against a worker started elsewhere.

#![deny(unsafe_code)]

mod broadcaster;
mod client;
mod health;
mod launch;
mod shutdown;
mod stream;
mod supervisor;

pub use broadcaster::SupervisorEventBroadcaster;
pub use client::{DEFAULT_REQUEST_TIMEOUT, WorkerClient, WorkerClientError};
pub use health::{check_http_health, wait_for_http_health};
pub use launch::{WorkerLaunchSpec, resolve_python_path};
pub use shutdown::{DEFAULT_SHUTDOWN_GRACE, Termination, terminate_worker};
pub use supervisor::{ProcessSupervisor, SupervisorConfig};
