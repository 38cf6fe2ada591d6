//! Shared CLI presentation utilities.
//!
//! Format-only: domain transforms belong in `higgs-core` services.

pub mod notifier;
pub mod sidebar;
pub mod transcript;

pub use notifier::ConsoleNotifier;
pub use sidebar::format_sidebar;
pub use transcript::{format_history, print_transcript, truncate_string};
