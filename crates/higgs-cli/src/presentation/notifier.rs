//! Console notification sink.

use higgs_core::{Notification, NotificationLevel, NotificationSink};

/// Prints notifications to stderr so they never mix with piped output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

pub fn format_notification(notification: &Notification) -> String {
    let marker = match notification.level {
        NotificationLevel::Info => "✓",
        NotificationLevel::Warning => "⚠️ ",
        NotificationLevel::Error => "✗",
    };
    format!("{marker} {}", notification.message)
}

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{}", format_notification(&notification));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_by_level() {
        assert_eq!(
            format_notification(&Notification::info("Voice cloned: narrator")),
            "✓ Voice cloned: narrator"
        );
        assert!(format_notification(&Notification::error("boom")).starts_with('✗'));
    }
}
