//! Supervisor event broadcasting.
//!
//! Each supervisor owns one broadcaster; front ends subscribe to turn
//! lifecycle changes into notifications.

use higgs_core::SupervisorEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for supervisor events
const CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for worker lifecycle events
#[derive(Debug)]
pub struct SupervisorEventBroadcaster {
    sender: broadcast::Sender<SupervisorEvent>,
}

impl SupervisorEventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast(&self, event: SupervisorEvent) {
        // Only log if there are receivers
        if self.sender.receiver_count() > 0 {
            debug!(?event, "Broadcasting supervisor event");
            let _ = self.sender.send(event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SupervisorEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let broadcaster = SupervisorEventBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.broadcast(SupervisorEvent::Reloading);
        broadcaster.broadcast(SupervisorEvent::Stopped);

        assert_eq!(rx.recv().await.unwrap(), SupervisorEvent::Reloading);
        assert_eq!(rx.recv().await.unwrap(), SupervisorEvent::Stopped);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let broadcaster = SupervisorEventBroadcaster::default();
        broadcaster.broadcast(SupervisorEvent::Stopped);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
