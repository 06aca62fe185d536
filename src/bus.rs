//! Broadcast Transport Boundaries
//!
//! Two in-process multicast channels stand in for the opaque delivery
//! substrates: the inbound action carrying vendor notification bags, and
//! the internal forward action carrying canonical events from ingress to
//! the relay side. Delivery on both is at-most-once: publishing with no
//! listener drops the message, and a lagging listener loses what it
//! missed. Deregistration is dropping the receiver, so deregistering
//! twice is inherently a no-op.

use log::{debug, trace};
use tokio::sync::broadcast;

use crate::event::{RawNotification, ScanEvent};

/// Logical action name for inbound scanner notifications.
pub const SCAN_ACTION: &str = "scanbridge.SCAN";
/// Logical action name for the internal ingress→relay forward hop.
pub const FORWARD_ACTION: &str = "scanbridge.SCAN_FORWARD";

/// Default per-channel buffer depth.
pub const DEFAULT_CAPACITY: usize = 64;

/// The bridge's two message-passing boundaries.
pub struct ScanBus {
    notifications: broadcast::Sender<RawNotification>,
    forwards: broadcast::Sender<ScanEvent>,
}

impl ScanBus {
    pub fn new(capacity: usize) -> Self {
        let (notifications, _) = broadcast::channel(capacity.max(1));
        let (forwards, _) = broadcast::channel(capacity.max(1));
        Self {
            notifications,
            forwards,
        }
    }

    /// Publish a raw notification on the inbound action. Returns the
    /// number of listeners reached; zero means the message was dropped.
    pub fn publish(&self, notification: RawNotification) -> usize {
        match self.notifications.send(notification) {
            Ok(listeners) => listeners,
            Err(_) => {
                trace!("No listeners on {}, notification dropped", SCAN_ACTION);
                0
            }
        }
    }

    /// Register a listener on the inbound action.
    pub fn subscribe(&self) -> broadcast::Receiver<RawNotification> {
        debug!("Listener registered on {}", SCAN_ACTION);
        self.notifications.subscribe()
    }

    /// Re-publish a canonical event on the internal forward action.
    pub fn publish_forward(&self, event: ScanEvent) -> usize {
        match self.forwards.send(event) {
            Ok(listeners) => listeners,
            Err(_) => {
                trace!("No listeners on {}, event dropped", FORWARD_ACTION);
                0
            }
        }
    }

    /// Register a listener on the internal forward action.
    pub fn subscribe_forward(&self) -> broadcast::Receiver<ScanEvent> {
        debug!("Listener registered on {}", FORWARD_ACTION);
        self.forwards.subscribe()
    }
}

impl Default for ScanBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_listeners_drops() {
        let bus = ScanBus::default();
        assert_eq!(bus.publish(RawNotification::new()), 0);
        let event = ScanEvent::new("1".to_string(), 1, String::new(), String::new());
        assert_eq!(bus.publish_forward(event), 0);
    }

    #[tokio::test]
    async fn test_notification_reaches_listener() {
        let bus = ScanBus::default();
        let mut rx = bus.subscribe();

        let bag = RawNotification::new().with_text("barcode", "12345");
        assert_eq!(bus.publish(bag.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), bag);
    }

    #[tokio::test]
    async fn test_forward_fields_survive_the_hop() {
        let bus = ScanBus::default();
        let mut rx = bus.subscribe_forward();

        let event = ScanEvent::new(
            "ABC".to_string(),
            3,
            "CODE128".to_string(),
            "]C0".to_string(),
        );
        bus.publish_forward(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_dropped_listener_deregisters() {
        let bus = ScanBus::default();
        let rx = bus.subscribe();
        drop(rx);
        // Dropping again is impossible by construction; publishing simply
        // reverts to the no-listener path.
        assert_eq!(bus.publish(RawNotification::new()), 0);
    }
}
