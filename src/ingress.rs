//! Ingress Listener
//!
//! Receives raw notification bags from the broadcast substrate and drives
//! the core pipeline: normalize, cache the decoded code, re-publish the
//! canonical event on the internal forward action. A separate forward
//! loop picks events off that action and pushes them into the relay
//! channel, keeping "reacting to hardware" decoupled from "talking to the
//! subscriber". Unrecognized notifications are dropped silently: no store
//! write, no forward publish.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::bus::{ScanBus, FORWARD_ACTION, SCAN_ACTION};
use crate::event::{RawNotification, ScanEvent};
use crate::normalizer;
use crate::relay::RelayChannel;
use crate::store::LastScanStore;

/// The sole write path into the store and the sole origin of forwarded
/// events. Registers on the inbound action at construction time, so
/// nothing published after `new` returns is missed.
pub struct IngressListener {
    bus: Arc<ScanBus>,
    store: Arc<LastScanStore>,
    inbound: broadcast::Receiver<RawNotification>,
}

impl IngressListener {
    pub fn new(bus: Arc<ScanBus>, store: Arc<LastScanStore>) -> Self {
        let inbound = bus.subscribe();
        Self {
            bus,
            store,
            inbound,
        }
    }

    /// Process one raw notification. Returns whether it was recognized.
    /// Safe to call concurrently; the store and bus serialize their own
    /// state transitions.
    pub fn handle(&self, notification: &RawNotification) -> bool {
        match normalizer::normalize(notification) {
            Some(event) => {
                self.store.write(&event.code);
                let listeners = self.bus.publish_forward(event);
                debug!("Forwarded scan event to {} listener(s)", listeners);
                true
            }
            None => {
                debug!("Dropped unrecognized notification");
                false
            }
        }
    }

    /// Consume the inbound action until the bus closes.
    pub async fn run(mut self) {
        info!("Ingress listener attached to {}", SCAN_ACTION);
        loop {
            match self.inbound.recv().await {
                Ok(notification) => {
                    self.handle(&notification);
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Ingress listener lagged, {} notification(s) lost", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!("Ingress listener stopped");
    }
}

/// Pump canonical events from the forward action into the relay channel,
/// preserving all five fields end to end.
pub async fn run_forwarder(mut forwards: broadcast::Receiver<ScanEvent>, relay: Arc<RelayChannel>) {
    info!("Forward listener attached to {}", FORWARD_ACTION);
    loop {
        match forwards.recv().await {
            Ok(event) => relay.push(event).await,
            Err(RecvError::Lagged(missed)) => {
                warn!("Forward listener lagged, {} event(s) lost", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }
    info!("Forward listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listener_in(dir: &TempDir) -> (Arc<ScanBus>, Arc<LastScanStore>, IngressListener) {
        let bus = Arc::new(ScanBus::default());
        let store = Arc::new(LastScanStore::open(dir.path().join("last_scan.json")));
        let listener = IngressListener::new(Arc::clone(&bus), Arc::clone(&store));
        (bus, store, listener)
    }

    #[tokio::test]
    async fn test_recognized_notification_writes_store_and_forwards() {
        let dir = TempDir::new().unwrap();
        let (bus, store, listener) = listener_in(&dir);
        let mut forwards = bus.subscribe_forward();

        let bag = RawNotification::new().with_text("barcode", "12345");
        assert!(listener.handle(&bag));

        assert_eq!(store.read(), "12345");
        let event = forwards.recv().await.unwrap();
        assert_eq!(event.code, "12345");
        assert_eq!(event.length, 5);
        assert_eq!(event.barcode_type, "");
        assert_eq!(event.aim_id, "");
    }

    #[tokio::test]
    async fn test_unrecognized_notification_has_no_effect() {
        let dir = TempDir::new().unwrap();
        let (bus, store, listener) = listener_in(&dir);
        let mut forwards = bus.subscribe_forward();

        assert!(!listener.handle(&RawNotification::new()));

        assert_eq!(store.read(), "");
        assert!(matches!(
            forwards.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_run_consumes_published_notifications() {
        let dir = TempDir::new().unwrap();
        let (bus, store, listener) = listener_in(&dir);
        let mut forwards = bus.subscribe_forward();

        let task = tokio::spawn(listener.run());
        bus.publish(
            RawNotification::new()
                .with_text(normalizer::DATAWEDGE_DATA, "ABC")
                .with_text(normalizer::DATAWEDGE_LABEL_TYPE, "CODE128"),
        );

        let event = forwards.recv().await.unwrap();
        assert_eq!(event.code, "ABC");
        assert_eq!(event.barcode_type, "CODE128");
        assert_eq!(store.read(), "ABC");
        task.abort();
    }

    #[tokio::test]
    async fn test_forwarder_pushes_into_relay() {
        use crate::relay::{EventSink, RelayResult};
        use async_trait::async_trait;
        use tokio::sync::Mutex as AsyncMutex;

        struct Collector(Arc<AsyncMutex<Vec<String>>>);

        #[async_trait]
        impl EventSink for Collector {
            async fn deliver(&self, event: ScanEvent) -> RelayResult<()> {
                self.0.lock().await.push(event.code);
                Ok(())
            }
        }

        let bus = Arc::new(ScanBus::default());
        let relay = Arc::new(RelayChannel::new());
        let codes = Arc::new(AsyncMutex::new(Vec::new()));
        relay.subscribe(Arc::new(Collector(Arc::clone(&codes))));

        let forwards = bus.subscribe_forward();
        let task = tokio::spawn(run_forwarder(forwards, Arc::clone(&relay)));

        bus.publish_forward(ScanEvent::new(
            "XY".to_string(),
            2,
            String::new(),
            String::new(),
        ));

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(codes.lock().await.clone(), vec!["XY".to_string()]);
        task.abort();
    }
}
