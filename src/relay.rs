//! Single-Subscriber Relay Channel
//!
//! Push delivery from the ingress pipeline to at most one live listener.
//! Subscribing replaces any previous subscriber without notifying it;
//! unsubscribing with a stale handle is a no-op; pushing with nobody
//! attached drops the event. There is no buffering and no replay: a
//! subscriber that attaches after a push catches up through the
//! last-event store instead.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::event::ScanEvent;

/// Result type for sink delivery.
pub type RelayResult<T> = Result<T, RelayError>;

/// Errors a sink may report while handling an event. The relay logs and
/// swallows them; they never propagate to the producer side.
#[derive(Debug, Error, Clone)]
pub enum RelayError {
    #[error("Event delivery failed: {reason}")]
    DeliveryFailed { reason: String },
}

impl RelayError {
    pub fn delivery_failed(reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            reason: reason.into(),
        }
    }
}

/// Push target for canonical scan events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Handle one relayed event.
    async fn deliver(&self, event: ScanEvent) -> RelayResult<()>;
}

/// Token identifying one subscription. Becomes stale once its subscriber
/// is displaced or detached; operations with a stale handle are no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: Uuid,
}

struct ActiveSubscriber {
    id: Uuid,
    sink: Arc<dyn EventSink>,
}

/// Relay channel with a single subscriber slot.
///
/// The slot is the only shared mutable state; read-modify-write sequences
/// on it are serialized through the mutex, and the lock is never held
/// across a delivery await so detachment stays safe concurrently with an
/// in-flight push.
pub struct RelayChannel {
    active: Mutex<Option<ActiveSubscriber>>,
}

impl RelayChannel {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    /// Attach `sink` as the sole subscriber, displacing any prior one.
    /// The displaced subscriber is not notified.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) -> SubscriptionHandle {
        let id = Uuid::new_v4();
        let previous = self.active.lock().replace(ActiveSubscriber { id, sink });
        match previous {
            Some(old) => debug!("Subscriber {} displaced by {}", old.id, id),
            None => debug!("Subscriber {} attached", id),
        }
        SubscriptionHandle { id }
    }

    /// Detach the subscriber identified by `handle`. Stale handles
    /// (already displaced or already detached) are ignored.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let mut active = self.active.lock();
        match active.as_ref() {
            Some(current) if current.id == handle.id => {
                *active = None;
                debug!("Subscriber {} detached", handle.id);
            }
            _ => debug!("Ignoring unsubscribe for stale handle {}", handle.id),
        }
    }

    /// Deliver `event` to the active subscriber, or drop it when detached.
    ///
    /// Delivery runs against the sink that was active when the call
    /// started; a concurrent unsubscribe does not interrupt it. Sink
    /// failures are logged and swallowed.
    pub async fn push(&self, event: ScanEvent) {
        let target = self
            .active
            .lock()
            .as_ref()
            .map(|subscriber| (subscriber.id, Arc::clone(&subscriber.sink)));

        match target {
            Some((id, sink)) => {
                if let Err(e) = sink.deliver(event).await {
                    warn!("Subscriber {} failed to process event: {}", id, e);
                }
            }
            None => debug!("No active subscriber, dropping event"),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.active.lock().is_some()
    }
}

impl Default for RelayChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex as AsyncMutex;

    struct CollectingSink {
        received: Arc<AsyncMutex<Vec<ScanEvent>>>,
        fail: bool,
    }

    impl CollectingSink {
        fn new() -> Self {
            Self {
                received: Arc::new(AsyncMutex::new(Vec::new())),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                received: Arc::new(AsyncMutex::new(Vec::new())),
                fail: true,
            }
        }

        async fn collected(&self) -> Vec<ScanEvent> {
            self.received.lock().await.clone()
        }
    }

    #[async_trait]
    impl EventSink for CollectingSink {
        async fn deliver(&self, event: ScanEvent) -> RelayResult<()> {
            if self.fail {
                return Err(RelayError::delivery_failed("collector refused event"));
            }
            self.received.lock().await.push(event);
            Ok(())
        }
    }

    fn sample_event(code: &str) -> ScanEvent {
        ScanEvent::new(code.to_string(), code.len(), String::new(), String::new())
    }

    #[tokio::test]
    async fn test_push_without_subscriber_is_dropped() {
        let relay = RelayChannel::new();
        assert!(!relay.is_attached());
        relay.push(sample_event("123")).await;
    }

    #[tokio::test]
    async fn test_push_reaches_active_subscriber() {
        let relay = RelayChannel::new();
        let sink = Arc::new(CollectingSink::new());
        relay.subscribe(sink.clone());

        relay.push(sample_event("123")).await;
        relay.push(sample_event("456")).await;

        let received = sink.collected().await;
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].code, "123");
        assert_eq!(received[1].code, "456");
    }

    #[tokio::test]
    async fn test_second_subscribe_displaces_first() {
        let relay = RelayChannel::new();
        let first = Arc::new(CollectingSink::new());
        let second = Arc::new(CollectingSink::new());

        relay.subscribe(first.clone());
        relay.subscribe(second.clone());
        relay.push(sample_event("123")).await;

        assert!(first.collected().await.is_empty());
        assert_eq!(second.collected().await.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_unsubscribe_is_a_no_op() {
        let relay = RelayChannel::new();
        let first = Arc::new(CollectingSink::new());
        let second = Arc::new(CollectingSink::new());

        let stale = relay.subscribe(first);
        relay.subscribe(second.clone());

        relay.unsubscribe(&stale);
        assert!(relay.is_attached());

        relay.push(sample_event("123")).await;
        assert_eq!(second.collected().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let relay = RelayChannel::new();
        let sink = Arc::new(CollectingSink::new());

        let handle = relay.subscribe(sink.clone());
        relay.unsubscribe(&handle);
        assert!(!relay.is_attached());

        relay.push(sample_event("123")).await;
        assert!(sink.collected().await.is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_twice_is_harmless() {
        let relay = RelayChannel::new();
        let handle = relay.subscribe(Arc::new(CollectingSink::new()));
        relay.unsubscribe(&handle);
        relay.unsubscribe(&handle);
        assert!(!relay.is_attached());
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let relay = RelayChannel::new();
        relay.subscribe(Arc::new(CollectingSink::failing()));
        // Must not panic or propagate.
        relay.push(sample_event("123")).await;
        assert!(relay.is_attached());
    }

    #[tokio::test]
    async fn test_resubscribe_after_detach() {
        let relay = RelayChannel::new();
        let first = relay.subscribe(Arc::new(CollectingSink::new()));
        relay.unsubscribe(&first);

        let sink = Arc::new(CollectingSink::new());
        relay.subscribe(sink.clone());
        relay.push(sample_event("789")).await;
        assert_eq!(sink.collected().await.len(), 1);
    }
}
