//! Bridge Facade
//!
//! Composition root for the pipeline. Owns the broadcast bus, the
//! last-scan store and the relay channel as explicit state, runs the
//! ingress and forward loops, and exposes the outward surface: injecting
//! notifications, attaching/detaching the live subscriber, the pull
//! interface, and the best-effort scanner commands.

use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::bus::ScanBus;
use crate::commands;
use crate::config::BridgeConfig;
use crate::event::RawNotification;
use crate::ingress::{self, IngressListener};
use crate::relay::{EventSink, RelayChannel, SubscriptionHandle};
use crate::store::LastScanStore;

pub struct ScanBridge {
    config: BridgeConfig,
    bus: Arc<ScanBus>,
    store: Arc<LastScanStore>,
    relay: Arc<RelayChannel>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ScanBridge {
    /// Build and start a bridge from configuration. The ingress and
    /// forward loops are registered and running when this returns, so no
    /// subsequently injected notification is missed. Must be called from
    /// within a tokio runtime.
    pub fn start(config: BridgeConfig) -> Self {
        let bus = Arc::new(ScanBus::new(config.bus.capacity));
        let store = Arc::new(LastScanStore::open(&config.store.path));
        let relay = Arc::new(RelayChannel::new());

        let listener = IngressListener::new(Arc::clone(&bus), Arc::clone(&store));
        let forwards = bus.subscribe_forward();
        let tasks = vec![
            tokio::spawn(listener.run()),
            tokio::spawn(ingress::run_forwarder(forwards, Arc::clone(&relay))),
        ];

        info!("Scan bridge started");
        Self {
            config,
            bus,
            store,
            relay,
            tasks: Mutex::new(tasks),
        }
    }

    /// Inject a raw notification as if delivered by the broadcast
    /// substrate.
    pub fn notify(&self, notification: RawNotification) {
        self.bus.publish(notification);
    }

    /// Attach `sink` as the live subscriber (last subscribe wins).
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) -> SubscriptionHandle {
        self.relay.subscribe(sink)
    }

    /// Detach the subscriber; stale handles are ignored.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        self.relay.unsubscribe(handle);
    }

    /// Pull interface: the last persisted scan code, empty if none.
    pub fn read_last_scan(&self) -> String {
        self.store.read()
    }

    /// Best-effort soft trigger.
    pub fn trigger_scan(&self) -> bool {
        commands::trigger_scan(&self.config.commands)
    }

    /// Best-effort launch of the vendor scanning application.
    pub fn open_scanner_app(&self) -> bool {
        commands::open_scanner_app(&self.config.commands)
    }

    /// Stop the ingress and forward loops. In-flight events may be lost;
    /// the persisted last scan is unaffected.
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        info!("Scan bridge stopped");
    }
}
