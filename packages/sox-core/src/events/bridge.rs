//! Bridge implementation that maps device events onto a broadcast channel.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::emitter::EventEmitter;
use super::DeviceEvent;

/// Bridges device events to a `tokio::sync::broadcast` channel.
///
/// Subscribers (a CLI watch loop, a UI, a test) each get their own receiver.
/// An optional external emitter receives every event as well.
#[derive(Clone)]
pub struct BroadcastEventBridge {
    tx: broadcast::Sender<DeviceEvent>,
    /// Optional external emitter for host-specific delivery
    external_emitter: Arc<RwLock<Option<Arc<dyn EventEmitter>>>>,
}

impl BroadcastEventBridge {
    /// Creates a new bridge with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            external_emitter: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets an external emitter that also receives every event.
    pub fn set_external_emitter(&self, emitter: Arc<dyn EventEmitter>) {
        *self.external_emitter.write() = Some(emitter);
    }

    /// Returns a new receiver for the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.tx.subscribe()
    }
}

impl EventEmitter for BroadcastEventBridge {
    fn emit_device(&self, event: DeviceEvent) {
        if let Some(ref emitter) = *self.external_emitter.read() {
            emitter.emit_device(event.clone());
        }
        if let Err(e) = self.tx.send(event) {
            log::trace!("[EventBridge] No broadcast receivers: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl EventEmitter for Counter {
        fn emit_device(&self, _event: DeviceEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn event() -> DeviceEvent {
        DeviceEvent::ConnectivityChanged {
            device_id: "h:7777".into(),
            connected: false,
            timestamp: 42,
        }
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bridge = BroadcastEventBridge::new(8);
        let mut rx = bridge.subscribe();

        bridge.emit_device(event());

        assert_eq!(rx.recv().await.unwrap(), event());
    }

    #[test]
    fn emitting_without_subscribers_is_harmless() {
        let bridge = BroadcastEventBridge::new(8);
        bridge.emit_device(event());
    }

    #[test]
    fn external_emitter_is_forwarded() {
        let bridge = BroadcastEventBridge::new(8);
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        bridge.set_external_emitter(counter.clone());

        bridge.emit_device(event());
        bridge.emit_device(event());

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}
