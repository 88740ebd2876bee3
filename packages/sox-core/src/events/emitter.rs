//! Event emitter abstraction for decoupling the tracker from transport.
//!
//! Devices depend on the [`EventEmitter`] trait rather than concrete broadcast
//! channels, enabling testing and alternative delivery mechanisms.

use super::DeviceEvent;

/// Trait for emitting device events without knowledge of transport.
///
/// # Example
///
/// ```ignore
/// struct MyHost {
///     emitter: Arc<dyn EventEmitter>,
/// }
///
/// impl MyHost {
///     fn on_change(&self) {
///         self.emitter.emit_device(DeviceEvent::MuteChanged { ... });
///     }
/// }
/// ```
pub trait EventEmitter: Send + Sync {
    /// Emits a device state-change event.
    fn emit_device(&self, event: DeviceEvent);
}

/// No-op emitter for hosts that only read state on their own cadence.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_device(&self, _event: DeviceEvent) {}
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level with the `[Event]` tag.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_device(&self, event: DeviceEvent) {
        log::debug!("[Event] {} {:?}", event.device_id(), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Test emitter that counts events.
    struct CountingEventEmitter {
        count: AtomicUsize,
    }

    impl EventEmitter for CountingEventEmitter {
        fn emit_device(&self, _event: DeviceEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counting_emitter_tracks_events() {
        let emitter = Arc::new(CountingEventEmitter {
            count: AtomicUsize::new(0),
        });
        let as_trait: Arc<dyn EventEmitter> = emitter.clone();

        as_trait.emit_device(DeviceEvent::MuteChanged {
            device_id: "x".into(),
            muted: true,
            timestamp: 0,
        });
        NoopEventEmitter.emit_device(DeviceEvent::MuteChanged {
            device_id: "x".into(),
            muted: true,
            timestamp: 0,
        });
        LoggingEventEmitter.emit_device(DeviceEvent::MuteChanged {
            device_id: "x".into(),
            muted: false,
            timestamp: 0,
        });

        assert_eq!(emitter.count.load(Ordering::SeqCst), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Log Capture
    // ─────────────────────────────────────────────────────────────────────────

    /// Process-wide logger that keeps every formatted record.
    struct CapturingLogger {
        records: Mutex<Vec<String>>,
    }

    impl log::Log for CapturingLogger {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            if let Ok(mut records) = self.records.lock() {
                records.push(format!("{} {}", record.level(), record.args()));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CapturingLogger = CapturingLogger {
        records: Mutex::new(Vec::new()),
    };

    fn install_logger() {
        // Another test may have installed it already.
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
    }

    #[test]
    fn logging_emitter_writes_log_records() {
        install_logger();

        LoggingEventEmitter.emit_device(DeviceEvent::MuteChanged {
            device_id: "logged.local:7777".into(),
            muted: true,
            timestamp: 0,
        });

        let records = LOGGER.records.lock().unwrap();
        let line = records
            .iter()
            .find(|r| r.contains("logged.local:7777"))
            .expect("event was not logged");
        assert!(line.starts_with("DEBUG [Event]"), "{line}");
        assert!(line.contains("MuteChanged"), "{line}");
    }
}
