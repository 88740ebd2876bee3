//! Registry of configured devices with indexed lookups.
//!
//! Devices are keyed by unique id. Inserting a device whose id is already
//! present replaces it, which is how a reconfigured device is swapped in.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;

use crate::device::SoxDevice;
use crate::events::EventEmitter;
use crate::sox::SoxTransport;
use crate::state::Config;

/// Concurrent map of devices by unique id.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: DashMap<String, Arc<SoxDevice>>,
}

impl DeviceRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry holding one device per configured entry.
    ///
    /// All devices share the transport and emitter. The config is expected to
    /// have been validated; a duplicate id keeps the last entry.
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn SoxTransport>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        let registry = Self::new();
        for device_config in &config.devices {
            registry.insert(Arc::new(SoxDevice::new(
                device_config,
                Arc::clone(&transport),
                Arc::clone(&emitter),
            )));
        }
        registry
    }

    /// Inserts a device, returning the one it replaced.
    pub fn insert(&self, device: Arc<SoxDevice>) -> Option<Arc<SoxDevice>> {
        let id = device.unique_id().to_string();
        let previous = self.devices.insert(id.clone(), device);
        if previous.is_some() {
            log::info!("[Registry] Replaced device {}", id);
        } else {
            log::info!("[Registry] Added device {}", id);
        }
        previous
    }

    /// Looks up a device by unique id.
    pub fn get(&self, unique_id: &str) -> Option<Arc<SoxDevice>> {
        self.devices.get(unique_id).map(|d| Arc::clone(d.value()))
    }

    /// Looks up a device by display name (case-insensitive).
    pub fn get_by_name(&self, name: &str) -> Option<Arc<SoxDevice>> {
        self.devices
            .iter()
            .find(|entry| entry.value().name().eq_ignore_ascii_case(name))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Looks up a device by unique id, falling back to its display name.
    pub fn find(&self, key: &str) -> Option<Arc<SoxDevice>> {
        self.get(key).or_else(|| self.get_by_name(key))
    }

    /// Removes a device, returning it if it was registered.
    pub fn remove(&self, unique_id: &str) -> Option<Arc<SoxDevice>> {
        let removed = self.devices.remove(unique_id).map(|(_, d)| d);
        if removed.is_some() {
            log::info!("[Registry] Removed device {}", unique_id);
        }
        removed
    }

    /// All registered devices, sorted by unique id.
    pub fn list(&self) -> Vec<Arc<SoxDevice>> {
        let mut devices: Vec<_> = self
            .devices
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        devices.sort_by(|a, b| a.unique_id().cmp(b.unique_id()));
        devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Polls every device concurrently. Failures are handled per device.
    pub async fn poll_all(&self) {
        let devices = self.list();
        log::debug!("[Registry] Polling {} device(s)", devices.len());
        join_all(devices.iter().map(|device| device.poll())).await;
    }
}
