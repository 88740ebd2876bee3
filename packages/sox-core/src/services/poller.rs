//! Background state polling.
//!
//! The sound server never pushes state, so the host refreshes every device
//! on a fixed cadence. [`DevicePoller`] runs that cadence until cancelled,
//! and can be nudged into an immediate refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::device_registry::DeviceRegistry;
use crate::runtime::TaskSpawner;

/// Periodically polls every device in a registry.
pub struct DevicePoller {
    registry: Arc<DeviceRegistry>,
    interval: Duration,
    cancel_token: CancellationToken,
    refresh_notify: Notify,
}

impl DevicePoller {
    /// Creates a poller. Nothing runs until [`start`](Self::start) or
    /// [`run`](Self::run) is called.
    ///
    /// # Arguments
    /// * `registry` - Devices to poll
    /// * `interval` - Time between automatic polls
    pub fn new(registry: Arc<DeviceRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval,
            cancel_token: CancellationToken::new(),
            refresh_notify: Notify::new(),
        }
    }

    /// Token that stops the polling loop when cancelled.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Requests an immediate poll of every device.
    pub fn trigger_refresh(&self) {
        self.refresh_notify.notify_one();
    }

    /// Stops the polling loop.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Spawns [`run`](Self::run) as a background task.
    pub fn start<S: TaskSpawner>(self: Arc<Self>, spawner: &S) {
        spawner.spawn(async move { self.run().await });
    }

    /// Polls immediately, then on every interval tick or manual refresh,
    /// until cancelled.
    pub async fn run(&self) {
        log::info!(
            "[Poller] Polling {} device(s) every {:?}",
            self.registry.len(),
            self.interval
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let is_manual_refresh = tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    log::info!("[Poller] Shutting down polling loop");
                    break;
                }
                _ = interval.tick() => false,
                _ = self.refresh_notify.notified() => {
                    log::debug!("[Poller] Manual refresh triggered");
                    true
                }
            };

            // Push the next automatic poll back a full interval
            if is_manual_refresh {
                interval.reset();
            }

            self.registry.poll_all().await;
        }
    }
}
