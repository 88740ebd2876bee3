//! Services that manage more than one device.
//!
//! - `device_registry` - Devices keyed by unique id
//! - `poller` - Periodic background refresh of every device

pub mod device_registry;
pub mod poller;

pub use device_registry::DeviceRegistry;
pub use poller::DevicePoller;
