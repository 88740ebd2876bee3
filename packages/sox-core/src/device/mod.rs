//! Device state tracking.
//!
//! - `types` - [`DeviceState`] and the values derived from it
//! - `tracker` - [`SoxDevice`], which turns host commands into exchanges

mod tracker;
mod types;

pub use tracker::{DeviceError, DeviceResult, SoxDevice};
pub use types::{Connectivity, DeviceState, MediaType, PlaybackState, SupportedFeatures};
