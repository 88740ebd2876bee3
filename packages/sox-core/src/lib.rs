//! SoX Core - client library for SoX sound servers.
//!
//! A SoX sound server plays whatever media id it is handed over a tiny
//! line-based TCP protocol. This crate provides the protocol client and a
//! per-device state tracker that hosts (home-automation bridges, the `soxctl`
//! command line) drive with simple commands.
//!
//! # Architecture
//!
//! - [`sox`]: Wire protocol, one-shot exchanges and the transport trait
//! - [`device`]: Per-device state tracker ([`SoxDevice`])
//! - [`services`]: Device registry and background poller
//! - [`events`]: Domain events emitted on state transitions
//! - [`state`]: Device and application configuration
//! - [`runtime`]: Task spawning abstraction
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`SoxTransport`](sox::SoxTransport): Performing exchanges
//! - [`EventEmitter`](events::EventEmitter): Emitting domain events
//! - [`TaskSpawner`](runtime::TaskSpawner): Spawning background tasks

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod device;
pub mod error;
pub mod events;
pub mod protocol_constants;
pub mod runtime;
pub mod services;
pub mod sox;
pub mod state;
pub mod utils;

// Re-export commonly used types at the crate root
pub use device::{
    Connectivity, DeviceError, DeviceResult, DeviceState, MediaType, PlaybackState, SoxDevice,
    SupportedFeatures,
};
pub use error::{ErrorCode, SoxError, SoxResult};
pub use events::{
    BroadcastEventBridge, DeviceEvent, EventEmitter, LoggingEventEmitter, NoopEventEmitter,
};
pub use runtime::{TaskSpawner, TokioSpawner};
pub use services::{DevicePoller, DeviceRegistry};
pub use state::{Config, ConfigError, DeviceConfig};
pub use utils::{normalize_volume, now_millis};

// Re-export protocol client types
pub use sox::{
    test_connection, Endpoint, ExchangeError, ExchangeReply, ExchangeRequest, ExchangeResult,
    ExchangeTimeouts, SoxClientImpl, SoxTransport,
};
