//! Domain types for addressing a sound server.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{CONNECT_TIMEOUT_SECS, DEFAULT_PORT, READ_TIMEOUT_SECS};

/// Network address of one sound server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Endpoint {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Endpoint on the default protocol port.
    #[must_use]
    pub fn with_default_port(host: impl Into<String>) -> Self {
        Self::new(host, DEFAULT_PORT)
    }

    /// Returns true if the endpoint uses the protocol's default port.
    #[must_use]
    pub fn is_default_port(&self) -> bool {
        self.port == DEFAULT_PORT
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Per-exchange timeout budget.
///
/// The two windows are independent: `connect` bounds the TCP handshake,
/// `read` bounds writing the request and waiting for the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for ExchangeTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}
