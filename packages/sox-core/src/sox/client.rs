//! Concrete TCP transport and the configuration-time reachability probe.

use async_trait::async_trait;

use super::exchange::{send_exchange, ExchangeResult};
use super::protocol::{ExchangeReply, ExchangeRequest};
use super::traits::SoxTransport;
use super::types::{Endpoint, ExchangeTimeouts};

/// Verifies that a sound server is reachable.
///
/// Performs one empty exchange (status request, no volume hint) and reports
/// only success or failure. Used to validate a device before accepting its
/// configuration.
///
/// # Arguments
/// * `host` - Host name or IP address of the sound server
/// * `port` - TCP port of the sound server
/// * `timeouts` - Connect and response windows
pub async fn test_connection(
    host: &str,
    port: u16,
    timeouts: &ExchangeTimeouts,
) -> ExchangeResult<()> {
    let endpoint = Endpoint::new(host, port);
    send_exchange(&endpoint, &ExchangeRequest::status(None), timeouts).await?;
    log::info!("[SoX] {} is reachable", endpoint);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Concrete implementation of [`SoxTransport`] over TCP.
///
/// Holds no connection state; every call opens and closes its own socket.
#[derive(Debug, Clone, Default)]
pub struct SoxClientImpl {
    timeouts: ExchangeTimeouts,
}

impl SoxClientImpl {
    /// Creates a new client with the given timeout budget.
    #[must_use]
    pub fn new(timeouts: ExchangeTimeouts) -> Self {
        Self { timeouts }
    }

    /// Timeout budget applied to every exchange.
    #[must_use]
    pub fn timeouts(&self) -> &ExchangeTimeouts {
        &self.timeouts
    }
}

#[async_trait]
impl SoxTransport for SoxClientImpl {
    async fn exchange(
        &self,
        endpoint: &Endpoint,
        request: &ExchangeRequest,
    ) -> ExchangeResult<ExchangeReply> {
        send_exchange(endpoint, request, &self.timeouts).await
    }
}
