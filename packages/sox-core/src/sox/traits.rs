//! Trait abstractions for sound-server operations.
//!
//! The device tracker depends on [`SoxTransport`] rather than on sockets
//! directly, so tests can script replies and count network calls.

use async_trait::async_trait;

use super::exchange::ExchangeResult;
use super::protocol::{ExchangeReply, ExchangeRequest};
use super::types::Endpoint;

/// Trait for performing one request/response exchange with a sound server.
///
/// Used by `SoxDevice` for every command it issues.
#[async_trait]
pub trait SoxTransport: Send + Sync {
    /// Sends `request` to `endpoint` and returns the fields the server reported.
    ///
    /// # Arguments
    /// * `endpoint` - Host and port of the sound server
    /// * `request` - Media id and volume hint to send
    async fn exchange(
        &self,
        endpoint: &Endpoint,
        request: &ExchangeRequest,
    ) -> ExchangeResult<ExchangeReply>;
}
