//! Shared test doubles for the transport seam.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::exchange::{ExchangeError, ExchangeResult};
use super::protocol::{ExchangeReply, ExchangeRequest};
use super::traits::SoxTransport;
use super::types::Endpoint;

/// Scripted outcome of one exchange.
pub enum Scripted {
    Reply(ExchangeReply),
    Refused,
}

/// Mock transport that records every request and replays scripted outcomes.
///
/// When the script runs dry every exchange succeeds with an empty reply.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<(Endpoint, ExchangeRequest)>>,
    script: Mutex<VecDeque<Scripted>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn reply(&self, is_playing: Option<bool>, volume_level: Option<f64>) {
        self.script.lock().push_back(Scripted::Reply(ExchangeReply {
            is_playing,
            volume_level,
        }));
    }

    /// Queues a refused connection.
    pub fn refuse(&self) {
        self.script.lock().push_back(Scripted::Refused);
    }

    /// Number of exchanges performed so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Wire lines of every request, in order.
    pub fn lines(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|(_, req)| req.to_line())
            .collect()
    }
}

#[async_trait]
impl SoxTransport for MockTransport {
    async fn exchange(
        &self,
        endpoint: &Endpoint,
        request: &ExchangeRequest,
    ) -> ExchangeResult<ExchangeReply> {
        self.requests
            .lock()
            .push((endpoint.clone(), request.clone()));

        let next = self.script.lock().pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            None => Ok(ExchangeReply::default()),
            Some(Scripted::Refused) => Err(ExchangeError::Connect {
                addr: endpoint.to_string(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            }),
        }
    }
}
