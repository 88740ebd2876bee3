//! SoX sound-server protocol client.
//!
//! # Module Structure
//!
//! - `types` - Endpoint and timeout types
//! - `protocol` - Request line building and tolerant reply parsing
//! - `exchange` - One connect/write/read/close round trip over TCP
//! - `traits` - Transport trait abstraction for testability
//! - `client` - `SoxClientImpl` concrete transport and `test_connection` probe

pub mod client;
pub mod exchange;
pub mod protocol;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export domain types
pub use types::{Endpoint, ExchangeTimeouts};

// Re-export protocol primitives
pub use exchange::{send_exchange, ExchangeError, ExchangePhase, ExchangeResult};
pub use protocol::{parse_reply, parse_reply_fields, ExchangeReply, ExchangeRequest};

// Re-export trait abstraction and concrete implementation
pub use client::{test_connection, SoxClientImpl};
pub use traits::SoxTransport;
