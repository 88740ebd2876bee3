//! Low-level request/response exchange with a SoX sound server.
//!
//! One exchange is one TCP connection: connect, write the request line,
//! flush, read a single bounded reply, close. For the device-level commands
//! built on top of this, see [`crate::device`].

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::protocol::{decode_reply, ExchangeReply, ExchangeRequest};
use super::types::{Endpoint, ExchangeTimeouts};
use crate::protocol_constants::MAX_REPLY_BYTES;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Stage of an exchange, used to label timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Establishing the TCP connection.
    Connect,
    /// Writing the request and waiting for the reply.
    Response,
}

impl fmt::Display for ExchangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// Errors that can occur while exchanging with a sound server.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The connection was refused or the host is unreachable.
    #[error("Connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A connect or response window elapsed.
    #[error("Timed out after {elapsed:?} during {phase} with {addr}")]
    Timeout {
        addr: String,
        phase: ExchangePhase,
        elapsed: Duration,
    },

    /// The connection broke while writing or reading.
    #[error("I/O error with {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenient Result alias for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

impl ExchangeError {
    /// Returns true if this error is a timeout of either window.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Address of the server the failed exchange targeted.
    #[must_use]
    pub fn addr(&self) -> &str {
        match self {
            Self::Connect { addr, .. } | Self::Timeout { addr, .. } | Self::Io { addr, .. } => {
                addr
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange
// ─────────────────────────────────────────────────────────────────────────────

/// Performs exactly one request/response exchange with a sound server.
///
/// The connection is closed on every path before the result is returned,
/// including when the write or read fails after a successful connect.
///
/// # Arguments
/// * `endpoint` - Host and port of the sound server
/// * `request` - The command to send
/// * `timeouts` - Connect and response windows
///
/// # Returns
/// The fields the server reported. A reply that is not a `key=value;` list,
/// or not valid UTF-8, yields an empty [`ExchangeReply`] rather than an error.
pub async fn send_exchange(
    endpoint: &Endpoint,
    request: &ExchangeRequest,
    timeouts: &ExchangeTimeouts,
) -> ExchangeResult<ExchangeReply> {
    let addr = endpoint.to_string();
    let payload = request.to_line();

    log::debug!("[SoX] Sending payload to {}: {:?}", addr, payload);

    let start = Instant::now();
    let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
    let bytes = exchange_over(&addr, connect, payload.as_bytes(), timeouts).await?;

    log::debug!(
        "[SoX] Received {} bytes from {} in {:?}: {:?}",
        bytes.len(),
        addr,
        start.elapsed(),
        String::from_utf8_lossy(&bytes).trim_end()
    );

    Ok(decode_reply(&bytes))
}

/// Runs the connect future and the request/reply under their own windows.
///
/// The response window starts once the connection is established.
async fn exchange_over<S, C>(
    addr: &str,
    connect: C,
    payload: &[u8],
    timeouts: &ExchangeTimeouts,
) -> ExchangeResult<Vec<u8>>
where
    C: Future<Output = std::io::Result<S>>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let addr = addr.to_string();

    let connect_start = Instant::now();
    let mut stream = match timeout(timeouts.connect, connect).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => {
            log::error!("[SoX] Error connecting to {}: {}", addr, source);
            return Err(ExchangeError::Connect { addr, source });
        }
        Err(_) => {
            log::error!("[SoX] Connect to {} timed out", addr);
            return Err(ExchangeError::Timeout {
                addr,
                phase: ExchangePhase::Connect,
                elapsed: connect_start.elapsed(),
            });
        }
    };

    let response_start = Instant::now();
    let outcome = timeout(timeouts.read, write_then_read(&mut stream, payload)).await;
    close_stream(&mut stream, &addr).await;
    drop(stream);

    match outcome {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(source)) => {
            log::error!("[SoX] Error communicating with {}: {}", addr, source);
            Err(ExchangeError::Io { addr, source })
        }
        Err(_) => {
            log::error!("[SoX] No reply from {} within {:?}", addr, timeouts.read);
            Err(ExchangeError::Timeout {
                addr,
                phase: ExchangePhase::Response,
                elapsed: response_start.elapsed(),
            })
        }
    }
}

/// Writes the full request, flushes, then does a single bounded read.
async fn write_then_read<S>(stream: &mut S, payload: &[u8]) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(payload).await?;
    stream.flush().await?;

    let mut buf = vec![0u8; MAX_REPLY_BYTES];
    let n = stream.read(&mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}

/// Shuts down the write half. Safe to call more than once.
async fn close_stream<S: AsyncWrite + Unpin>(stream: &mut S, addr: &str) {
    if let Err(e) = stream.shutdown().await {
        log::debug!("[SoX] Ignoring shutdown error for {}: {}", addr, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn short_timeouts() -> ExchangeTimeouts {
        ExchangeTimeouts {
            connect: Duration::from_millis(500),
            read: Duration::from_millis(200),
        }
    }

    async fn bind_local() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, Endpoint::new("127.0.0.1", port))
    }

    /// Accepts one connection, records the request, answers with `reply`.
    fn serve_once(listener: TcpListener, reply: &'static [u8]) -> tokio::task::JoinHandle<String> {
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(reply).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        })
    }

    #[tokio::test]
    async fn sends_request_line_and_parses_reply() {
        let (listener, endpoint) = bind_local().await;
        let server = serve_once(listener, b"volume=0.5;playing=True\n");

        let request = ExchangeRequest::new("song.flac", Some(0.42));
        let reply = send_exchange(&endpoint, &request, &short_timeouts())
            .await
            .unwrap();

        assert_eq!(server.await.unwrap(), "song.flac;0.42;");
        assert_eq!(reply.is_playing, Some(true));
        assert_eq!(reply.volume_level, Some(0.5));
    }

    #[tokio::test]
    async fn opaque_reply_yields_no_fields() {
        let (listener, endpoint) = bind_local().await;
        let server = serve_once(listener, b"OK\n");

        let reply = send_exchange(&endpoint, &ExchangeRequest::status(None), &short_timeouts())
            .await
            .unwrap();

        assert_eq!(server.await.unwrap(), ";;");
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn reply_past_max_bytes_is_not_read() {
        let (listener, endpoint) = bind_local().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await.unwrap();
            let mut reply = b"volume=0.1;playing=True;".to_vec();
            reply.resize(MAX_REPLY_BYTES + 32, b'x');
            // Would override the leading pairs if read.
            reply.extend_from_slice(b";volume=0.9;playing=False;");
            let _ = socket.write_all(&reply).await;
        });

        let reply = send_exchange(&endpoint, &ExchangeRequest::status(None), &short_timeouts())
            .await
            .unwrap();

        assert_eq!(reply.volume_level, Some(0.1));
        assert_eq!(reply.is_playing, Some(true));
    }

    #[tokio::test]
    async fn slow_reply_within_response_window_succeeds() {
        let (listener, endpoint) = bind_local().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = socket.write_all(b"volume=0.7;").await;
        });
        let timeouts = ExchangeTimeouts {
            connect: Duration::from_millis(50),
            read: Duration::from_millis(500),
        };

        let reply = send_exchange(&endpoint, &ExchangeRequest::status(None), &timeouts)
            .await
            .unwrap();

        assert_eq!(reply.volume_level, Some(0.7));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_connect_is_connect_timeout() {
        let timeouts = ExchangeTimeouts {
            connect: Duration::from_millis(50),
            read: Duration::from_secs(5),
        };
        let connect = std::future::pending::<std::io::Result<tokio::io::DuplexStream>>();

        let err = exchange_over("stalled:7777", connect, b";;", &timeouts)
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                ExchangeError::Timeout {
                    phase: ExchangePhase::Connect,
                    ..
                }
            ),
            "got {err:?}"
        );
        assert_eq!(err.addr(), "stalled:7777");
    }

    #[tokio::test(start_paused = true)]
    async fn connect_and_response_windows_are_independent() {
        let (client, mut server) = tokio::io::duplex(1024);
        let server = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let n = server.read(&mut buf).await.unwrap();
            tokio::time::sleep(Duration::from_millis(80)).await;
            server.write_all(b"playing=True;").await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        // Each step fits its own window; together they exceed both.
        let timeouts = ExchangeTimeouts {
            connect: Duration::from_millis(50),
            read: Duration::from_millis(100),
        };
        let connect = async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok::<_, std::io::Error>(client)
        };

        let bytes = exchange_over("duplex:7777", connect, b"song;;", &timeouts)
            .await
            .unwrap();

        assert_eq!(bytes, b"playing=True;");
        assert_eq!(server.await.unwrap(), "song;;");
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        let (listener, endpoint) = bind_local().await;
        drop(listener);

        let err = send_exchange(&endpoint, &ExchangeRequest::status(None), &short_timeouts())
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::Connect { .. }), "got {err:?}");
        assert!(!err.is_timeout());
        assert_eq!(err.addr(), endpoint.to_string());
    }

    #[tokio::test]
    async fn silent_server_times_out_and_connection_is_closed() {
        let (listener, endpoint) = bind_local().await;
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64];
            let n = socket.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b";0.3;");
            // Never reply; the client must still close its side.
            socket.read(&mut buf).await.unwrap()
        });

        let err = send_exchange(
            &endpoint,
            &ExchangeRequest::status(Some(0.3)),
            &short_timeouts(),
        )
        .await
        .unwrap_err();

        assert!(err.is_timeout(), "got {err:?}");
        assert!(matches!(
            err,
            ExchangeError::Timeout {
                phase: ExchangePhase::Response,
                ..
            }
        ));
        // The server observes EOF once the client has closed.
        let eof = tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .expect("client left the connection open")
            .unwrap();
        assert_eq!(eof, 0);
    }

    #[tokio::test]
    async fn closing_twice_is_safe() {
        let (listener, endpoint) = bind_local().await;
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .unwrap();
        let _peer = accept.await.unwrap();

        close_stream(&mut stream, "test").await;
        close_stream(&mut stream, "test").await;
    }

    #[tokio::test]
    async fn peer_closing_without_reply_is_empty_reply() {
        let (listener, endpoint) = bind_local().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await;
            drop(socket);
        });

        let reply = send_exchange(&endpoint, &ExchangeRequest::stop(None), &short_timeouts())
            .await
            .unwrap();

        assert!(reply.is_empty());
    }

    #[test]
    fn phase_display_is_lowercase() {
        assert_eq!(ExchangePhase::Connect.to_string(), "connect");
        assert_eq!(ExchangePhase::Response.to_string(), "response");
    }
}
