//! WebSocket transport on `tokio-tungstenite`.
//!
//! [`open`] performs the HTTP upgrade handshake and splits the socket into
//! two independently owned halves:
//!
//! - [`WebSocketReader`] goes to the dispatch loop.  Text frames pass through;
//!   binary frames are accepted when they hold valid UTF-8; ping, pong and raw
//!   frames are skipped (tungstenite answers pings itself); a close frame ends
//!   the stream.
//! - [`WebSocketWriter`] is shared by all callers behind the client's writer
//!   lock.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::application::transport::{FrameReader, FrameWriter};
use crate::domain::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Turns a server address into a WebSocket URL.
///
/// A bare `host:port` gets a `ws://` scheme.  Full `ws://` and `wss://` URLs
/// pass through unchanged.
///
/// # Errors
///
/// Returns [`TransportError::InvalidAddress`] for an empty address or any
/// other scheme.
///
/// # Examples
///
/// ```rust
/// use obsws_client::infrastructure::websocket::normalize_address;
///
/// assert_eq!(normalize_address("localhost:4444").unwrap(), "ws://localhost:4444");
/// assert_eq!(normalize_address("wss://obs.example:443").unwrap(), "wss://obs.example:443");
/// ```
pub fn normalize_address(address: &str) -> Result<String, TransportError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(TransportError::InvalidAddress(address.to_owned()));
    }
    if address.starts_with("ws://") || address.starts_with("wss://") {
        return Ok(address.to_owned());
    }
    if address.contains("://") {
        return Err(TransportError::InvalidAddress(address.to_owned()));
    }
    Ok(format!("ws://{address}"))
}

/// Opens a WebSocket to `address`, giving up after `connect_timeout`.
///
/// # Errors
///
/// - [`TransportError::InvalidAddress`] if the address is unusable.
/// - [`TransportError::Connect`] if the TCP connect or upgrade fails.
/// - [`TransportError::ConnectTimeout`] if the handshake takes too long.
pub async fn open(
    address: &str,
    connect_timeout: Duration,
) -> Result<(WebSocketReader, WebSocketWriter), TransportError> {
    let url = normalize_address(address)?;
    info!("connecting to {url}");

    let (ws_stream, _response) = match timeout(connect_timeout, connect_async(url.as_str())).await
    {
        Ok(Ok(pair)) => pair,
        Ok(Err(e)) => {
            return Err(TransportError::Connect {
                address: url,
                reason: e.to_string(),
            })
        }
        Err(_) => return Err(TransportError::ConnectTimeout { address: url }),
    };

    debug!("WebSocket handshake with {url} complete");
    let (sink, stream) = ws_stream.split();
    Ok((WebSocketReader { stream }, WebSocketWriter { sink }))
}

/// Read half of a WebSocket connection.
pub struct WebSocketReader {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameReader for WebSocketReader {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(e) => return Some(Err(TransportError::WebSocket(e.to_string()))),
            };

            match message {
                WsMessage::Text(text) => return Some(Ok(text)),
                WsMessage::Binary(bytes) => {
                    return Some(String::from_utf8(bytes).map_err(|e| {
                        TransportError::Malformed(format!("binary frame is not UTF-8: {e}"))
                    }))
                }
                WsMessage::Close(frame) => {
                    debug!("server sent close frame: {frame:?}");
                    return None;
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
            }
        }
    }
}

/// Write half of a WebSocket connection.
pub struct WebSocketWriter {
    sink: SplitSink<WsStream, WsMessage>,
}

#[async_trait]
impl FrameWriter for WebSocketWriter {
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError> {
        self.sink
            .send(WsMessage::Text(frame))
            .await
            .map_err(|e| match e {
                WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
                other => TransportError::WebSocket(other.to_string()),
            })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.sink.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::WebSocket(e.to_string())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
