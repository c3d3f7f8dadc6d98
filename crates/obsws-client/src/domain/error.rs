//! Error taxonomy for the connection engine.
//!
//! Two scopes of failure exist:
//!
//! - **Per-call** errors ([`ClientError::NotConnected`],
//!   [`ClientError::NotAuthenticated`], [`ClientError::Protocol`], ...) are
//!   returned only to the caller that issued the request.
//! - **Connection-wide** errors ([`TransportError`]) end the session.  They are
//!   delivered to every pending call and reported once on the connection's
//!   notification stream as [`ConnectionEvent::Lost`].
//!
//! Both error types are `Clone` because a single transport failure has to be
//! handed to every caller waiting on the dead connection.

use std::time::Duration;

use thiserror::Error;

/// Failures of the underlying socket.  Always fatal to the connection.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// The address could not be turned into a WebSocket URL.
    #[error("invalid server address `{0}`")]
    InvalidAddress(String),

    /// The WebSocket handshake failed.
    #[error("failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// The WebSocket handshake did not complete in time.
    #[error("timed out connecting to {address}")]
    ConnectTimeout { address: String },

    /// The connection was closed, locally or by the server.
    #[error("connection closed")]
    Closed,

    /// A read or write on the socket failed.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// A frame could not be decoded.  The stream is out of sync with the
    /// protocol and cannot be trusted any more.
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Errors returned to callers of the client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// The operation needs an open connection.
    #[error("client not connected")]
    NotConnected,

    /// `connect` was called on a client that already has a connection.
    #[error("client already connected")]
    AlreadyConnected,

    /// The server requires authentication and it has not succeeded yet.
    #[error("client not authenticated")]
    NotAuthenticated,

    /// `authenticate` was called but the server never issued a challenge.
    #[error("no authentication challenge pending")]
    NoPendingChallenge,

    /// The server answered the request with `status: "error"`.
    #[error("server rejected request: {0}")]
    Protocol(String),

    /// The connection failed while the request was in flight.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reply arrived but did not match the expected typed shape.
    #[error("could not decode reply: {0}")]
    Decode(String),

    /// The request parameters could not be encoded.
    #[error("could not encode request: {0}")]
    Encode(String),

    /// No reply arrived within the deadline.
    #[error("{request} timed out after {after:?}")]
    Timeout { request: String, after: Duration },

    /// A correlation id was registered twice.
    #[error("duplicate request id {0}")]
    DuplicateId(String),
}

/// Notifications about the connection that are not tied to a single call.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The server sent an error frame with no request id and no event type.
    /// Informational; the connection stays up.
    ServerError(String),

    /// The dispatch loop stopped because the transport failed.  Every pending
    /// call has already been failed with the same error.
    Lost(TransportError),
}
