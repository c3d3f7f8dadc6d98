//! Transport ports.
//!
//! The engine never touches a socket directly.  It reads through a
//! [`FrameReader`] owned by the dispatch loop and writes through a
//! [`FrameWriter`] shared by all callers behind its own lock.  The
//! infrastructure layer provides a WebSocket adapter and an in-memory one.

use async_trait::async_trait;

use crate::domain::error::TransportError;

/// Read side of a message-oriented connection carrying text frames.
#[async_trait]
pub trait FrameReader: Send {
    /// Waits for the next text frame.
    ///
    /// Returns `None` when the connection closed in an orderly way and
    /// `Some(Err(_))` when the read failed.
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>>;
}

/// Write side of a message-oriented connection carrying text frames.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameWriter: Send {
    /// Sends one text frame.
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError>;

    /// Closes the connection.  Further sends fail.
    async fn close(&mut self) -> Result<(), TransportError>;
}
