//! In-memory transport on `tokio::sync::mpsc`.
//!
//! [`channel_transport`] returns a reader/writer pair for the client plus a
//! [`ServerEnd`] that plays the server: it pushes inbound frames, observes what
//! the client wrote, and can fail or sever the connection.  Useful for
//! embedding the engine behind a custom transport and for tests.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::application::transport::{FrameReader, FrameWriter};
use crate::domain::error::TransportError;

type Inbound = Result<String, TransportError>;

/// Creates a connected in-memory transport.
pub fn channel_transport() -> (MemoryReader, MemoryWriter, ServerEnd) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    (
        MemoryReader { inbound: inbound_rx },
        MemoryWriter {
            outbound: Some(outbound_tx),
        },
        ServerEnd {
            inbound: inbound_tx,
            outbound: outbound_rx,
        },
    )
}

/// Client-side read half.  Ends when the [`ServerEnd`] is dropped.
#[derive(Debug)]
pub struct MemoryReader {
    inbound: mpsc::UnboundedReceiver<Inbound>,
}

#[async_trait]
impl FrameReader for MemoryReader {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound.recv().await
    }
}

/// Client-side write half.
#[derive(Debug)]
pub struct MemoryWriter {
    outbound: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl FrameWriter for MemoryWriter {
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        outbound.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.outbound = None;
        Ok(())
    }
}

/// The server's side of an in-memory transport.
#[derive(Debug)]
pub struct ServerEnd {
    inbound: mpsc::UnboundedSender<Inbound>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl ServerEnd {
    /// Delivers `frame` to the client.  Returns `false` if the client's reader
    /// is gone.
    pub fn push(&self, frame: &str) -> bool {
        self.inbound.send(Ok(frame.to_owned())).is_ok()
    }

    /// Makes the client's next read fail with `error`.
    pub fn fail(&self, error: TransportError) -> bool {
        self.inbound.send(Err(error)).is_ok()
    }

    /// Waits for the next frame the client wrote.  `None` once the client
    /// closed or dropped its writer and every frame has been taken.
    pub async fn next_outbound(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Like [`next_outbound`](Self::next_outbound), parsed as JSON.  A frame
    /// that is not JSON yields `None`.
    pub async fn next_request(&mut self) -> Option<Value> {
        let frame = self.next_outbound().await?;
        serde_json::from_str(&frame).ok()
    }

    /// Severs the connection; the client's reader sees an orderly close.
    pub fn disconnect(self) {}
}

// ── Tests ─────────────────────────────────────────────────────────────────────
