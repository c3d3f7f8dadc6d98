//! Infrastructure layer for obsws-client.
//!
//! Concrete implementations of the transport ports declared in
//! [`crate::application::transport`].
//!
//! # Responsibilities
//!
//! - Turning a `host:port` address into a WebSocket URL
//! - Performing the WebSocket HTTP upgrade handshake
//! - Splitting the socket into a frame reader and a frame writer
//! - Providing an in-memory transport for embedding and tests
//!
//! # What does NOT belong here?
//!
//! - Request correlation and event routing (that is the application layer)
//! - Error and state types (that is the domain layer)

pub mod memory;
pub mod websocket;

pub use memory::{channel_transport, MemoryReader, MemoryWriter, ServerEnd};
pub use websocket::{normalize_address, open, WebSocketReader, WebSocketWriter};
