//! obsws-client library crate.
//!
//! The connection and request-correlation engine for the obs-websocket remote
//! control protocol: one persistent WebSocket, many concurrent requests, and
//! server-pushed events, all multiplexed over the same socket.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! caller ── call() ──► Client ──► Codec (encode) ──► FrameWriter ──► socket
//!                        │
//!                        └─ CorrelationTable ◄── dispatch loop ◄── FrameReader ◄── socket
//!                                                    │
//!                                                    └──► EventRegistry ──► handlers
//! ```
//!
//! - `domain/`          Pure types: errors, connection state, configuration.
//! - `application/`     The engine: correlation table, event registry,
//!                      dispatch loop, client, and the transport ports.
//! - `infrastructure/`  Transport adapters: WebSocket (tokio-tungstenite) and
//!                      an in-memory channel pair.
//!
//! # Quick start
//!
//! ```no_run
//! use obsws_client::{Client, ClientConfig};
//! use obsws_core::protocol::requests::GetVersion;
//!
//! # async fn run() -> Result<(), obsws_client::ClientError> {
//! let client = Client::new(ClientConfig::default());
//! let outcome = client.connect("127.0.0.1:4444").await?;
//! if outcome.auth_required {
//!     client.authenticate("password").await?;
//! }
//! let version = client.call(&GetVersion::default()).await?;
//! println!("obs-websocket {}", version.obs_websocket_version);
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

/// Domain layer: errors, connection state and configuration (no I/O).
pub mod domain;

/// Application layer: the connection engine.
pub mod application;

/// Infrastructure layer: transport adapters.
pub mod infrastructure;

pub use application::client::{Client, ConnectOutcome};
pub use application::transport::{FrameReader, FrameWriter};
pub use domain::config::ClientConfig;
pub use domain::error::{ClientError, ConnectionEvent, TransportError};
