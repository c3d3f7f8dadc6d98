//! Domain layer for obsws-client.
//!
//! This module contains pure types with no I/O dependencies:
//!
//! - [`error`]  – The error taxonomy and connection-level notifications.
//! - [`state`]  – The `connected` / `ready` flags and pending challenge.
//! - [`config`] – [`ClientConfig`]: address, password and timeouts.

pub mod config;
pub mod error;
pub mod state;

pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ConnectionEvent, TransportError};
pub use state::ConnectionState;
