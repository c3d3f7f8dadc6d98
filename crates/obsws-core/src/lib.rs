//! # obsws-core
//!
//! Shared protocol library for the obs-websocket remote control client.
//!
//! This crate holds everything about the protocol that does not need a socket
//! or an async runtime.  The connection engine in `obsws-client` builds on it.
//!
//! # Overview (for beginners)
//!
//! obs-websocket is a remote control protocol for OBS Studio.  A client opens
//! one WebSocket connection to the server and exchanges JSON text frames:
//!
//! - **Requests** go from client to server.  Each carries a `request-type`
//!   name and a unique `message-id`.
//! - **Responses** come back carrying the same `message-id`, so the client can
//!   match each reply to the request that caused it.
//! - **Events** are pushed by the server at any time, tagged with an
//!   `update-type` name instead of an id.
//!
//! The modules here cover:
//!
//! - **`protocol`** – The JSON envelope codec, correlation identifiers, and the
//!   typed [`Request`] / [`Event`] traits with a representative catalogue.
//!
//! - **`auth`** – The challenge-response handshake that proves knowledge of the
//!   server password without sending it over the wire.

pub mod auth;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `obsws_core::JsonCodec` instead of `obsws_core::protocol::codec::JsonCodec`.
pub use auth::{auth_response, AuthChallenge};
pub use protocol::codec::{decode_payload, encode_params, Codec, CodecError, JsonCodec};
pub use protocol::events::Event;
pub use protocol::frame::InboundFrame;
pub use protocol::id::RequestId;
pub use protocol::requests::Request;
