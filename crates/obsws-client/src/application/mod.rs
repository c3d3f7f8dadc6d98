//! Application layer: the connection and correlation engine.
//!
//! # Sub-modules
//!
//! - **`transport`** – The [`FrameReader`] / [`FrameWriter`] ports the engine
//!   talks to.  Adapters live in the infrastructure layer.
//!
//! - **`correlation`** – Maps each in-flight request id to the single-use sink
//!   its caller is waiting on.
//!
//! - **`event_registry`** – At most one handler per event type.
//!
//! - **`dispatch`** – The single task that owns the read side of the
//!   connection and routes every inbound frame.
//!
//! - **`client`** – The public entry point: connect, authenticate, call,
//!   subscribe, close.

pub mod client;
pub mod correlation;
pub mod dispatch;
pub mod event_registry;
pub mod transport;

pub use client::{Client, ConnectOutcome};
pub use correlation::{CorrelationTable, Reply};
pub use event_registry::{DispatchOutcome, EventHandler, EventRegistry};
pub use transport::{FrameReader, FrameWriter};
