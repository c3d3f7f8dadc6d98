//! The dispatch loop: the one task that reads the connection.
//!
//! Exactly one dispatch task runs per connection.  Each iteration:
//!
//! 1. Reads one frame.  A read error or an orderly close ends the session.
//! 2. Decodes it.  A frame that does not decode also ends the session: once
//!    the stream is out of step with the protocol there is no safe way to find
//!    the next good frame, and a lost reply would leave its caller hanging.
//! 3. Routes it:
//!    - response → correlation table (`resolve` or `reject`),
//!    - id-less error → connection notification stream,
//!    - event → event registry; the handler runs right here, on this task.
//!      An event payload that fails to decode is dropped, not fatal.
//!
//! Because everything happens on one task, responses and events are observed
//! in exactly the order the server sent them.  A handler must return before
//! the next frame is looked at, so handlers must not block waiting on a reply
//! from this same connection.
//!
//! When the loop ends on a failure it tears the session down: both state flags
//! are cleared, the writer is closed, and every pending call is failed with
//! the transport error so nobody waits forever on a dead socket.
//!
//! The loop holds only a [`Weak`] reference to the client state.  If the
//! client is dropped the loop notices on the next frame and exits.

use std::sync::Weak;

use obsws_core::InboundFrame;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::application::client::ClientShared;
use crate::application::event_registry::DispatchOutcome;
use crate::application::transport::FrameReader;
use crate::domain::error::{ClientError, ConnectionEvent, TransportError};

/// Runs the dispatch loop until the transport fails or the client goes away.
pub(crate) async fn run(
    mut reader: Box<dyn FrameReader>,
    client: Weak<ClientShared>,
    notices: mpsc::UnboundedSender<ConnectionEvent>,
) {
    let (shared, failure) = loop {
        let next = reader.next_frame().await;

        let Some(shared) = client.upgrade() else {
            debug!("client dropped; dispatch loop exiting");
            return;
        };

        let text = match next {
            Some(Ok(text)) => text,
            Some(Err(e)) => break (shared, e),
            None => break (shared, TransportError::Closed),
        };

        if let Err(e) = route_frame(&shared, &text, &notices) {
            break (shared, e);
        }
    };

    error!("dispatch loop stopped: {failure}");
    shared
        .tear_down(ClientError::Transport(failure.clone()))
        .await;
    let _ = notices.send(ConnectionEvent::Lost(failure));
}

/// Decodes and routes one frame.
///
/// # Errors
///
/// Returns [`TransportError::Malformed`] if the frame does not decode; the
/// caller must treat that as fatal.
pub(crate) fn route_frame(
    shared: &ClientShared,
    text: &str,
    notices: &mpsc::UnboundedSender<ConnectionEvent>,
) -> Result<(), TransportError> {
    let frame = shared
        .codec
        .decode_frame(text)
        .map_err(|e| TransportError::Malformed(e.to_string()))?;

    match frame {
        InboundFrame::Response { id, outcome } => {
            let delivered = match outcome {
                Ok(payload) => shared.table.resolve(&id, payload),
                Err(message) => shared.table.reject(&id, ClientError::Protocol(message)),
            };
            if delivered {
                debug!("response {id} delivered");
            } else {
                debug!("response {id} matches no pending request; dropped");
            }
        }

        InboundFrame::ConnectionError { message } => {
            warn!("server reported a connection-level error: {message}");
            let _ = notices.send(ConnectionEvent::ServerError(message));
        }

        InboundFrame::Event {
            update_type,
            payload,
        } => match shared.events.dispatch(&update_type, &payload) {
            DispatchOutcome::Delivered => debug!("event {update_type} handled"),
            DispatchOutcome::Unhandled => debug!("event {update_type} has no handler"),
            DispatchOutcome::Dropped(e) => {
                warn!("event {update_type} dropped: {e}");
            }
        },
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
