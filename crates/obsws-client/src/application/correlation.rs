//! Correlation table: in-flight request id → waiting caller.
//!
//! # How a reply finds its caller (for beginners)
//!
//! 1. Before a request frame is written, the caller registers its id here and
//!    receives the receiving half of a `oneshot` channel.
//! 2. The caller awaits that receiver.  It is suspended, not polling.
//! 3. When the dispatch loop reads a response, it calls [`resolve`] or
//!    [`reject`] with the echoed id.  The entry is removed and the outcome is
//!    sent down the channel, which wakes the caller.
//!
//! A `oneshot` sender can only be used once, and the entry is removed under
//! the lock before it is used, so every request completes at most once no
//! matter how many replies carry its id.  Ids that are unknown (already
//! completed, timed out, or never issued) are ignored.
//!
//! Registration must happen before the frame is sent.  Otherwise a fast server
//! could answer before anyone is listening and the reply would be dropped.
//!
//! [`resolve`]: CorrelationTable::resolve
//! [`reject`]: CorrelationTable::reject

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use obsws_core::RequestId;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::domain::error::ClientError;

/// What a waiting caller eventually receives: the raw reply payload or the
/// reason the request failed.
pub type Reply = Result<Value, ClientError>;

/// Thread-safe map of pending requests.
///
/// All mutation goes through [`register`](Self::register),
/// [`resolve`](Self::resolve), [`reject`](Self::reject),
/// [`remove`](Self::remove) and [`cancel_all`](Self::cancel_all).  The lock is
/// never held while a sink is completed or across an `.await`.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    pending: Mutex<HashMap<RequestId, oneshot::Sender<Reply>>>,
}

impl CorrelationTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` and returns the receiver its outcome will arrive on.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DuplicateId`] if `id` is already pending.
    pub fn register(&self, id: RequestId) -> Result<oneshot::Receiver<Reply>, ClientError> {
        let mut pending = self.lock();
        if pending.contains_key(&id) {
            return Err(ClientError::DuplicateId(id.to_string()));
        }
        let (tx, rx) = oneshot::channel();
        pending.insert(id, tx);
        Ok(rx)
    }

    /// Completes `id` successfully.  Returns `false` if `id` was not pending.
    pub fn resolve(&self, id: &RequestId, payload: Value) -> bool {
        self.complete(id, Ok(payload))
    }

    /// Completes `id` with `error`.  Returns `false` if `id` was not pending.
    pub fn reject(&self, id: &RequestId, error: ClientError) -> bool {
        self.complete(id, Err(error))
    }

    /// Drops the entry for `id` without completing it.
    ///
    /// Used when the caller gives up (deadline, cancellation, failed write).
    pub fn remove(&self, id: &RequestId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Fails every pending request with `error` and empties the table.
    ///
    /// Returns the number of requests that were pending.
    pub fn cancel_all(&self, error: ClientError) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        let count = drained.len();
        for (_, sink) in drained {
            let _ = sink.send(Err(error.clone()));
        }
        count
    }

    /// Whether `id` is currently pending.
    pub fn contains(&self, id: &RequestId) -> bool {
        self.lock().contains_key(id)
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn complete(&self, id: &RequestId, reply: Reply) -> bool {
        // Take the sender out first so the lock is released before sending.
        let Some(sink) = self.lock().remove(id) else {
            return false;
        };
        if sink.send(reply).is_err() {
            // The caller stopped waiting between removal and delivery.
            debug!("reply for {id} arrived after its caller went away");
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequestId, oneshot::Sender<Reply>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TransportError;
    use serde_json::json;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok, assert_pending, assert_ready, task};

    #[test]
    fn test_register_then_resolve_delivers_payload() {
        // Arrange
        let table = CorrelationTable::new();
        let id = RequestId::from("a");
        let mut reply = task::spawn(table.register(id.clone()).unwrap());

        // Act / Assert: the waiter is suspended until the reply arrives.
        assert_pending!(reply.poll());
        assert!(table.resolve(&id, json!({ "ok": true })));
        assert!(reply.is_woken());
        let delivered = assert_ready!(reply.poll());

        assert_eq!(delivered.unwrap(), Ok(json!({ "ok": true })));
        assert!(table.is_empty());
    }

    #[test]
    fn test_reject_delivers_error() {
        let table = CorrelationTable::new();
        let id = RequestId::from("b");
        let mut reply = task::spawn(table.register(id.clone()).unwrap());

        assert!(table.reject(&id, ClientError::Protocol("nope".to_string())));

        let delivered = assert_ready!(reply.poll()).unwrap();
        assert_eq!(delivered, Err(ClientError::Protocol("nope".to_string())));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let table = CorrelationTable::new();
        let id = RequestId::from("dup");
        let _first = assert_ok!(table.register(id.clone()));

        let second = assert_err!(table.register(id));

        assert_eq!(second, ClientError::DuplicateId("dup".to_string()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_second_resolve_for_same_id_is_a_no_op() {
        // Arrange
        let table = CorrelationTable::new();
        let id = RequestId::from("once");
        let mut reply = task::spawn(table.register(id.clone()).unwrap());

        // Act
        let first = table.resolve(&id, json!(1));
        let second = table.resolve(&id, json!(2));
        let third = table.reject(&id, ClientError::Protocol("late".to_string()));

        // Assert: only the first completion counts.
        assert!(first);
        assert!(!second);
        assert!(!third);
        assert_eq!(assert_ready!(reply.poll()).unwrap(), Ok(json!(1)));
    }

    #[test]
    fn test_resolve_unknown_id_is_a_no_op() {
        let table = CorrelationTable::new();
        assert!(!table.resolve(&RequestId::from("ghost"), json!(null)));
        assert!(!table.reject(&RequestId::from("ghost"), ClientError::NotConnected));
        assert!(table.is_empty());
    }

    #[test]
    fn test_resolve_after_caller_dropped_still_removes_entry() {
        let table = CorrelationTable::new();
        let id = RequestId::from("gone");
        drop(table.register(id.clone()).unwrap());

        assert!(table.resolve(&id, json!(null)));
        assert!(!table.contains(&id));
    }

    #[test]
    fn test_remove_then_late_reply_is_ignored() {
        // Simulates a request whose deadline expired before the reply came.
        let table = CorrelationTable::new();
        let id = RequestId::from("slow");
        let _reply = table.register(id.clone()).unwrap();

        assert!(table.remove(&id));
        assert!(!table.resolve(&id, json!("too late")));
        assert!(!table.remove(&id));
    }

    #[test]
    fn test_cancel_all_fails_every_waiter() {
        // Arrange
        let table = CorrelationTable::new();
        let mut waiters: Vec<_> = (0..5)
            .map(|i| task::spawn(table.register(RequestId::from(format!("r{i}"))).unwrap()))
            .collect();
        let error = ClientError::Transport(TransportError::Closed);

        // Act
        let cancelled = table.cancel_all(error.clone());

        // Assert
        assert_eq!(cancelled, 5);
        assert!(table.is_empty());
        for waiter in &mut waiters {
            assert_eq!(assert_ready!(waiter.poll()).unwrap(), Err(error.clone()));
        }
    }

    #[test]
    fn test_cancel_all_on_empty_table_returns_zero() {
        let table = CorrelationTable::new();
        assert_eq!(table.cancel_all(ClientError::NotConnected), 0);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_and_resolutions() {
        // Arrange: 50 tasks register, then the "dispatch loop" resolves all.
        let table = Arc::new(CorrelationTable::new());
        let ids: Vec<RequestId> = (0..50).map(|_| RequestId::generate()).collect();
        let receivers: Vec<_> = ids
            .iter()
            .map(|id| table.register(id.clone()).unwrap())
            .collect();

        // Act
        let resolver = {
            let table = Arc::clone(&table);
            let ids = ids.clone();
            tokio::spawn(async move {
                for (n, id) in ids.iter().enumerate() {
                    table.resolve(id, json!(n));
                }
            })
        };
        resolver.await.unwrap();

        // Assert: every waiter got exactly its own payload.
        for (n, rx) in receivers.into_iter().enumerate() {
            assert_eq!(rx.await.unwrap(), Ok(json!(n)));
        }
        assert!(table.is_empty());
    }
}
