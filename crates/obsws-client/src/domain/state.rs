//! Connection state flags.
//!
//! # State machine
//!
//! ```text
//! Disconnected ──connect──► Connected(unauthenticated)
//!                              │                 │
//!                 auth not required        auth required
//!                              │                 ▼
//!                              │        Connected(challenge known)
//!                              │                 │ authenticate ok
//!                              ▼                 ▼
//!                            Ready ◄─────────────┘
//!
//! any state ──close / transport failure──► Disconnected
//! ```
//!
//! The flags are read on every `call` from arbitrary tasks while the dispatch
//! loop may clear them concurrently, so they are atomics.  The pending
//! challenge is only touched during connect/authenticate and sits behind a
//! plain mutex.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use obsws_core::AuthChallenge;

/// The `connected` / `ready` flags plus the challenge awaiting an answer.
#[derive(Debug, Default)]
pub struct ConnectionState {
    connected: AtomicBool,
    ready: AtomicBool,
    pending_auth: Mutex<Option<AuthChallenge>>,
}

impl ConnectionState {
    /// Creates a disconnected state.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once the transport is open and until it is torn down.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// `true` once authentication succeeded or was not required.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Flips `connected` from false to true.
    ///
    /// Returns `false` if the state was already connected, so two concurrent
    /// `connect` calls cannot both succeed.
    pub fn try_mark_connected(&self) -> bool {
        self.connected
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Marks the session ready and forgets any pending challenge.
    pub fn mark_ready(&self) {
        self.lock_challenge().take();
        self.ready.store(true, Ordering::Release);
    }

    /// Records the challenge issued by the server.
    pub fn set_challenge(&self, challenge: AuthChallenge) {
        *self.lock_challenge() = Some(challenge);
    }

    /// Returns a copy of the pending challenge, if any.
    pub fn challenge(&self) -> Option<AuthChallenge> {
        self.lock_challenge().clone()
    }

    /// Returns to the disconnected state.
    pub fn reset(&self) {
        self.ready.store(false, Ordering::Release);
        self.connected.store(false, Ordering::Release);
        self.lock_challenge().take();
    }

    fn lock_challenge(&self) -> MutexGuard<'_, Option<AuthChallenge>> {
        self.pending_auth
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge() -> AuthChallenge {
        AuthChallenge {
            challenge: "c1".to_string(),
            salt: "s1".to_string(),
        }
    }

    #[test]
    fn test_new_state_is_disconnected() {
        let state = ConnectionState::new();
        assert!(!state.is_connected());
        assert!(!state.is_ready());
        assert_eq!(state.challenge(), None);
    }

    #[test]
    fn test_try_mark_connected_succeeds_once() {
        // Arrange
        let state = ConnectionState::new();

        // Act
        let first = state.try_mark_connected();
        let second = state.try_mark_connected();

        // Assert
        assert!(first);
        assert!(!second);
        assert!(state.is_connected());
        assert!(!state.is_ready());
    }

    #[test]
    fn test_mark_ready_clears_challenge() {
        let state = ConnectionState::new();
        state.try_mark_connected();
        state.set_challenge(challenge());

        state.mark_ready();

        assert!(state.is_ready());
        assert_eq!(state.challenge(), None);
    }

    #[test]
    fn test_reset_clears_everything() {
        let state = ConnectionState::new();
        state.try_mark_connected();
        state.set_challenge(challenge());

        state.reset();

        assert!(!state.is_connected());
        assert!(!state.is_ready());
        assert_eq!(state.challenge(), None);
    }

    #[test]
    fn test_reconnect_after_reset_is_allowed() {
        let state = ConnectionState::new();
        assert!(state.try_mark_connected());
        state.reset();
        assert!(state.try_mark_connected());
    }
}
