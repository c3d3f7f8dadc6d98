//! Event registry: event type name → the single handler for it.
//!
//! Registering a handler for a type that already has one replaces it; there is
//! no fan-out.  Typed handlers are stored type-erased: the stored closure
//! decodes the raw payload into the event struct and then calls the user's
//! function, so lookup and decoding both happen from the `update-type` string
//! alone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use obsws_core::{decode_payload, CodecError, Event};
use serde_json::Value;

/// A stored handler: decode the payload and run the user's callback.
pub type EventHandler = Arc<dyn Fn(&Value) -> Result<(), CodecError> + Send + Sync>;

/// What happened to one event occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The handler ran.
    Delivered,
    /// No handler is registered for the event type.
    Unhandled,
    /// A handler exists but the payload did not decode; the handler did not run.
    Dropped(CodecError),
}

/// Thread-safe event handler table.
#[derive(Default)]
pub struct EventRegistry {
    handlers: Mutex<HashMap<String, EventHandler>>,
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler for `E`, replacing any previous one.
    ///
    /// Returns `true` if a handler was replaced.
    pub fn set_handler<E, F>(&self, handler: F) -> bool
    where
        E: Event,
        F: Fn(E) + Send + Sync + 'static,
    {
        let erased: EventHandler = Arc::new(move |payload: &Value| {
            let event = decode_payload::<E>(payload)?;
            handler(event);
            Ok(())
        });
        self.insert(E::NAME.to_owned(), erased)
    }

    /// Sets an untyped handler for `event_type`, replacing any previous one.
    ///
    /// The handler receives the whole event frame as JSON.  Returns `true` if a
    /// handler was replaced.
    pub fn set_raw_handler<F>(&self, event_type: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let erased: EventHandler = Arc::new(move |payload: &Value| {
            handler(payload);
            Ok(())
        });
        self.insert(event_type.into(), erased)
    }

    /// Removes the handler for `event_type`.  Returns `true` if one existed.
    pub fn remove_handler(&self, event_type: &str) -> bool {
        self.lock().remove(event_type).is_some()
    }

    /// Returns the current handler for `event_type`.
    pub fn get_handler(&self, event_type: &str) -> Option<EventHandler> {
        self.lock().get(event_type).cloned()
    }

    /// Whether a handler is registered for `event_type`.
    pub fn contains(&self, event_type: &str) -> bool {
        self.lock().contains_key(event_type)
    }

    /// Runs the handler for `event_type` on `payload`, if there is one.
    ///
    /// The handler runs after the registry lock is released, so a handler may
    /// itself register or remove handlers.
    pub fn dispatch(&self, event_type: &str, payload: &Value) -> DispatchOutcome {
        let Some(handler) = self.get_handler(event_type) else {
            return DispatchOutcome::Unhandled;
        };
        match handler(payload) {
            Ok(()) => DispatchOutcome::Delivered,
            Err(e) => DispatchOutcome::Dropped(e),
        }
    }

    fn insert(&self, event_type: String, handler: EventHandler) -> bool {
        self.lock().insert(event_type, handler).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, EventHandler>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<String> = self.lock().keys().cloned().collect();
        types.sort();
        f.debug_struct("EventRegistry")
            .field("event_types", &types)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use obsws_core::protocol::events::{HeartbeatEvent, SwitchScenesEvent};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn switch_scenes(name: &str) -> Value {
        json!({ "update-type": "SwitchScenes", "scene-name": name, "sources": [] })
    }

    #[test]
    fn test_typed_handler_receives_decoded_event() {
        // Arrange
        let registry = EventRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.set_handler(move |event: SwitchScenesEvent| {
            sink.lock().unwrap().push(event.scene_name);
        });

        // Act
        let outcome = registry.dispatch("SwitchScenes", &switch_scenes("Live"));

        // Assert
        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert_eq!(*seen.lock().unwrap(), ["Live"]);
    }

    #[test]
    fn test_unregistered_type_is_unhandled() {
        let registry = EventRegistry::new();
        assert_eq!(
            registry.dispatch("SwitchScenes", &switch_scenes("Live")),
            DispatchOutcome::Unhandled
        );
    }

    #[test]
    fn test_second_registration_replaces_first() {
        // Arrange
        let registry = EventRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&first);
        let s = Arc::clone(&second);

        // Act
        let replaced_first = registry.set_raw_handler("Exiting", move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let replaced_second = registry.set_raw_handler("Exiting", move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        registry.dispatch("Exiting", &json!({ "update-type": "Exiting" }));

        // Assert: only the latest handler ran, exactly once.
        assert!(!replaced_first);
        assert!(replaced_second);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_payload_that_does_not_decode_is_dropped() {
        let registry = EventRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        registry.set_handler(move |_: HeartbeatEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        // `pulse` must be a boolean.
        let outcome = registry.dispatch("Heartbeat", &json!({ "pulse": "yes" }));

        assert!(matches!(outcome, DispatchOutcome::Dropped(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remove_handler() {
        let registry = EventRegistry::new();
        registry.set_raw_handler("Exiting", |_| {});

        assert!(registry.contains("Exiting"));
        assert!(registry.remove_handler("Exiting"));
        assert!(!registry.remove_handler("Exiting"));
        assert!(registry.get_handler("Exiting").is_none());
    }

    #[test]
    fn test_handler_may_replace_itself_while_running() {
        // The registry lock must not be held while a handler runs.
        let registry = Arc::new(EventRegistry::new());
        let inner = Arc::clone(&registry);
        registry.set_raw_handler("Exiting", move |_| {
            inner.set_raw_handler("Exiting", |_| {});
        });

        let outcome = registry.dispatch("Exiting", &json!({}));

        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert!(registry.contains("Exiting"));
    }

    #[test]
    fn test_debug_lists_registered_types() {
        let registry = EventRegistry::new();
        registry.set_raw_handler("StreamStarted", |_| {});
        registry.set_handler(|_: SwitchScenesEvent| {});
        let text = format!("{registry:?}");
        assert!(text.contains("StreamStarted"));
        assert!(text.contains("SwitchScenes"));
    }
}
