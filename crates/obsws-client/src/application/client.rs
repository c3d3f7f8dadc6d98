//! The client: connection manager and request issuer.
//!
//! # Lifecycle
//!
//! 1. [`Client::connect`] opens a WebSocket (or [`Client::connect_with`]
//!    attaches any transport), spawns the dispatch loop, and asks the server
//!    whether authentication is required.
//! 2. If it is, [`Client::authenticate`] answers the challenge.  Until then
//!    every ordinary request fails with [`ClientError::NotAuthenticated`].
//! 3. [`Client::call`] and friends issue requests.  Any number may be in
//!    flight at once; replies are matched to callers by id, not by order.
//! 4. [`Client::close`] ends the session.  A transport failure ends it too, in
//!    which case the loss is reported on [`ConnectOutcome::notices`].
//!
//! # Locks
//!
//! Three independent locks exist and none is ever held while taking another:
//! the correlation table's, the event registry's, and the async writer lock.
//! The writer lock is the only one held across an `.await` (the socket write
//! itself), which keeps frames from interleaving.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use obsws_core::protocol::requests::{Authenticate, GetAuthRequired};
use obsws_core::{decode_payload, encode_params, Codec, Event, JsonCodec, Request, RequestId};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::correlation::CorrelationTable;
use crate::application::dispatch;
use crate::application::event_registry::EventRegistry;
use crate::application::transport::{FrameReader, FrameWriter};
use crate::domain::config::ClientConfig;
use crate::domain::error::{ClientError, ConnectionEvent, TransportError};
use crate::domain::state::ConnectionState;
use crate::infrastructure::websocket;

// ── Shared state ──────────────────────────────────────────────────────────────

/// Everything the client and its dispatch loop share.
pub(crate) struct ClientShared {
    pub(crate) state: ConnectionState,
    pub(crate) table: CorrelationTable,
    pub(crate) events: EventRegistry,
    pub(crate) codec: Arc<dyn Codec>,
    pub(crate) writer: tokio::sync::Mutex<Option<Box<dyn FrameWriter>>>,
}

impl ClientShared {
    pub(crate) fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            state: ConnectionState::new(),
            table: CorrelationTable::new(),
            events: EventRegistry::new(),
            codec,
            writer: tokio::sync::Mutex::new(None),
        }
    }

    /// Ends the session: clears both flags, detaches and closes the writer,
    /// and fails every pending call with `reason`.
    ///
    /// The writer is detached before the table is drained.  A call that
    /// registers after the drain then finds no writer and fails on its own
    /// instead of waiting on a reply that can never come.
    pub(crate) async fn tear_down(&self, reason: ClientError) {
        self.state.reset();
        let writer = self.writer.lock().await.take();

        let cancelled = self.table.cancel_all(reason);
        if cancelled > 0 {
            debug!("failed {cancelled} pending request(s) on teardown");
        }

        if let Some(mut writer) = writer {
            if let Err(e) = writer.close().await {
                debug!("error while closing transport: {e}");
            }
        }
    }
}

/// Which readiness check a request must pass before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Handshake requests: only an open connection is needed.
    Bootstrap,
    /// Everything else: the session must be ready.
    Ready,
}

/// Removes a correlation entry when the waiting call goes away for any reason
/// (reply, deadline, failed write, or the caller dropping the future).
struct PendingGuard<'a> {
    table: &'a CorrelationTable,
    id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.table.remove(&self.id);
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// What [`Client::connect`] learned about the new session.
#[derive(Debug)]
pub struct ConnectOutcome {
    /// Whether [`Client::authenticate`] must be called before other requests.
    pub auth_required: bool,

    /// Connection-level notifications: id-less server errors and the final
    /// [`ConnectionEvent::Lost`] when the transport fails.
    pub notices: mpsc::UnboundedReceiver<ConnectionEvent>,
}

/// An obs-websocket client.
///
/// All methods take `&self`, so a `Client` can be wrapped in an [`Arc`] and
/// used from many tasks at once.
pub struct Client {
    config: ClientConfig,
    shared: Arc<ClientShared>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// Creates an unconnected client using the obs-websocket JSON envelope.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_codec(config, Arc::new(JsonCodec))
    }

    /// Creates an unconnected client with a custom codec.
    pub fn with_codec(config: ClientConfig, codec: Arc<dyn Codec>) -> Self {
        Self {
            config,
            shared: Arc::new(ClientShared::new(codec)),
            dispatch: Mutex::new(None),
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens a WebSocket to `address` and runs the bootstrap handshake.
    ///
    /// `address` may be `host:port` or a full `ws://` URL.
    ///
    /// # Errors
    ///
    /// - [`ClientError::AlreadyConnected`] if a session is open.
    /// - [`ClientError::Transport`] if the socket cannot be opened.
    /// - Any error of the bootstrap `GetAuthRequired` request; the transport
    ///   is closed again before it is returned.
    pub async fn connect(&self, address: &str) -> Result<ConnectOutcome, ClientError> {
        if self.shared.state.is_connected() {
            return Err(ClientError::AlreadyConnected);
        }
        let (reader, writer) = websocket::open(address, self.config.connect_timeout).await?;
        self.connect_with(Box::new(reader), Box::new(writer)).await
    }

    /// Connects to the configured address and, when the server asks for it,
    /// authenticates with the configured password.
    ///
    /// If authentication is required but no password is configured the
    /// session is left connected but not ready.
    pub async fn connect_from_config(&self) -> Result<ConnectOutcome, ClientError> {
        let outcome = self.connect(&self.config.address).await?;
        if outcome.auth_required {
            match self.config.password.as_deref() {
                Some(password) => self.authenticate(password).await?,
                None => warn!("server requires authentication but no password is configured"),
            }
        }
        Ok(outcome)
    }

    /// Attaches an already-open transport and runs the bootstrap handshake.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect), minus the socket errors.
    pub async fn connect_with(
        &self,
        reader: Box<dyn FrameReader>,
        writer: Box<dyn FrameWriter>,
    ) -> Result<ConnectOutcome, ClientError> {
        if !self.shared.state.try_mark_connected() {
            return Err(ClientError::AlreadyConnected);
        }
        *self.shared.writer.lock().await = Some(writer);

        let (tx, notices) = mpsc::unbounded_channel();
        let task = tokio::spawn(dispatch::run(reader, Arc::downgrade(&self.shared), tx));
        if let Some(stale) = self.lock_dispatch().replace(task) {
            stale.abort();
        }

        let status = match self
            .call_gated(&GetAuthRequired::default(), Gate::Bootstrap, self.config.request_timeout)
            .await
        {
            Ok(status) => status,
            Err(e) => {
                warn!("bootstrap request failed: {e}");
                self.shut_down(ClientError::Transport(TransportError::Closed))
                    .await;
                return Err(e);
            }
        };

        let auth_required = match status.challenge() {
            Some(challenge) => {
                self.shared.state.set_challenge(challenge);
                info!("connected; server requires authentication");
                true
            }
            None => {
                self.shared.state.mark_ready();
                info!("connected; no authentication required");
                false
            }
        };

        Ok(ConnectOutcome {
            auth_required,
            notices,
        })
    }

    /// Answers the pending authentication challenge with `password`.
    ///
    /// Succeeds immediately when the session is already ready.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotConnected`] without an open session.
    /// - [`ClientError::NoPendingChallenge`] if the server issued no challenge.
    /// - [`ClientError::Protocol`] if the server rejects the password.  The
    ///   challenge stays pending, so the call may be retried.
    pub async fn authenticate(&self, password: &str) -> Result<(), ClientError> {
        let state = &self.shared.state;
        if !state.is_connected() {
            return Err(ClientError::NotConnected);
        }
        if state.is_ready() {
            return Ok(());
        }
        let challenge = state.challenge().ok_or(ClientError::NoPendingChallenge)?;

        let request = Authenticate {
            auth: challenge.respond(password),
        };
        self.call_gated(&request, Gate::Bootstrap, self.config.request_timeout)
            .await?;

        state.mark_ready();
        info!("authenticated");
        Ok(())
    }

    /// Sends `request` and waits for its typed reply, using the configured
    /// request timeout.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotConnected`] / [`ClientError::NotAuthenticated`]
    ///   before anything is sent.
    /// - [`ClientError::Protocol`] if the server answers with an error.
    /// - [`ClientError::Decode`] if the reply does not fit `R::Response`.
    /// - [`ClientError::Timeout`] if the deadline passes first.
    /// - [`ClientError::Transport`] if the connection fails meanwhile.
    pub async fn call<R: Request + Sync>(&self, request: &R) -> Result<R::Response, ClientError> {
        self.call_gated(request, Gate::Ready, self.config.request_timeout)
            .await
    }

    /// Like [`call`](Self::call) with an explicit deadline.  `None` waits
    /// until a reply arrives or the connection fails.
    pub async fn call_with_timeout<R: Request + Sync>(
        &self,
        request: &R,
        deadline: Option<Duration>,
    ) -> Result<R::Response, ClientError> {
        self.call_gated(request, Gate::Ready, deadline).await
    }

    /// Sends request `name` with JSON `params` and returns the whole reply
    /// object.
    ///
    /// `params` must be a JSON object or `null`.
    pub async fn call_raw(&self, name: &str, params: Value) -> Result<Value, ClientError> {
        self.issue(name, &params, Gate::Ready, self.config.request_timeout)
            .await
    }

    /// Registers `handler` for events of type `E`, replacing any previous
    /// handler for that type.  Returns `true` if one was replaced.
    ///
    /// Handlers run on the dispatch task, one event at a time.  A handler that
    /// waits on a reply from this same client would stall the connection.
    pub fn set_event_handler<E, F>(&self, handler: F) -> bool
    where
        E: Event,
        F: Fn(E) + Send + Sync + 'static,
    {
        self.shared.events.set_handler(handler)
    }

    /// Registers an untyped handler for `event_type`.  Returns `true` if a
    /// handler was replaced.
    pub fn set_raw_event_handler<F>(&self, event_type: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.shared.events.set_raw_handler(event_type, handler)
    }

    /// Removes the handler for `event_type`.  Returns `true` if one existed.
    pub fn remove_event_handler(&self, event_type: &str) -> bool {
        self.shared.events.remove_handler(event_type)
    }

    /// Whether a handler is registered for `event_type`.
    pub fn has_event_handler(&self, event_type: &str) -> bool {
        self.shared.events.contains(event_type)
    }

    /// Closes the session.
    ///
    /// Every pending call fails with `Transport(Closed)`.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotConnected`] if no session is open.
    pub async fn close(&self) -> Result<(), ClientError> {
        if !self.shared.state.is_connected() {
            return Err(ClientError::NotConnected);
        }
        self.shut_down(ClientError::Transport(TransportError::Closed))
            .await;
        info!("connection closed");
        Ok(())
    }

    /// `true` while a transport is attached.
    pub fn is_connected(&self) -> bool {
        self.shared.state.is_connected()
    }

    /// `true` once authentication succeeded or was not required.
    pub fn is_ready(&self) -> bool {
        self.shared.state.is_ready()
    }

    /// Number of requests waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.shared.table.len()
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    async fn call_gated<R: Request + Sync>(
        &self,
        request: &R,
        gate: Gate,
        deadline: Option<Duration>,
    ) -> Result<R::Response, ClientError> {
        let params = encode_params(request).map_err(|e| ClientError::Encode(e.to_string()))?;
        let payload = self.issue(R::NAME, &params, gate, deadline).await?;
        decode_payload(&payload).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn issue(
        &self,
        name: &str,
        params: &Value,
        gate: Gate,
        deadline: Option<Duration>,
    ) -> Result<Value, ClientError> {
        let shared = &self.shared;
        if !shared.state.is_connected() {
            return Err(ClientError::NotConnected);
        }
        if gate == Gate::Ready && !shared.state.is_ready() {
            return Err(ClientError::NotAuthenticated);
        }

        let id = RequestId::generate();
        let frame = shared
            .codec
            .encode_request(name, &id, params)
            .map_err(|e| ClientError::Encode(e.to_string()))?;

        // Register before writing so even an instant reply finds its caller.
        let reply = shared.table.register(id.clone())?;
        let _guard = PendingGuard {
            table: &shared.table,
            id: id.clone(),
        };

        {
            let mut writer = shared.writer.lock().await;
            let writer = writer.as_mut().ok_or(ClientError::NotConnected)?;
            writer.send_text(frame).await?;
        }
        debug!("sent {name} as {id}");

        let received = match deadline {
            Some(after) => match tokio::time::timeout(after, reply).await {
                Ok(received) => received,
                Err(_) => {
                    warn!("{name} ({id}) got no reply within {after:?}");
                    return Err(ClientError::Timeout {
                        request: name.to_owned(),
                        after,
                    });
                }
            },
            None => reply.await,
        };

        // A dropped sink means the table was torn down underneath us.
        received.unwrap_or(Err(ClientError::Transport(TransportError::Closed)))
    }

    async fn shut_down(&self, reason: ClientError) {
        if let Some(task) = self.lock_dispatch().take() {
            task.abort();
        }
        self.shared.tear_down(reason).await;
    }

    fn lock_dispatch(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(task) = self.lock_dispatch().take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("address", &self.config.address)
            .field("connected", &self.is_connected())
            .field("ready", &self.is_ready())
            .field("pending_requests", &self.pending_requests())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
