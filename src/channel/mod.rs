//! Event channel
//!
//! The reconnecting, authenticated connection to the real-time endpoint,
//! written as an explicit state machine. Public operations (`connect`,
//! `disconnect`, `send`, `subscribe`, `unsubscribe`) return immediately;
//! transport callbacks, timer firings and session changes are fed back in
//! through [`EventChannel::handle`], one at a time.
//!
//! ## Guarantees
//! - At most one transport exists at any time. A new one is only opened after
//!   the previous one has been closed and dropped.
//! - Every transition into `Open` sends the personal feed subscribe first,
//!   then one subscribe per registry topic.
//! - A reconnect timer that was cancelled, or superseded, does nothing when it
//!   fires: its id no longer matches the pending timer.
//! - Losing authentication goes straight to `Idle` with no timer running.

mod state;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub use state::{ChannelEvent, ConnectionId, ConnectionState, TimerId};
pub use transport::{Connector, Timer, Transport};

use crate::config::{connection_url, ClientConfig};
use crate::error::{ClientResult, ConfigError};
use crate::protocol::Frame;
use crate::registry::{validate_topic, SubscriptionRegistry};
use crate::router::{MessageRouter, RoutedEvent};
use crate::session::SessionProvider;
use crate::sink::SharedSink;

/// Buffered routed events per listener before it starts lagging
const EVENT_BUFFER: usize = 256;

/// The transport currently owned by the channel
struct Link {
    id: ConnectionId,
    transport: Box<dyn Transport>,
}

/// Reconnecting real-time connection
pub struct EventChannel {
    base_url: String,
    feed_topic: String,
    retry_delay: Duration,

    session: Arc<dyn SessionProvider>,
    sink: SharedSink,
    router: MessageRouter,
    registry: SubscriptionRegistry,
    connector: Box<dyn Connector>,
    timer: Box<dyn Timer>,
    events_tx: broadcast::Sender<RoutedEvent>,

    state: ConnectionState,
    link: Option<Link>,
    /// Token used by the current or most recent connection attempt
    token: Option<String>,
    /// Authentication flag as last observed on a session change
    authenticated: bool,
    pending_retry: Option<TimerId>,
    next_connection: u64,
    next_timer: u64,
}

impl EventChannel {
    /// Create an idle channel
    ///
    /// Fails only if the connection address cannot be resolved from `config`.
    pub fn new(
        config: &ClientConfig,
        session: Arc<dyn SessionProvider>,
        sink: SharedSink,
        connector: Box<dyn Connector>,
        timer: Box<dyn Timer>,
    ) -> Result<Self, ConfigError> {
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let authenticated = session.is_authenticated();

        Ok(Self {
            base_url: config.endpoint()?,
            feed_topic: config.feed_topic.clone(),
            retry_delay: config.retry_delay(),
            session,
            sink,
            router: MessageRouter::new(),
            registry: SubscriptionRegistry::new(),
            connector,
            timer,
            events_tx,
            state: ConnectionState::Idle,
            link: None,
            token: None,
            authenticated,
            pending_retry: None,
            next_connection: 0,
            next_timer: 0,
        })
    }

    /// Replace the message router
    pub fn with_router(mut self, router: MessageRouter) -> Self {
        self.router = router;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Personal notification feed topic
    pub fn feed_topic(&self) -> &str {
        &self.feed_topic
    }

    /// Base address connections are opened against (without the token)
    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    /// Pending reconnect timer, if any
    pub fn pending_retry(&self) -> Option<TimerId> {
        self.pending_retry
    }

    /// Receive every routed domain event
    pub fn events(&self) -> broadcast::Receiver<RoutedEvent> {
        self.events_tx.subscribe()
    }

    /// Sender half of the routed event broadcast
    pub fn event_sender(&self) -> broadcast::Sender<RoutedEvent> {
        self.events_tx.clone()
    }

    /// Start connecting
    ///
    /// No-op while `Connecting` or `Open`, and when the session has no
    /// authenticated token. Any previous transport is closed first.
    pub fn connect(&mut self) {
        if self.state.is_active() {
            return;
        }

        let session = self.session.snapshot();
        let Some(token) = session.usable_token() else {
            debug!("connect skipped: session has no token");
            return;
        };
        let token = token.to_string();

        self.cancel_retry();
        self.drop_link();
        self.open_link(token);
    }

    /// Tear down the connection and any pending reconnect
    pub fn disconnect(&mut self) {
        self.cancel_retry();
        if self.link.is_some() {
            info!(endpoint = %self.base_url, "🔌 disconnecting");
        }
        self.drop_link();
        self.state = ConnectionState::Idle;
    }

    /// Send a frame if the connection is open
    ///
    /// Frames sent in any other state are dropped. Returns whether the frame
    /// was handed to the transport.
    pub fn send(&mut self, frame: &Frame) -> bool {
        if self.state != ConnectionState::Open {
            debug!(frame_type = %frame.frame_type, state = %self.state, "dropping frame: connection not open");
            return false;
        }
        let Some(link) = self.link.as_mut() else {
            return false;
        };

        match link.transport.send_text(frame.to_text()) {
            Ok(()) => true,
            Err(e) => {
                debug!(connection = %link.id, error = %e, "dropping frame");
                false
            }
        }
    }

    /// Add a topic to the registry, subscribing on the wire if open
    ///
    /// Returns `Ok(false)` when the topic was already held. The personal feed
    /// topic is always implied and never stored.
    pub fn subscribe(&mut self, topic: &str) -> ClientResult<bool> {
        let topic = validate_topic(topic)?;
        if topic == self.feed_topic || !self.registry.insert(topic) {
            return Ok(false);
        }
        if self.state == ConnectionState::Open {
            self.send(&Frame::subscribe(topic));
        }
        Ok(true)
    }

    /// Remove a topic from the registry, unsubscribing on the wire if open
    ///
    /// The wire frame goes out whenever the connection is open, including for
    /// topics the registry does not hold such as the personal feed. Returns
    /// whether the topic was held.
    pub fn unsubscribe(&mut self, topic: &str) -> ClientResult<bool> {
        let topic = validate_topic(topic)?;
        let held = self.registry.remove(topic);
        if self.state == ConnectionState::Open {
            self.send(&Frame::unsubscribe(topic));
        }
        Ok(held)
    }

    /// Apply one asynchronous event
    pub fn handle(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened(id) => self.on_open(id),
            ChannelEvent::Message(id, text) => self.on_message(id, &text),
            ChannelEvent::Closing(id) => self.on_closing(id),
            ChannelEvent::Closed(id) => self.on_closed(id, None),
            ChannelEvent::Errored(id, reason) => self.on_closed(id, Some(reason)),
            ChannelEvent::RetryFired(timer) => self.on_retry(timer),
            ChannelEvent::SessionChanged => self.on_session_changed(),
        }
    }

    fn is_current(&self, id: ConnectionId) -> bool {
        self.link.as_ref().is_some_and(|link| link.id == id)
    }

    fn open_link(&mut self, token: String) {
        self.next_connection += 1;
        let id = ConnectionId(self.next_connection);
        let url = connection_url(&self.base_url, &token);

        info!(connection = %id, endpoint = %self.base_url, "connecting");
        let transport = self.connector.open(&url, id);

        self.link = Some(Link { id, transport });
        self.token = Some(token);
        self.state = ConnectionState::Connecting;
    }

    fn drop_link(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.transport.close();
        }
    }

    fn cancel_retry(&mut self) {
        if let Some(timer) = self.pending_retry.take() {
            debug!(timer = %timer, "cancelling reconnect");
            self.timer.cancel(timer);
        }
    }

    fn schedule_retry(&mut self) {
        self.next_timer += 1;
        let timer = TimerId(self.next_timer);
        self.pending_retry = Some(timer);
        self.timer.schedule(timer, self.retry_delay);
        self.state = ConnectionState::ClosedPendingRetry;
        let delay_ms = self.retry_delay.as_millis() as u64;
        info!(timer = %timer, delay_ms, "reconnect scheduled");
    }

    fn on_open(&mut self, id: ConnectionId) {
        if !self.is_current(id) || self.state != ConnectionState::Connecting {
            debug!(connection = %id, "ignoring stale open");
            return;
        }

        self.state = ConnectionState::Open;
        info!(connection = %id, "🔌 connected");

        let feed = Frame::subscribe(&self.feed_topic);
        self.send(&feed);

        let topics: Vec<String> = self
            .registry
            .topics()
            .filter(|topic| *topic != self.feed_topic)
            .map(str::to_string)
            .collect();
        for topic in topics {
            self.send(&Frame::subscribe(&topic));
        }
    }

    fn on_message(&mut self, id: ConnectionId, text: &str) {
        if !self.is_current(id) {
            debug!(connection = %id, "ignoring frame from stale connection");
            return;
        }

        let Some(routed) = self.router.route(text) else {
            return;
        };

        if let Some(content) = routed.notification.clone() {
            self.sink.lock().add(content);
        }
        // No listeners is fine
        let _ = self.events_tx.send(routed);
    }

    fn on_closing(&mut self, id: ConnectionId) {
        if self.is_current(id) && self.state == ConnectionState::Open {
            self.state = ConnectionState::Closing;
        }
    }

    fn on_closed(&mut self, id: ConnectionId, error: Option<String>) {
        if !self.is_current(id) {
            debug!(connection = %id, "ignoring close of stale connection");
            return;
        }

        match error {
            Some(reason) => warn!(connection = %id, error = %reason, "connection failed"),
            None => info!(connection = %id, "🔌 disconnected"),
        }

        self.drop_link();
        self.schedule_retry();
    }

    fn on_retry(&mut self, timer: TimerId) {
        if self.pending_retry != Some(timer) {
            debug!(timer = %timer, "ignoring stale reconnect timer");
            return;
        }
        self.pending_retry = None;

        if self.session.snapshot().usable_token().is_some() {
            self.connect();
        } else {
            debug!("reconnect skipped: session no longer authenticated");
            self.state = ConnectionState::Idle;
        }
    }

    fn on_session_changed(&mut self) {
        let session = self.session.snapshot();
        let was_authenticated = std::mem::replace(&mut self.authenticated, session.authenticated);

        let Some(token) = session.usable_token() else {
            if self.state != ConnectionState::Idle {
                info!("session ended, closing connection");
            }
            self.disconnect();
            self.token = None;
            if was_authenticated {
                self.registry.clear();
            }
            return;
        };

        let token_changed = self.token.as_deref() != Some(token);
        match self.state {
            ConnectionState::Idle => self.connect(),
            _ if token_changed => {
                info!("session token changed, reconnecting");
                self.disconnect();
                self.connect();
            }
            _ => {}
        }
    }
}
