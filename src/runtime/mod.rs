//! Async runtime driver
//!
//! [`LiveClient`] runs an [`EventChannel`] on a single tokio task. Commands
//! from the public API, transport callbacks, timer firings and session
//! changes all arrive on that task and are applied one at a time, so the
//! channel, its registry and the sink never see concurrent callbacks.
//!
//! ## Usage
//! ```no_run
//! use std::sync::Arc;
//! use inbox_realtime::{ClientConfig, LiveClient, NotificationSink, SessionStore};
//!
//! # async fn run() -> inbox_realtime::ClientResult<()> {
//! let session = Arc::new(SessionStore::new());
//! let sink = NotificationSink::default().shared();
//! let client = LiveClient::spawn(&ClientConfig::default(), Arc::clone(&session), sink)?;
//!
//! session.login("eyJhbGciOi...");          // connects
//! client.subscribe("conv-42")?;            // replayed on every reconnect
//! session.logout();                        // disconnects
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod ws;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use ws::{TokioTimer, WsConnector};

use crate::channel::{ChannelEvent, ConnectionState, EventChannel};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::protocol::Frame;
use crate::registry::validate_topic;
use crate::router::RoutedEvent;
use crate::session::{SessionState, SessionStore};
use crate::sink::SharedSink;

/// Requests from [`LiveClient`] to the driver task
#[derive(Debug)]
enum Command {
    Connect,
    Disconnect,
    Send(Frame),
    Subscribe(String),
    Unsubscribe(String),
    Shutdown,
}

/// Handle to a running real-time client
pub struct LiveClient {
    commands: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    events_tx: broadcast::Sender<RoutedEvent>,
    sink: SharedSink,
    task: JoinHandle<()>,
}

impl LiveClient {
    /// Spawn the driver task on the current tokio runtime
    ///
    /// The client connects as soon as `session` is authenticated and follows
    /// every later login, logout and token change.
    pub fn spawn(config: &ClientConfig, session: Arc<SessionStore>, sink: SharedSink) -> ClientResult<Self> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let connector = WsConnector::new(inbound_tx.clone(), config.connect_timeout());
        let timer = TokioTimer::new(inbound_tx);

        let session_rx = session.subscribe();
        let channel = EventChannel::new(
            config,
            session,
            Arc::clone(&sink),
            Box::new(connector),
            Box::new(timer),
        )?;

        let events_tx = channel.event_sender();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(channel.state());

        let task = tokio::spawn(drive(channel, command_rx, inbound_rx, session_rx, state_tx));

        Ok(Self {
            commands,
            state_rx,
            events_tx,
            sink,
            task,
        })
    }

    fn command(&self, command: Command) -> ClientResult<()> {
        self.commands.send(command).map_err(|_| ClientError::Shutdown)
    }

    /// Ask the channel to connect (no-op without a token or when connected)
    pub fn connect(&self) -> ClientResult<()> {
        self.command(Command::Connect)
    }

    /// Close the connection and cancel any pending reconnect
    pub fn disconnect(&self) -> ClientResult<()> {
        self.command(Command::Disconnect)
    }

    /// Send a frame; dropped unless the connection is open
    pub fn send(&self, frame: Frame) -> ClientResult<()> {
        self.command(Command::Send(frame))
    }

    /// Follow a topic, now and after every reconnect
    pub fn subscribe(&self, topic: &str) -> ClientResult<()> {
        let topic = validate_topic(topic)?;
        self.command(Command::Subscribe(topic.to_string()))
    }

    /// Stop following a topic
    pub fn unsubscribe(&self, topic: &str) -> ClientResult<()> {
        let topic = validate_topic(topic)?;
        self.command(Command::Unsubscribe(topic.to_string()))
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch connection state changes
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Wait until the connection reaches `target`
    pub async fn wait_for_state(&self, target: ConnectionState) -> ClientResult<()> {
        let mut rx = self.state_rx.clone();
        rx.wait_for(|state| *state == target)
            .await
            .map(|_| ())
            .map_err(|_| ClientError::Shutdown)
    }

    /// Receive routed domain events
    pub fn events(&self) -> broadcast::Receiver<RoutedEvent> {
        self.events_tx.subscribe()
    }

    /// The notification sink fed by this client
    pub fn sink(&self) -> SharedSink {
        Arc::clone(&self.sink)
    }

    /// Disconnect and stop the driver task
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            warn!(error = %e, "client task ended abnormally");
        }
    }
}

async fn drive(
    mut channel: EventChannel,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut inbound: mpsc::UnboundedReceiver<ChannelEvent>,
    mut session: watch::Receiver<SessionState>,
    state_tx: watch::Sender<ConnectionState>,
) {
    session.borrow_and_update();
    channel.handle(ChannelEvent::SessionChanged);
    publish(&state_tx, &channel);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => apply(&mut channel, command),
            },
            Some(event) = inbound.recv() => channel.handle(event),
            Ok(()) = session.changed() => {
                session.borrow_and_update();
                channel.handle(ChannelEvent::SessionChanged);
            }
        }
        publish(&state_tx, &channel);
    }

    channel.disconnect();
    publish(&state_tx, &channel);
    debug!("client task stopped");
}

fn apply(channel: &mut EventChannel, command: Command) {
    match command {
        Command::Connect => channel.connect(),
        Command::Disconnect => channel.disconnect(),
        Command::Send(frame) => {
            channel.send(&frame);
        }
        Command::Subscribe(topic) => {
            if let Err(e) = channel.subscribe(&topic) {
                warn!(error = %e, "subscribe rejected");
            }
        }
        Command::Unsubscribe(topic) => {
            if let Err(e) = channel.unsubscribe(&topic) {
                warn!(error = %e, "unsubscribe rejected");
            }
        }
        Command::Shutdown => {}
    }
}

fn publish(state_tx: &watch::Sender<ConnectionState>, channel: &EventChannel) {
    let state = channel.state();
    state_tx.send_if_modified(|current| {
        if *current == state {
            return false;
        }
        *current = state;
        true
    });
}
