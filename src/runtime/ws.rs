//! tokio-tungstenite transport and tokio timers

use std::collections::HashMap;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::channel::{ChannelEvent, ConnectionId, Connector, Timer, TimerId, Transport};
use crate::error::TransportError;

/// Opens WebSocket connections, reporting lifecycle events to the driver
pub struct WsConnector {
    events: mpsc::UnboundedSender<ChannelEvent>,
    connect_timeout: Duration,
}

impl WsConnector {
    /// `connect_timeout` bounds the handshake of every connection it opens
    pub fn new(events: mpsc::UnboundedSender<ChannelEvent>, connect_timeout: Duration) -> Self {
        Self {
            events,
            connect_timeout,
        }
    }
}

impl Connector for WsConnector {
    fn open(&mut self, url: &str, id: ConnectionId) -> Box<dyn Transport> {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(run_connection(
            url.to_string(),
            id,
            self.connect_timeout,
            self.events.clone(),
            outgoing_rx,
            shutdown_rx,
        ));

        Box::new(WsTransport {
            outgoing: outgoing_tx,
            shutdown: Some(shutdown_tx),
        })
    }
}

/// Handle to one connection task
///
/// Dropping it also stops the task.
struct WsTransport {
    outgoing: mpsc::UnboundedSender<Message>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.outgoing
            .send(Message::text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Owns one socket: connects, pumps frames both ways, reports lifecycle
///
/// Once shut down by the channel it reports nothing further.
async fn run_connection(
    url: String,
    id: ConnectionId,
    connect_timeout: Duration,
    events: mpsc::UnboundedSender<ChannelEvent>,
    mut outgoing: mpsc::UnboundedReceiver<Message>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let stream = tokio::select! {
        _ = &mut shutdown => return,
        result = timeout(connect_timeout, connect_async(url.as_str())) => match result {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                let _ = events.send(ChannelEvent::Errored(id, e.to_string()));
                return;
            }
            Err(_) => {
                let _ = events.send(ChannelEvent::Errored(id, "connect timed out".to_string()));
                return;
            }
        },
    };
    let _ = events.send(ChannelEvent::Opened(id));

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = sink.send(Message::Close(None)).await;
                return;
            }
            Some(message) = outgoing.recv() => {
                if let Err(e) = sink.send(message).await {
                    let _ = events.send(ChannelEvent::Errored(id, e.to_string()));
                    return;
                }
            }
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(ChannelEvent::Message(id, text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(_))) => {
                    let _ = events.send(ChannelEvent::Closing(id));
                }
                Some(Ok(other)) => {
                    debug!(connection = %id, kind = ?other, "ignoring non-text frame");
                }
                Some(Err(e)) => {
                    let _ = events.send(ChannelEvent::Errored(id, e.to_string()));
                    return;
                }
                None => {
                    let _ = events.send(ChannelEvent::Closed(id));
                    return;
                }
            },
        }
    }
}

/// [`Timer`] backed by `tokio::time::sleep` tasks
pub struct TokioTimer {
    events: mpsc::UnboundedSender<ChannelEvent>,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioTimer {
    pub fn new(events: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        Self {
            events,
            tasks: HashMap::new(),
        }
    }
}

impl Timer for TokioTimer {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        self.tasks.retain(|_, task| !task.is_finished());

        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ChannelEvent::RetryFired(id));
        });
        self.tasks.insert(id, task);
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
