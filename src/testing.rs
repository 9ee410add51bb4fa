//! In-memory fakes for driving an [`EventChannel`] without a network
//!
//! [`RecordingConnector`] records every transport the channel opens and every
//! frame sent on it. [`ManualTimer`] keeps a virtual clock that only moves
//! when a test calls [`ManualTimer::advance`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::channel::{ChannelEvent, ConnectionId, Connector, EventChannel, Timer, TimerId, Transport};
use crate::error::TransportError;
use crate::protocol::Frame;

/// One transport opened through a [`RecordingConnector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub url: String,
    pub sent: Vec<String>,
    pub closed: bool,
}

/// Connector that records connections instead of opening sockets
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    log: Arc<Mutex<Vec<ConnectionRecord>>>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every connection opened so far, oldest first
    pub fn connections(&self) -> Vec<ConnectionRecord> {
        self.log.lock().clone()
    }

    /// Number of connection attempts
    pub fn attempts(&self) -> usize {
        self.log.lock().len()
    }

    /// Number of transports not yet closed
    pub fn live_count(&self) -> usize {
        self.log.lock().iter().filter(|c| !c.closed).count()
    }

    /// Most recent connection
    pub fn last(&self) -> Option<ConnectionRecord> {
        self.log.lock().last().cloned()
    }

    /// Raw text frames sent on connection `id`
    pub fn sent_text(&self, id: ConnectionId) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.sent.clone())
            .unwrap_or_default()
    }

    /// Frames sent on connection `id`, parsed
    pub fn sent_frames(&self, id: ConnectionId) -> Vec<Frame> {
        self.sent_text(id)
            .iter()
            .filter_map(|text| Frame::parse(text).ok())
            .collect()
    }
}

impl Connector for RecordingConnector {
    fn open(&mut self, url: &str, id: ConnectionId) -> Box<dyn Transport> {
        self.log.lock().push(ConnectionRecord {
            id,
            url: url.to_string(),
            sent: Vec::new(),
            closed: false,
        });
        Box::new(RecordingTransport {
            id,
            log: Arc::clone(&self.log),
        })
    }
}

struct RecordingTransport {
    id: ConnectionId,
    log: Arc<Mutex<Vec<ConnectionRecord>>>,
}

impl Transport for RecordingTransport {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let mut log = self.log.lock();
        let record = log
            .iter_mut()
            .find(|c| c.id == self.id)
            .ok_or(TransportError::Closed)?;
        if record.closed {
            return Err(TransportError::Closed);
        }
        record.sent.push(text);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(record) = self.log.lock().iter_mut().find(|c| c.id == self.id) {
            record.closed = true;
        }
    }
}

#[derive(Debug, Default)]
struct Clock {
    now: Duration,
    pending: Vec<(TimerId, Duration)>,
}

/// Timer driven by a virtual clock
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    clock: Arc<Mutex<Clock>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduled timers that have not fired or been cancelled
    pub fn pending(&self) -> Vec<TimerId> {
        self.clock.lock().pending.iter().map(|(id, _)| *id).collect()
    }

    /// Move the clock forward, returning timers that came due (earliest first)
    pub fn advance(&self, by: Duration) -> Vec<TimerId> {
        let mut clock = self.clock.lock();
        clock.now += by;
        let now = clock.now;

        let mut due: Vec<(TimerId, Duration)> = Vec::new();
        clock.pending.retain(|&(id, deadline)| {
            if deadline <= now {
                due.push((id, deadline));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(id, deadline)| (deadline, id));
        due.into_iter().map(|(id, _)| id).collect()
    }

    /// Advance the clock and deliver due timers to `channel`
    ///
    /// Returns the number of timers fired.
    pub fn advance_and_fire(&self, channel: &mut EventChannel, by: Duration) -> usize {
        let due = self.advance(by);
        let fired = due.len();
        for id in due {
            channel.handle(ChannelEvent::RetryFired(id));
        }
        fired
    }
}

impl Timer for ManualTimer {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        let mut clock = self.clock.lock();
        let deadline = clock.now + delay;
        clock.pending.push((id, deadline));
    }

    fn cancel(&mut self, id: TimerId) {
        self.clock.lock().pending.retain(|(pending, _)| *pending != id);
    }
}
