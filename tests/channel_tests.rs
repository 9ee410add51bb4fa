//! Event channel integration tests
//!
//! Drives the channel state machine with the in-memory connector and manual
//! timer to cover:
//! - Subscription replay after open and reconnect
//! - Reconnect timer scheduling and cancellation
//! - Session loss and token rotation
//! - Inbound routing into the notification sink

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use inbox_realtime::channel::{ChannelEvent, ConnectionId, ConnectionState, EventChannel};
use inbox_realtime::protocol::{types, DomainEvent, Frame};
use inbox_realtime::testing::{ManualTimer, RecordingConnector};
use inbox_realtime::{ClientConfig, NotificationCategory, NotificationSink, SessionStore, SharedSink};
use proptest::prelude::*;

const RETRY: Duration = Duration::from_secs(3);

struct Harness {
    channel: EventChannel,
    connector: RecordingConnector,
    timer: ManualTimer,
    session: Arc<SessionStore>,
    sink: SharedSink,
}

impl Harness {
    fn new() -> Self {
        let session = Arc::new(SessionStore::new());
        let connector = RecordingConnector::new();
        let timer = ManualTimer::new();
        let sink = NotificationSink::default().shared();
        let channel = EventChannel::new(
            &ClientConfig::default(),
            Arc::clone(&session) as Arc<dyn inbox_realtime::SessionProvider>,
            Arc::clone(&sink),
            Box::new(connector.clone()),
            Box::new(timer.clone()),
        )
        .expect("default config resolves");

        Self {
            channel,
            connector,
            timer,
            session,
            sink,
        }
    }

    /// Logged in and connected
    fn open(token: &str) -> Self {
        let mut h = Self::new();
        h.login(token);
        let id = h.current();
        h.channel.handle(ChannelEvent::Opened(id));
        assert_eq!(h.channel.state(), ConnectionState::Open);
        h
    }

    fn login(&mut self, token: &str) {
        self.session.login(token);
        self.channel.handle(ChannelEvent::SessionChanged);
    }

    fn logout(&mut self) {
        self.session.logout();
        self.channel.handle(ChannelEvent::SessionChanged);
    }

    fn current(&self) -> ConnectionId {
        self.connector.last().expect("a connection was opened").id
    }

    fn inbound(&mut self, text: &str) {
        let id = self.current();
        self.channel.handle(ChannelEvent::Message(id, text.to_string()));
    }

    fn subscribes(&self, id: ConnectionId) -> Vec<String> {
        self.connector
            .sent_frames(id)
            .into_iter()
            .filter(|f| f.frame_type == types::SUBSCRIBE)
            .filter_map(|f| f.payload_topic().map(str::to_string))
            .collect()
    }
}

#[test]
fn test_open_subscribes_feed_then_registry_topics() {
    let mut h = Harness::new();
    h.channel.subscribe("conv-1").unwrap();
    h.channel.subscribe("conv-2").unwrap();
    h.channel.subscribe("conv-3").unwrap();

    h.login("tok");
    let id = h.current();
    assert!(h.subscribes(id).is_empty());

    h.channel.handle(ChannelEvent::Opened(id));
    let sent = h.subscribes(id);

    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0], "notifications");
    let rest: HashSet<&str> = sent[1..].iter().map(String::as_str).collect();
    assert_eq!(rest, HashSet::from(["conv-1", "conv-2", "conv-3"]));
}

#[test]
fn test_reconnect_replays_feed_then_conversation() {
    let mut h = Harness::open("tok");
    h.channel.subscribe("conv-42").unwrap();
    let first = h.current();

    h.channel.handle(ChannelEvent::Closed(first));
    assert_eq!(h.channel.state(), ConnectionState::ClosedPendingRetry);

    assert_eq!(h.timer.advance_and_fire(&mut h.channel, RETRY), 1);
    assert_eq!(h.channel.state(), ConnectionState::Connecting);

    let second = h.current();
    assert_ne!(first, second);
    h.channel.handle(ChannelEvent::Opened(second));

    assert_eq!(h.subscribes(second), vec!["notifications", "conv-42"]);
}

#[test]
fn test_retry_waits_for_full_delay() {
    let mut h = Harness::open("tok");
    let id = h.current();
    h.channel.handle(ChannelEvent::Closed(id));

    assert_eq!(h.timer.advance_and_fire(&mut h.channel, Duration::from_millis(2999)), 0);
    assert_eq!(h.connector.attempts(), 1);
    assert_eq!(h.timer.advance_and_fire(&mut h.channel, Duration::from_millis(1)), 1);
    assert_eq!(h.connector.attempts(), 2);
}

#[test]
fn test_reconnect_is_unbounded() {
    let mut h = Harness::open("tok");

    for attempt in 2..=20 {
        let id = h.current();
        h.channel
            .handle(ChannelEvent::Errored(id, "connection refused".to_string()));
        assert_eq!(h.channel.state(), ConnectionState::ClosedPendingRetry);
        h.timer.advance_and_fire(&mut h.channel, RETRY);
        assert_eq!(h.connector.attempts(), attempt);
    }
}

#[test]
fn test_disconnect_cancels_pending_retry() {
    let mut h = Harness::open("tok");
    let id = h.current();
    h.channel.handle(ChannelEvent::Closed(id));
    assert!(h.channel.pending_retry().is_some());

    h.channel.disconnect();

    assert_eq!(h.channel.state(), ConnectionState::Idle);
    assert!(h.timer.pending().is_empty());
    assert_eq!(h.timer.advance_and_fire(&mut h.channel, RETRY * 2), 0);
    assert_eq!(h.connector.attempts(), 1);
}

#[test]
fn test_stale_timer_after_disconnect_does_nothing() {
    let mut h = Harness::open("tok");
    let id = h.current();
    h.channel.handle(ChannelEvent::Closed(id));
    let timer = h.channel.pending_retry().unwrap();

    // Cancellation raced with a firing that was already queued
    h.channel.disconnect();
    h.channel.handle(ChannelEvent::RetryFired(timer));

    assert_eq!(h.channel.state(), ConnectionState::Idle);
    assert_eq!(h.connector.attempts(), 1);
}

#[test]
fn test_logout_while_open_goes_idle() {
    let mut h = Harness::open("tok");
    h.channel.subscribe("conv-1").unwrap();

    h.logout();

    assert_eq!(h.channel.state(), ConnectionState::Idle);
    assert!(h.timer.pending().is_empty());
    assert_eq!(h.connector.live_count(), 0);
    assert!(h.channel.registry().is_empty());
}

#[test]
fn test_logout_while_pending_cancels_retry() {
    let mut h = Harness::open("tok");
    let id = h.current();
    h.channel.handle(ChannelEvent::Closed(id));

    h.logout();

    assert_eq!(h.channel.state(), ConnectionState::Idle);
    assert_eq!(h.timer.advance_and_fire(&mut h.channel, RETRY * 2), 0);
    assert_eq!(h.connector.attempts(), 1);
}

#[test]
fn test_retry_fired_after_session_lost_settles_idle() {
    let mut h = Harness::open("tok");
    let id = h.current();
    h.channel.handle(ChannelEvent::Closed(id));

    // Session changed without the channel being told yet
    h.session.logout();
    h.timer.advance_and_fire(&mut h.channel, RETRY);

    assert_eq!(h.channel.state(), ConnectionState::Idle);
    assert_eq!(h.connector.attempts(), 1);
}

#[test]
fn test_login_from_idle_connects() {
    let mut h = Harness::new();
    assert_eq!(h.channel.state(), ConnectionState::Idle);

    h.login("tok");
    assert_eq!(h.channel.state(), ConnectionState::Connecting);
    assert!(h.connector.last().unwrap().url.ends_with("?token=tok"));
}

#[test]
fn test_token_change_forces_reconnect() {
    let mut h = Harness::open("old");
    let first = h.current();

    h.login("new");

    let second = h.current();
    assert_ne!(first, second);
    assert!(h.connector.last().unwrap().url.ends_with("?token=new"));
    assert_eq!(h.channel.state(), ConnectionState::Connecting);
    assert_eq!(h.connector.live_count(), 1);

    // Late callbacks from the old connection are ignored
    h.channel.handle(ChannelEvent::Closed(first));
    assert_eq!(h.channel.state(), ConnectionState::Connecting);
    assert!(h.timer.pending().is_empty());
}

#[test]
fn test_same_token_does_not_reconnect() {
    let mut h = Harness::open("tok");
    h.login("tok");
    assert_eq!(h.connector.attempts(), 1);
    assert_eq!(h.channel.state(), ConnectionState::Open);
}

#[derive(Debug, Clone)]
enum Op {
    Login(u8),
    Logout,
    LogoutUnnoticed,
    Connect,
    Disconnect,
    Opened,
    Closing,
    Closed,
    Errored,
    Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..3).prop_map(Op::Login),
        2 => Just(Op::Logout),
        1 => Just(Op::LogoutUnnoticed),
        3 => Just(Op::Connect),
        2 => Just(Op::Disconnect),
        3 => Just(Op::Opened),
        1 => Just(Op::Closing),
        2 => Just(Op::Closed),
        2 => Just(Op::Errored),
        3 => (0u64..4000).prop_map(Op::Advance),
    ]
}

fn apply(h: &mut Harness, op: &Op) {
    let last = h.connector.last().map(|c| c.id);
    match op {
        Op::Login(n) => h.login(&format!("tok-{}", n)),
        Op::Logout => h.logout(),
        Op::LogoutUnnoticed => h.session.logout(),
        Op::Connect => h.channel.connect(),
        Op::Disconnect => h.channel.disconnect(),
        Op::Opened => {
            if let Some(id) = last {
                h.channel.handle(ChannelEvent::Opened(id));
            }
        }
        Op::Closing => {
            if let Some(id) = last {
                h.channel.handle(ChannelEvent::Closing(id));
            }
        }
        Op::Closed => {
            if let Some(id) = last {
                h.channel.handle(ChannelEvent::Closed(id));
            }
        }
        Op::Errored => {
            if let Some(id) = last {
                h.channel.handle(ChannelEvent::Errored(id, "reset".to_string()));
            }
        }
        Op::Advance(ms) => {
            h.timer.advance_and_fire(&mut h.channel, Duration::from_millis(*ms));
        }
    }
}

proptest! {
    #[test]
    fn test_at_most_one_live_transport(ops in proptest::collection::vec(op(), 0..80)) {
        let mut h = Harness::new();
        for op in &ops {
            apply(&mut h, op);

            let state = h.channel.state();
            let holds_transport = matches!(
                state,
                ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Closing
            );
            prop_assert!(h.connector.live_count() <= 1);
            prop_assert_eq!(h.connector.live_count(), usize::from(holds_transport));

            let retry_pending = state == ConnectionState::ClosedPendingRetry;
            prop_assert_eq!(h.timer.pending().len(), usize::from(retry_pending));

            if matches!(op, Op::Logout) {
                prop_assert_eq!(state, ConnectionState::Idle);
            }
        }
    }
}

#[test]
fn test_subscribe_while_open_sends_immediately() {
    let mut h = Harness::open("tok");
    let id = h.current();

    assert!(h.channel.subscribe("conv-7").unwrap());
    assert!(!h.channel.subscribe("conv-7").unwrap());
    assert!(h.channel.unsubscribe("conv-7").unwrap());
    assert!(!h.channel.unsubscribe("conv-7").unwrap());

    let frames = h.connector.sent_frames(id);
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[1], Frame::subscribe("conv-7"));
    assert_eq!(frames[2], Frame::unsubscribe("conv-7"));
    assert_eq!(frames[3], Frame::unsubscribe("conv-7"));
}

#[test]
fn test_unsubscribe_feed_while_open_sends_frame() {
    let mut h = Harness::open("tok");
    let id = h.current();

    assert!(!h.channel.unsubscribe("notifications").unwrap());

    let frames = h.connector.sent_frames(id);
    assert_eq!(frames.last(), Some(&Frame::unsubscribe("notifications")));
}

#[test]
fn test_unsubscribe_while_closed_sends_nothing() {
    let mut h = Harness::open("tok");
    h.channel.subscribe("conv-3").unwrap();
    let first = h.current();
    h.channel.handle(ChannelEvent::Closed(first));

    assert!(h.channel.unsubscribe("conv-3").unwrap());
    assert!(!h.channel.registry().contains("conv-3"));
    assert_eq!(h.connector.sent_frames(first).len(), 2);
}

#[test]
fn test_subscribe_while_closed_is_recorded_only() {
    let mut h = Harness::open("tok");
    let first = h.current();
    h.channel.handle(ChannelEvent::Closed(first));

    h.channel.subscribe("conv-9").unwrap();
    assert_eq!(h.connector.sent_frames(first).len(), 1);
    assert!(h.channel.registry().contains("conv-9"));
}

#[test]
fn test_message_created_adds_notification() {
    let mut h = Harness::open("tok");
    let mut events = h.channel.events();

    h.inbound(r#"{"type":"message.created","payload":{"content":"Preciso de ajuda com meu pedido","conversation_id":"conv-5"},"room":"conv-5"}"#);

    let sink = h.sink.lock();
    assert_eq!(sink.unread_count(), 1);
    let n = sink.notifications().next().unwrap();
    assert_eq!(n.category, NotificationCategory::Message);
    assert_eq!(n.body, "Preciso de ajuda com meu pedido");
    assert_eq!(n.conversation_id.as_deref(), Some("conv-5"));

    let routed = events.try_recv().unwrap();
    assert_eq!(routed.topic.as_deref(), Some("conv-5"));
    assert!(matches!(routed.event, DomainEvent::MessageCreated(_)));
}

#[test]
fn test_conversation_updated_status_filter() {
    let mut h = Harness::open("tok");

    h.inbound(r#"{"type":"conversation.updated","payload":{"id":"c1","status":"pending"}}"#);
    assert_eq!(h.sink.lock().len(), 0);

    h.inbound(r#"{"type":"conversation.updated","payload":{"id":"c1","status":"open"}}"#);
    assert_eq!(h.sink.lock().len(), 1);
}

#[test]
fn test_malformed_frames_leave_connection_open() {
    let mut h = Harness::open("tok");

    h.inbound("definitely not json");
    h.inbound(r#"{"type":"message.created","payload":"oops"}"#);
    h.inbound(r#"{"type":"agent.typing","payload":{}}"#);

    assert_eq!(h.channel.state(), ConnectionState::Open);
    assert_eq!(h.sink.lock().len(), 0);
    assert!(h.timer.pending().is_empty());
}

#[test]
fn test_frames_from_stale_connection_ignored() {
    let mut h = Harness::open("old");
    let first = h.current();
    h.login("new");

    h.channel.handle(ChannelEvent::Message(
        first,
        r#"{"type":"conversation.created","payload":{"id":"c1"}}"#.to_string(),
    ));
    assert_eq!(h.sink.lock().len(), 0);
}
