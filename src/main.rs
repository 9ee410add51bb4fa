//! Inbox Realtime - Binary Entry Point
//!
//! Connects with the token in `INBOX_TOKEN`, follows the topics listed in
//! `INBOX_TOPICS` (comma separated) and logs every notification until Ctrl+C.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use inbox_realtime::sink::TerminalAlerter;
use inbox_realtime::utils::{clock_label, init_tracing};
use inbox_realtime::{
    ClientConfig, ClientResult, LiveClient, NotificationSink, RoutedEvent, SessionStore,
};

#[tokio::main]
async fn main() -> ClientResult<()> {
    init_tracing("info");

    let config = ClientConfig::from_env()?;
    let session = Arc::new(SessionStore::new());
    let sink = NotificationSink::new(config.notification_capacity, Box::new(TerminalAlerter)).shared();

    let client = LiveClient::spawn(&config, Arc::clone(&session), Arc::clone(&sink))?;
    info!(endpoint = %config.endpoint()?, "inbox-realtime {}", inbox_realtime::VERSION);

    let topics = std::env::var("INBOX_TOPICS").unwrap_or_default();
    for topic in topics.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        client.subscribe(topic)?;
    }

    match std::env::var("INBOX_TOKEN") {
        Ok(token) if !token.trim().is_empty() => session.login(token.trim()),
        _ => warn!("INBOX_TOKEN not set; waiting without a session"),
    }

    let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel::<()>();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    }) {
        warn!(error = %e, "could not install Ctrl+C handler");
    }

    let mut events = client.events();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = events.recv() => match event {
                Ok(routed) => {
                    if let Some(line) = notification_line(&routed) {
                        let unread = sink.lock().unread_count();
                        info!(at = %clock_label(Utc::now()), unread, "{}", line);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "event listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    info!("shutting down");
    session.logout();
    client.shutdown().await;
    Ok(())
}

/// One log line for the notification an event raised, if any
fn notification_line(routed: &RoutedEvent) -> Option<String> {
    let content = routed.notification.as_ref()?;
    Some(format!(
        "[{}] {}: {} (conversation {})",
        content.category,
        content.title,
        content.body,
        content.conversation_id.as_deref().unwrap_or("-")
    ))
}
