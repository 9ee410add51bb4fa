//! Notification sink
//!
//! A bounded, newest-first buffer of [`Notification`]s with an unread counter.
//!
//! The counter is maintained incrementally (add, mark read, eviction) and is
//! always equal to the number of entries with `read == false`.

pub mod alert;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

pub use alert::{Alerter, SilentAlerter, TerminalAlerter};

use crate::config::DEFAULT_NOTIFICATION_CAPACITY;
use crate::types::{NewNotification, Notification};

/// Sink shared between the channel and the UI layer
pub type SharedSink = Arc<Mutex<NotificationSink>>;

/// Unread counts above this are displayed as `99+`
const BADGE_LIMIT: usize = 99;

/// Bounded notification store with read-state accounting
pub struct NotificationSink {
    entries: VecDeque<Notification>,
    capacity: usize,
    unread: usize,
    alerter: Box<dyn Alerter>,
}

impl NotificationSink {
    /// Create a sink holding at most `capacity` notifications (minimum 1)
    pub fn new(capacity: usize, alerter: Box<dyn Alerter>) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            unread: 0,
            alerter,
        }
    }

    /// Wrap into a [`SharedSink`]
    pub fn shared(self) -> SharedSink {
        Arc::new(Mutex::new(self))
    }

    /// Store a new unread notification and fire alerts
    ///
    /// The oldest entries beyond capacity are dropped silently.
    pub fn add(&mut self, content: NewNotification) -> &Notification {
        let notification = Notification::from_new(content, Utc::now());

        self.entries.push_front(notification);
        self.unread += 1;

        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                if !evicted.read {
                    self.unread -= 1;
                }
            }
        }

        let added = &self.entries[0];
        if let Err(e) = self.alerter.play_sound() {
            tracing::debug!(error = %e, "notification sound failed");
        }
        if let Err(e) = self.alerter.show_alert(added) {
            tracing::debug!(error = %e, "desktop alert failed");
        }
        added
    }

    /// Mark one notification read. Unknown or already-read ids are ignored.
    pub fn mark_read(&mut self, id: Uuid) {
        if let Some(entry) = self.entries.iter_mut().find(|n| n.id == id) {
            if !entry.read {
                entry.read = true;
                self.unread = self.unread.saturating_sub(1);
            }
        }
    }

    /// Mark every notification read
    pub fn mark_all_read(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.read = true;
        }
        self.unread = 0;
    }

    /// Remove every notification
    pub fn clear(&mut self) {
        self.entries.clear();
        self.unread = 0;
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    /// Unread count as shown on the bell badge
    pub fn badge_label(&self) -> Option<String> {
        match self.unread {
            0 => None,
            n if n > BADGE_LIMIT => Some(format!("{}+", BADGE_LIMIT)),
            n => Some(n.to_string()),
        }
    }

    /// Notifications, newest first
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    /// The `limit` most recent notifications
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY, Box::new(SilentAlerter))
    }
}

impl std::fmt::Debug for NotificationSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSink")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("unread", &self.unread)
            .finish()
    }
}
