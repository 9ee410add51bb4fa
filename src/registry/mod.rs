//! Subscription registry
//!
//! The registry is the durable record of which topics this client wants. The
//! wire subscriptions are a side effect replayed from it on every open, so
//! its contents are independent of connection state.

use std::collections::HashSet;

use crate::error::{ClientError, ClientResult};

/// Reject empty or whitespace-only topics
pub fn validate_topic(topic: &str) -> ClientResult<&str> {
    if topic.trim().is_empty() {
        return Err(ClientError::InvalidTopic(topic.to_string()));
    }
    Ok(topic)
}

/// Set of topics the client is interested in
#[derive(Debug, Default, Clone)]
pub struct SubscriptionRegistry {
    topics: HashSet<String>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a topic. Returns `true` if it was not already held.
    pub fn insert(&mut self, topic: &str) -> bool {
        if self.topics.contains(topic) {
            return false;
        }
        self.topics.insert(topic.to_string())
    }

    /// Forget a topic. Returns `true` if it was held.
    pub fn remove(&mut self, topic: &str) -> bool {
        self.topics.remove(topic)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.topics.contains(topic)
    }

    /// Held topics, in no particular order
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Drop every topic (session teardown)
    pub fn clear(&mut self) {
        self.topics.clear();
    }
}
