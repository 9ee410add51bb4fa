//! Client configuration
//!
//! Values come from defaults, then `INBOX_*` environment variables:
//!
//! ```bash
//! INBOX_ORIGIN=https://console.example.com   # page origin, scheme picks ws/wss
//! INBOX_WS_URL=wss://rt.example.com/cable    # explicit override, wins over origin
//! INBOX_WS_PATH=/cable
//! INBOX_FEED_TOPIC=notifications
//! INBOX_RETRY_DELAY_MS=3000
//! INBOX_CONNECT_TIMEOUT_MS=10000
//! INBOX_NOTIFICATION_CAPACITY=50
//! ```

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Default deployment origin when none is configured
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080";

/// Path the server mounts its WebSocket endpoint on
pub const DEFAULT_WS_PATH: &str = "/cable";

/// Topic name of the user's personal notification feed
pub const DEFAULT_FEED_TOPIC: &str = "notifications";

/// Fixed reconnect delay
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3000;

/// Longest wait for the WebSocket handshake before the attempt counts as failed
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Number of notifications kept by the sink
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 50;

/// Configuration for the real-time client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Explicit connection address, used verbatim when set
    pub ws_url: Option<String>,
    /// Origin of the console deployment
    pub origin: String,
    /// Path suffix appended to the origin
    pub ws_path: String,
    /// Personal notification feed topic
    pub feed_topic: String,
    /// Delay before a reconnect attempt
    pub retry_delay_ms: u64,
    /// Handshake timeout for one connection attempt
    pub connect_timeout_ms: u64,
    /// Maximum notifications retained
    pub notification_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: None,
            origin: DEFAULT_ORIGIN.to_string(),
            ws_path: DEFAULT_WS_PATH.to_string(),
            feed_topic: DEFAULT_FEED_TOPIC.to_string(),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Load configuration from `INBOX_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("INBOX_WS_URL").filter(|v| !v.trim().is_empty()) {
            config.ws_url = Some(url.trim().to_string());
        }
        if let Some(origin) = lookup("INBOX_ORIGIN").filter(|v| !v.trim().is_empty()) {
            config.origin = origin.trim().to_string();
        }
        if let Some(path) = lookup("INBOX_WS_PATH").filter(|v| !v.trim().is_empty()) {
            config.ws_path = path.trim().to_string();
        }
        if let Some(topic) = lookup("INBOX_FEED_TOPIC").filter(|v| !v.trim().is_empty()) {
            config.feed_topic = topic.trim().to_string();
        }
        if let Some(raw) = lookup("INBOX_RETRY_DELAY_MS") {
            config.retry_delay_ms = parse_number("INBOX_RETRY_DELAY_MS", &raw)?;
        }
        if let Some(raw) = lookup("INBOX_CONNECT_TIMEOUT_MS") {
            config.connect_timeout_ms = parse_number("INBOX_CONNECT_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("INBOX_NOTIFICATION_CAPACITY") {
            config.notification_capacity = parse_number("INBOX_NOTIFICATION_CAPACITY", &raw)?;
        }

        Ok(config)
    }

    /// Reconnect delay as a [`Duration`]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Handshake timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Resolve the base connection address (without credentials)
    ///
    /// The override wins. Otherwise the origin's host is kept and its scheme
    /// is switched to the matching WebSocket scheme (`https` → `wss`,
    /// `http` → `ws`).
    pub fn endpoint(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.ws_url {
            return Ok(url.clone());
        }

        let mut url = Url::parse(&self.origin).map_err(|e| ConfigError::InvalidOrigin {
            origin: self.origin.clone(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        url.set_scheme(scheme)
            .map_err(|_| ConfigError::UnsupportedScheme(url.scheme().to_string()))?;
        url.set_path(&self.ws_path);
        url.set_query(None);
        url.set_fragment(None);

        Ok(url.to_string())
    }
}

/// Append the bearer token to a base address as the `token` query parameter
pub fn connection_url(base: &str, token: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", base, separator, urlencoding::encode(token))
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.retry_delay(), Duration::from_secs(3));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.notification_capacity, 50);
    }

    #[test]
    fn test_endpoint_from_plain_origin() {
        let config = ClientConfig {
            origin: "http://localhost:5173".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint().unwrap(), "ws://localhost:5173/cable");
    }

    #[test]
    fn test_endpoint_from_secure_origin() {
        let config = ClientConfig {
            origin: "https://console.example.com/app?x=1".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint().unwrap(), "wss://console.example.com/cable");
    }

    #[test]
    fn test_endpoint_override_wins() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("INBOX_WS_URL", "wss://rt.example.com/socket"),
            ("INBOX_ORIGIN", "http://ignored"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint().unwrap(), "wss://rt.example.com/socket");
    }

    #[test]
    fn test_endpoint_rejects_unknown_scheme() {
        let config = ClientConfig {
            origin: "ftp://files.example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.endpoint(),
            Err(ConfigError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn test_endpoint_rejects_garbage_origin() {
        let config = ClientConfig {
            origin: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.endpoint(), Err(ConfigError::InvalidOrigin { .. })));
    }

    #[test]
    fn test_connect_timeout_from_env() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("INBOX_CONNECT_TIMEOUT_MS", "250")])).unwrap();
        assert_eq!(config.connect_timeout(), Duration::from_millis(250));
        assert!(ClientConfig::from_lookup(lookup_from(&[("INBOX_CONNECT_TIMEOUT_MS", "-1")])).is_err());
    }

    #[test]
    fn test_invalid_number() {
        let err = ClientConfig::from_lookup(lookup_from(&[("INBOX_RETRY_DELAY_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber { name: "INBOX_RETRY_DELAY_MS", .. }
        ));
    }

    #[test]
    fn test_connection_url_encodes_token() {
        assert_eq!(
            connection_url("ws://h/cable", "a b+c"),
            "ws://h/cable?token=a%20b%2Bc"
        );
        assert_eq!(
            connection_url("ws://h/cable?v=2", "t"),
            "ws://h/cable?v=2&token=t"
        );
    }
}
