//! Session provider contract
//!
//! The channel never reaches into global auth state. It is handed a
//! [`SessionProvider`] and reads the token and authentication flag from it at
//! the moment it needs them. [`SessionStore`] is the in-memory provider used by
//! the runtime; it publishes every change on a `watch` channel.

use tokio::sync::watch;

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Bearer token, if one has been issued
    pub token: Option<String>,
    /// Whether the user is logged in
    pub authenticated: bool,
}

impl SessionState {
    /// Logged-in state carrying `token`
    pub fn authenticated(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            authenticated: true,
            token: if token.is_empty() { None } else { Some(token) },
        }
    }

    /// Logged-out state
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Token to connect with: present only while authenticated
    pub fn usable_token(&self) -> Option<&str> {
        if self.authenticated {
            self.token.as_deref()
        } else {
            None
        }
    }
}

/// Source of the current bearer token and authentication flag
pub trait SessionProvider: Send + Sync {
    /// Current session state
    fn snapshot(&self) -> SessionState;

    /// Current bearer token
    fn token(&self) -> Option<String> {
        self.snapshot().token
    }

    /// Whether the session is authenticated
    fn is_authenticated(&self) -> bool {
        self.snapshot().authenticated
    }
}

/// In-memory session provider with change notification
pub struct SessionStore {
    tx: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Create a logged-out store
    pub fn new() -> Self {
        Self::with_state(SessionState::anonymous())
    }

    /// Create a store with an initial state
    pub fn with_state(state: SessionState) -> Self {
        let (tx, _) = watch::channel(state);
        Self { tx }
    }

    /// Log in with a bearer token
    pub fn login(&self, token: impl Into<String>) {
        self.tx.send_replace(SessionState::authenticated(token));
    }

    /// Log out, clearing the token
    pub fn logout(&self) {
        self.tx.send_replace(SessionState::anonymous());
    }

    /// Replace the token of an authenticated session
    ///
    /// Returns `false` (and changes nothing) when logged out.
    pub fn refresh_token(&self, token: impl Into<String>) -> bool {
        let token = token.into();
        self.tx.send_if_modified(|state| {
            if !state.authenticated || state.token.as_deref() == Some(token.as_str()) {
                return false;
            }
            *state = SessionState::authenticated(token.clone());
            true
        });
        self.tx.borrow().authenticated
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider for SessionStore {
    fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }
}
