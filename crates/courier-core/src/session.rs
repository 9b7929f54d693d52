//! Read access to the current authentication token.
//!
//! The pipeline only ever reads the token, once per request. Who writes it
//! (a login flow, a keychain loader, a test) is up to the application.

use std::sync::Arc;

use parking_lot::RwLock;

/// Source of the current authentication token.
pub trait SessionStore: Send + Sync {
    /// The current token, if any. Empty strings are treated as absent by callers.
    fn token(&self) -> Option<String>;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }
}

/// In-memory session store shared between clones.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    token: Arc<RwLock<Option<String>>>,
}

impl MemorySessionStore {
    /// Create an empty store (anonymous session).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }

    /// Replace the token, e.g. after login.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Drop the token, e.g. on logout or session expiry.
    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the token itself
        f.debug_struct("MemorySessionStore")
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}

/// Store for clients that never authenticate.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnonymousSession;

impl SessionStore for AnonymousSession {
    fn token(&self) -> Option<String> {
        None
    }
}
