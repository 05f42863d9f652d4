//! Session state the dispatcher reads tokens from and tears down on 401.
//!
//! # Design
//! The store is injected into the `Dispatcher` as `Arc<dyn SessionStore>`
//! instead of living in a global. The dispatcher reads the token once per
//! request and writes only when a response comes back 401. Application code
//! writes through `sign_in` after a successful login.

use std::sync::{PoisonError, RwLock};

use crate::types::LoginResponse;

pub trait SessionStore: Send + Sync {
    /// Current bearer token. `None` or an empty string both mean "signed out".
    fn access_token(&self) -> Option<String>;

    fn set_access_token(&self, token: &str);

    fn set_username(&self, username: &str);

    fn set_logged_in(&self, logged_in: bool);

    /// Store the credentials returned by a successful login.
    ///
    /// The default runs three separate setters. Stores shared across threads
    /// must override this and `invalidate` so readers never observe a mix of
    /// old and new fields.
    fn sign_in(&self, login: &LoginResponse) {
        self.set_access_token(&login.access_token);
        self.set_username(&login.username);
        self.set_logged_in(true);
    }

    /// Forget the token and identity and mark the session logged out.
    fn invalidate(&self) {
        self.set_access_token("");
        self.set_username("");
        self.set_logged_in(false);
    }
}

/// Snapshot of a `MemorySession`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub access_token: String,
    pub username: String,
    pub logged_in: bool,
}

/// In-process `SessionStore`.
#[derive(Debug, Default)]
pub struct MemorySession {
    state: RwLock<SessionState>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SessionState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}

impl SessionStore for MemorySession {
    fn access_token(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Some(state.access_token.clone()).filter(|token| !token.is_empty())
    }

    fn set_access_token(&self, token: &str) {
        self.update(|state| state.access_token = token.to_string());
    }

    fn set_username(&self, username: &str) {
        self.update(|state| state.username = username.to_string());
    }

    fn set_logged_in(&self, logged_in: bool) {
        self.update(|state| state.logged_in = logged_in);
    }

    fn sign_in(&self, login: &LoginResponse) {
        self.update(|state| {
            *state = SessionState {
                access_token: login.access_token.clone(),
                username: login.username.clone(),
                logged_in: true,
            }
        });
    }

    fn invalidate(&self) {
        self.update(|state| *state = SessionState::default());
    }
}
