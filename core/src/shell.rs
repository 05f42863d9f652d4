//! Hooks the application shell plugs into the dispatcher: where to go when
//! the session expires, and how to tell the user about failures nobody
//! handled.

use std::fmt;

use serde_json::Value;

/// Receives the login route whenever a request comes back 401.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// For callers without a UI. The 401 is still logged by the dispatcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _route: &str) {}
}

/// A user-facing notification raised when an outcome has no callback to go to.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The session expired or was never established.
    LoginRequired,
    /// 422 with no failure callback.
    InvalidRequest(Value),
    /// The request never got a response and there was no failure callback.
    RequestError(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::LoginRequired => write!(f, "login required"),
            Notice::InvalidRequest(_) => write!(f, "invalid request data"),
            Notice::RequestError(message) => write!(f, "request error: {message}"),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Default policy: report notices through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match &notice {
            Notice::InvalidRequest(payload) => {
                tracing::warn!(%payload, "{notice}");
            }
            _ => tracing::warn!("{notice}"),
        }
    }
}
