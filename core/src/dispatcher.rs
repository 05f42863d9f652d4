//! Sends one request and routes its outcome.
//!
//! # Design
//! `send` is the primary entry point: build, execute, classify, and return an
//! `Outcome`. The one side effect it owns is session teardown on 401, which
//! happens before the outcome is returned and regardless of what the caller
//! does with it. `dispatch` is the fire-and-forget form with a success/failure
//! callback pair; it spawns `send` on the current tokio runtime and falls back
//! to the `Notifier` (or the log) when a callback is missing.

use std::sync::Arc;

use serde_json::Value;

use crate::client::{ApiClient, RequestIntent};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Operation, AUTHORIZATION};
use crate::outcome::{Outcome, Rejection};
use crate::session::SessionStore;
use crate::shell::{LogNotifier, Navigator, NoopNavigator, Notice, Notifier};
use crate::transport::Transport;
use crate::types::Params;

pub type SuccessCallback = Box<dyn FnOnce(Value) + Send + 'static>;
pub type FailureCallback = Box<dyn FnOnce(Rejection) + Send + 'static>;

/// Cheap to clone; every collaborator is behind an `Arc`.
#[derive(Clone)]
pub struct Dispatcher {
    client: ApiClient,
    login_route: Arc<str>,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    /// A dispatcher with a no-op navigator and log-only notifications.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            client: ApiClient::new(&config.base_url),
            login_route: config.login_route.into(),
            transport,
            session,
            navigator: Arc::new(NoopNavigator),
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Send `intent` and classify the response.
    ///
    /// Never fails: build and transport errors come back as
    /// `Outcome::NetworkError`.
    pub async fn send(&self, intent: RequestIntent) -> Outcome {
        let token = self.session.access_token();
        let request = match self.client.build(&intent, token.as_deref()) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(path = %intent.path, error = %e, "request could not be built");
                return Outcome::NetworkError(e);
            }
        };

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            authorized = request.header(AUTHORIZATION).is_some(),
            has_body = request.body.is_some(),
            "sending request"
        );
        let url = request.url.clone();

        let outcome = match self.transport.execute(request).await {
            Ok(response) => {
                tracing::debug!(url = %url, status = response.status, "response received");
                self.client.classify(response)
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "request failed before a response");
                Outcome::NetworkError(e)
            }
        };

        if outcome == Outcome::Unauthenticated {
            self.end_session();
        }
        outcome
    }

    /// `send`, then hand the outcome to the callbacks.
    ///
    /// On 401 neither callback runs; the session has been torn down instead.
    pub async fn send_with(
        &self,
        intent: RequestIntent,
        on_success: Option<SuccessCallback>,
        on_failure: Option<FailureCallback>,
    ) {
        let outcome = self.send(intent).await;
        self.deliver(outcome, on_success, on_failure);
    }

    /// Fire-and-forget. Returns immediately; callbacks run later on the
    /// runtime.
    ///
    /// `operation` is `"login"` or an HTTP method name in any case. An
    /// unparseable operation is reported like a network error, still from the
    /// spawned task. Must be called from within a tokio runtime; outside one
    /// the request is not sent and the failure is reported synchronously.
    pub fn dispatch(
        &self,
        operation: &str,
        path: &str,
        params: Option<Params>,
        on_success: Option<SuccessCallback>,
        on_failure: Option<FailureCallback>,
    ) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "dispatch called outside a tokio runtime");
                let error = ApiError::Transport("no async runtime available".to_string());
                self.deliver(Outcome::NetworkError(error), on_success, on_failure);
                return;
            }
        };

        let dispatcher = self.clone();
        match operation.parse::<Operation>() {
            Ok(operation) => {
                let intent = RequestIntent {
                    operation,
                    path: path.to_string(),
                    params,
                };
                handle.spawn(async move {
                    dispatcher.send_with(intent, on_success, on_failure).await;
                });
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "unknown operation");
                handle.spawn(async move {
                    dispatcher.deliver(Outcome::NetworkError(e), on_success, on_failure);
                });
            }
        }
    }

    fn deliver(
        &self,
        outcome: Outcome,
        on_success: Option<SuccessCallback>,
        on_failure: Option<FailureCallback>,
    ) {
        match outcome {
            Outcome::Success(payload) => {
                if let Some(callback) = on_success {
                    callback(payload);
                }
            }
            Outcome::ValidationError(payload) => match on_failure {
                Some(callback) => callback(Rejection::Response(payload)),
                None => self.notifier.notify(Notice::InvalidRequest(payload)),
            },
            // Already handled in `send`.
            Outcome::Unauthenticated => {}
            Outcome::Failure { status, payload } => match on_failure {
                Some(callback) => callback(Rejection::Response(payload)),
                None => tracing::error!(status, %payload, "request failed"),
            },
            Outcome::NetworkError(error) => match on_failure {
                Some(callback) => callback(Rejection::Network(error)),
                None => self.notifier.notify(Notice::RequestError(error.to_string())),
            },
        }
    }

    fn end_session(&self) {
        tracing::info!(route = %self.login_route, "session rejected by server, signing out");
        self.session.invalidate();
        self.notifier.notify(Notice::LoginRequired);
        self.navigator.navigate(&self.login_route);
    }
}
