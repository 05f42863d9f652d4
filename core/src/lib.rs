//! Single-entry HTTP request dispatcher for the Q&A API.
//!
//! # Overview
//! A caller names an operation (`"login"` or an HTTP method), a path and
//! optional parameters. The dispatcher builds exactly one request, attaches
//! the session's bearer token, sends it, and classifies the response into one
//! `Outcome`: success, validation error, unauthenticated, failure or network
//! error.
//!
//! # Design
//! - `ApiClient` is stateless. It holds only `base_url` and splits work into
//!   `build` (produces an `HttpRequest`) and `classify` (consumes an
//!   `HttpResponse`), so the I/O boundary is explicit and testable.
//! - `Transport` performs the one network call. `ReqwestTransport` is the
//!   production implementation.
//! - `Dispatcher` wires the two together with the injected `SessionStore`,
//!   `Navigator` and `Notifier`. A 401 always signs the session out and
//!   navigates to the login route; callbacks never see it.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod outcome;
pub mod session;
pub mod shell;
pub mod transport;
pub mod types;

pub use client::{ApiClient, RequestIntent};
pub use config::ClientConfig;
pub use dispatcher::{Dispatcher, FailureCallback, SuccessCallback};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Operation};
pub use outcome::{Outcome, Rejection};
pub use session::{MemorySession, SessionState, SessionStore};
pub use shell::{LogNotifier, Navigator, NoopNavigator, Notice, Notifier};
pub use transport::{ReqwestTransport, Transport};
pub use types::{to_params, ErrorDetail, LoginResponse, Params, Question, QuestionCreate, QuestionList};
