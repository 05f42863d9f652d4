//! Stateless request builder and response classifier.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. `build` turns a `RequestIntent` plus a token snapshot into an
//! `HttpRequest`; `classify` turns an `HttpResponse` into an `Outcome`. Both
//! are pure, so every encoding and status rule is testable without a network.
//! `Dispatcher` wires them to a `Transport` and the session side effects.

use std::borrow::Cow;

use serde_json::Value;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, Operation, ACCEPT, APPLICATION_JSON, AUTHORIZATION,
    CONTENT_TYPE, FORM_URLENCODED,
};
use crate::outcome::{parse_failed_payload, Outcome};
use crate::types::Params;

/// What a caller wants sent: an operation, a path under the base URL and
/// optional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestIntent {
    pub operation: Operation,
    pub path: String,
    pub params: Option<Params>,
}

impl RequestIntent {
    pub fn new(operation: Operation, path: impl Into<String>) -> Self {
        Self {
            operation,
            path: path.into(),
            params: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get.into(), path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post.into(), path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put.into(), path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete.into(), path)
    }

    pub fn login(path: impl Into<String>) -> Self {
        Self::new(Operation::Login, path)
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }
}

/// Builds `HttpRequest` values and classifies `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the wire request for `intent`.
    ///
    /// `token` is the session token at call time; an empty token is treated
    /// as absent.
    pub fn build(&self, intent: &RequestIntent, token: Option<&str>) -> Result<HttpRequest, ApiError> {
        let method = intent.operation.method();
        let params = intent.params.as_ref().filter(|params| !params.is_empty());
        let mut url = format!("{}{}", self.base_url, intent.path);

        let (content_type, body) = match (&intent.operation, params) {
            (Operation::Login, _) => (FORM_URLENCODED, Some(encode_form(params))),
            (_, Some(params)) if method.is_get() => {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&encode_form(Some(params)));
                (APPLICATION_JSON, None)
            }
            (_, Some(params)) => {
                let body = serde_json::to_string(params)
                    .map_err(|e| ApiError::SerializationError(e.to_string()))?;
                (APPLICATION_JSON, Some(body))
            }
            (_, None) => (APPLICATION_JSON, None),
        };

        let mut headers = vec![
            (CONTENT_TYPE.to_string(), content_type.to_string()),
            (ACCEPT.to_string(), APPLICATION_JSON.to_string()),
        ];
        if let Some(token) = token.filter(|token| !token.is_empty()) {
            if token.bytes().any(|b| b.is_ascii_control()) {
                return Err(ApiError::InvalidHeader(
                    "access token contains control characters".to_string(),
                ));
            }
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Map a response onto exactly one `Outcome`.
    ///
    /// A body that is not JSON becomes `{"error": "parse failed", "status": N}`
    /// and classification still goes by the real status.
    pub fn classify(&self, response: HttpResponse) -> Outcome {
        let payload = parse_payload(&response);
        match response.status {
            200..=299 => Outcome::Success(payload),
            401 => Outcome::Unauthenticated,
            422 => Outcome::ValidationError(payload),
            status => Outcome::Failure { status, payload },
        }
    }
}

fn parse_payload(response: &HttpResponse) -> Value {
    match serde_json::from_str(&response.body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(status = response.status, error = %e, "response body is not JSON");
            parse_failed_payload(response.status)
        }
    }
}

/// Flat `key=value&...` encoding shared by query strings and login bodies.
fn encode_form(params: Option<&Params>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.into_iter().flatten() {
        serializer.append_pair(key, &flat_value(value));
    }
    serializer.finish()
}

/// Nested values are not expanded; they are sent as their JSON text.
fn flat_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}
