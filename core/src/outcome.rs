//! The classified result of one dispatched request.

use serde_json::{json, Value};

use crate::error::ApiError;

pub const PARSE_FAILED: &str = "parse failed";

/// Exactly one `Outcome` is produced per request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 2xx.
    Success(Value),
    /// 422.
    ValidationError(Value),
    /// 401. Session teardown has already happened by the time a caller sees
    /// this.
    Unauthenticated,
    /// Any other non-2xx status.
    Failure { status: u16, payload: Value },
    /// No response was received, or the request could not be built.
    NetworkError(ApiError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Short, stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::ValidationError(_) => "validation_error",
            Outcome::Unauthenticated => "unauthenticated",
            Outcome::Failure { .. } => "failure",
            Outcome::NetworkError(_) => "network_error",
        }
    }

    /// The response payload, for the variants that carry one.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Outcome::Success(payload)
            | Outcome::ValidationError(payload)
            | Outcome::Failure { payload, .. } => Some(payload),
            Outcome::Unauthenticated | Outcome::NetworkError(_) => None,
        }
    }
}

/// What a failure callback receives: the server's payload, or the transport
/// error when there was no response at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Response(Value),
    Network(ApiError),
}

impl Rejection {
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Rejection::Response(payload) => Some(payload),
            Rejection::Network(_) => None,
        }
    }
}

/// Stand-in payload for a response body that is not valid JSON.
pub fn parse_failed_payload(status: u16) -> Value {
    json!({ "error": PARSE_FAILED, "status": status })
}
