//! Request parameters and DTOs for the Q&A API.
//!
//! # Design
//! The dispatcher itself is payload-agnostic: it sends a flat `Params` map
//! and hands back `serde_json::Value`. These DTOs are for call sites that want
//! typed access, via `serde_json::from_value` on an outcome payload or
//! `to_params` on the way in. They mirror the mock server's schema but are
//! defined independently; integration tests catch drift.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Request parameters. Keys keep insertion order.
pub type Params = Map<String, Value>;

/// Convert any serializable struct into `Params`.
///
/// Fails if `value` does not serialize to a JSON object.
pub fn to_params<T: Serialize>(value: &T) -> Result<Params, ApiError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::SerializationError(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(ApiError::SerializationError(e.to_string())),
    }
}

/// Body of a successful `POST /api/user/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub create_date: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// One page of questions plus the total match count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QuestionList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub question_list: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionCreate {
    pub subject: String,
    pub content: String,
}

/// Error body returned by the server for 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub detail: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_params_keeps_field_order() {
        let params = to_params(&QuestionCreate {
            subject: "Hello".to_string(),
            content: "World".to_string(),
        })
        .unwrap();
        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, ["subject", "content"]);
    }

    #[test]
    fn to_params_rejects_non_objects() {
        let err = to_params(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ApiError::SerializationError(_)));
    }

    #[test]
    fn question_list_tolerates_missing_fields() {
        let list: QuestionList = serde_json::from_value(json!({})).unwrap();
        assert_eq!(list, QuestionList::default());
    }

    #[test]
    fn error_detail_accepts_structured_detail() {
        let body = json!({"detail": [{"loc": ["body", "subject"], "msg": "field required"}]});
        let detail: ErrorDetail = serde_json::from_value(body).unwrap();
        assert!(detail.detail.is_array());
    }
}
