//! HTTP transport types shared by the builder, the transports and the tests.
//!
//! # Design
//! Requests and responses are plain data. `ApiClient` builds an `HttpRequest`
//! and classifies an `HttpResponse` without touching the network; a
//! `Transport` sits between the two and performs the only I/O. All fields are
//! owned so values move freely into spawned tasks.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

pub const CONTENT_TYPE: &str = "content-type";
pub const ACCEPT: &str = "accept";
pub const AUTHORIZATION: &str = "authorization";

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    /// Any other method token, stored upper-cased.
    Other(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(name) => name,
        }
    }

    pub fn is_get(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    /// Case-insensitive. Unknown names are accepted as long as they are a
    /// valid RFC 9110 token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let method = match upper.as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ if is_token(&upper) => HttpMethod::Other(upper),
            _ => return Err(ApiError::InvalidOperation(s.to_string())),
        };
        Ok(method)
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// The logical request kind a caller asks for.
///
/// `login` is special: it is always sent as a form-encoded POST. Every other
/// operation names its HTTP method directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Login,
    Method(HttpMethod),
}

impl Operation {
    pub fn method(&self) -> HttpMethod {
        match self {
            Operation::Login => HttpMethod::Post,
            Operation::Method(method) => method.clone(),
        }
    }
}

impl FromStr for Operation {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "login" {
            return Ok(Operation::Login);
        }
        s.parse().map(Operation::Method)
    }
}

impl From<HttpMethod> for Operation {
    fn from(method: HttpMethod) -> Self {
        Operation::Method(method)
    }
}

/// An HTTP request described as plain data.
///
/// Header names are stored lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport` once the server has answered, whatever the
/// status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_are_upper_cased() {
        assert_eq!("get".parse::<Operation>().unwrap(), Operation::Method(HttpMethod::Get));
        assert_eq!("Patch".parse::<Operation>().unwrap(), Operation::Method(HttpMethod::Patch));
        assert_eq!(
            "purge".parse::<Operation>().unwrap(),
            Operation::Method(HttpMethod::Other("PURGE".to_string()))
        );
    }

    #[test]
    fn login_is_only_recognised_in_lower_case() {
        assert_eq!("login".parse::<Operation>().unwrap(), Operation::Login);
        assert_eq!(Operation::Login.method(), HttpMethod::Post);
        assert_eq!(
            "LOGIN".parse::<Operation>().unwrap(),
            Operation::Method(HttpMethod::Other("LOGIN".to_string()))
        );
    }

    #[test]
    fn invalid_method_tokens_are_rejected() {
        for bad in ["", "get items", "po/st", "naïve"] {
            let err = bad.parse::<Operation>().unwrap_err();
            assert!(matches!(err, ApiError::InvalidOperation(_)), "{bad:?}");
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/".to_string(),
            headers: vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())],
            body: None,
        };
        assert_eq!(req.header("Content-Type"), Some(APPLICATION_JSON));
        assert_eq!(req.header("authorization"), None);
    }
}
