//! Static client configuration.
//!
//! The base URL is resolved once, from the environment, in priority order:
//! `SERVER_URL`, then `SERVER_URL_LOCAL`, then [`DEFAULT_BASE_URL`]. Empty or
//! whitespace-only values are skipped.

pub const SERVER_URL_ENV: &str = "SERVER_URL";
pub const SERVER_URL_LOCAL_ENV: &str = "SERVER_URL_LOCAL";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LOGIN_ROUTE: &str = "/user-login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Route handed to the `Navigator` when a request comes back 401.
    pub login_route: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
        }
    }

    pub fn from_env() -> Self {
        let primary = std::env::var(SERVER_URL_ENV).ok();
        let fallback = std::env::var(SERVER_URL_LOCAL_ENV).ok();
        Self::new(resolve_base_url(primary.as_deref(), fallback.as_deref()))
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// First non-empty of `primary`, `fallback`, else [`DEFAULT_BASE_URL`].
pub fn resolve_base_url(primary: Option<&str>, fallback: Option<&str>) -> String {
    [primary, fallback]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}
