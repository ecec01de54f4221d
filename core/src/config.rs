//! Client configuration: the access token and API root shared by every call.

use std::time::Duration;

use crate::error::{ApiError, Result};

/// Root of the public v3 REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.groupme.com/v3";

/// Environment variable holding the access token for `from_env`.
pub const TOKEN_ENV: &str = "ACCESS_TOKEN";

/// Optional environment override for the API root.
pub const BASE_URL_ENV: &str = "GROUPME_BASE_URL";

/// Immutable settings shared read-only by all operations of a client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    token: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Points the client at another API root, e.g. a local mock server.
    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Reads `ACCESS_TOKEN` and, if set, `GROUPME_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| ApiError::Config(format!("{TOKEN_ENV} is not set")))?;
        Ok(match std::env::var(BASE_URL_ENV) {
            Ok(base_url) => Self::with_base_url(&token, &base_url),
            Err(_) => Self::new(&token),
        })
    }

    /// Default timeout attached to every request built from this config.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

// The token stays out of debug output.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
