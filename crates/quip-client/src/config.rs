//! Client configuration.
//!
//! The base URL, bearer token and timeout are plain fields handed to the
//! client at construction, so independent clients (and tests pointing at mock
//! servers) never share mutable state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://platform.quip.com/1";

/// Timeout applied to every round trip, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("quip-mcp/", env!("CARGO_PKG_VERSION"));

/// Configuration for a Quip API client.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "https://platform.quip.com/1").
    pub base_url: String,

    /// Bearer token sent in the `Authorization` header.
    pub token: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Configuration for the production API with the default timeout.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
