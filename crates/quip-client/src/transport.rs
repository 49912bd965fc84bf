//! HTTP transport for the Quip API.
//!
//! Performs one authenticated round trip per call and returns the raw body.
//! Interpreting the body is left to [`crate::normalize`]; the transport only
//! separates "request never completed" from "server said no".

use crate::config::{ClientConfig, USER_AGENT};
use crate::error::{QuipError, QuipResult};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Body reported for an error response whose body could not be read.
pub const UNREADABLE_BODY: &str = "Unknown error";

/// Authenticated HTTP transport.
///
/// Holds only immutable configuration and a pooled HTTP client, so it can be
/// cloned or shared freely between concurrent calls.
#[derive(Clone, Debug)]
pub struct Transport {
    /// HTTP client instance.
    client: Client,

    /// Endpoint configuration.
    config: ClientConfig,
}

impl Transport {
    /// Create a transport for the given configuration.
    pub fn new(config: ClientConfig) -> QuipResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    /// The configuration this transport was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request with an optional JSON body.
    #[instrument(skip(self, body))]
    pub async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> QuipResult<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self
            .request(method, path)
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(request, path).await
    }

    /// Send a request with an `application/x-www-form-urlencoded` body.
    ///
    /// Several mutating endpoints accept nothing else.
    #[instrument(skip(self, fields))]
    pub async fn send_form(
        &self,
        method: Method,
        path: &str,
        fields: &[(&str, &str)],
    ) -> QuipResult<Vec<u8>> {
        let request = self.request(method, path).form(fields);
        self.execute(request, path).await
    }

    /// Common request setup.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.config.url(path))
            .header(AUTHORIZATION, format!("Bearer {}", self.config.token))
            .header(USER_AGENT_HEADER, USER_AGENT)
    }

    /// Execute a request and classify the outcome.
    async fn execute(&self, request: RequestBuilder, path: &str) -> QuipResult<Vec<u8>> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} -> {}", path, status.as_u16());

        if !status.is_success() {
            let body = error_body(path, response.text().await);
            warn!("Quip API error ({}) for {}: {}", status.as_u16(), path, body);
            return Err(QuipError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Body of a non-2xx response, or [`UNREADABLE_BODY`] if reading it failed.
fn error_body<E: fmt::Display>(path: &str, read: Result<String, E>) -> String {
    read.unwrap_or_else(|e| {
        warn!("Failed to read error body for {}: {}", path, e);
        UNREADABLE_BODY.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_error_body_uses_placeholder() {
        let read: Result<String, &str> = Err("connection reset");
        assert_eq!(error_body("/threads/doc1", read), UNREADABLE_BODY);

        let read: Result<String, &str> = Ok(String::new());
        assert_eq!(error_body("/threads/doc1", read), "");

        let read: Result<String, &str> = Ok("{\"error\":\"denied\"}".to_string());
        assert_eq!(error_body("/threads/doc1", read), "{\"error\":\"denied\"}");
    }

    #[test]
    fn test_transport_creation() {
        let config = ClientConfig::new("test-token").with_base_url("http://localhost:3000");
        let transport = Transport::new(config).unwrap();
        assert_eq!(transport.config().base_url, "http://localhost:3000");
        assert_eq!(transport.config().timeout_secs, 30);
    }
}
