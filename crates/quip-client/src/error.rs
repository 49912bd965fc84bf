//! Error types for Quip client operations.
//!
//! Every operation fails through a single [`QuipError`] whose variants keep the
//! four failure kinds apart: the request never completed, the server rejected
//! it, the response could not be normalized, or the caller's arguments were
//! refused before any request was made.

use thiserror::Error;

/// Maximum number of body bytes kept in a decode error excerpt.
pub const EXCERPT_LIMIT: usize = 512;

/// Quip client error types.
#[derive(Debug, Error)]
pub enum QuipError {
    /// Connection, timeout or body-read failure. No HTTP status is available.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    ///
    /// `body` is the server's response text, verbatim.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body matched none of the shapes known for the operation.
    #[error("failed to decode {operation} response: {reason} (body: {excerpt})")]
    Decode {
        /// Operation whose response was being decoded.
        operation: &'static str,
        /// Why the last candidate was rejected.
        reason: String,
        /// Leading part of the raw body.
        excerpt: String,
    },

    /// A caller-supplied argument failed a precondition.
    #[error("invalid argument: {0}")]
    Validation(String),
}

impl QuipError {
    /// Build a decode error, keeping a bounded excerpt of `body`.
    pub fn decode(operation: &'static str, reason: impl Into<String>, body: &[u8]) -> Self {
        QuipError::Decode {
            operation,
            reason: reason.into(),
            excerpt: excerpt(body),
        }
    }

    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        QuipError::Validation(message.into())
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            QuipError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request failed before reaching the API.
    pub fn is_transport(&self) -> bool {
        matches!(self, QuipError::Transport(_))
    }

    /// Whether the error was raised before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(self, QuipError::Validation(_))
    }
}

/// Result type for Quip client operations.
pub type QuipResult<T> = Result<T, QuipError>;

/// Lossy UTF-8 prefix of `body`, cut on a char boundary.
fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= EXCERPT_LIMIT {
        return text.into_owned();
    }

    let mut end = EXCERPT_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
