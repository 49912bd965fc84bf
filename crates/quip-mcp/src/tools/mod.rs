//! Quip MCP tools
//!
//! Each tool wraps one [`QuipClient`] operation, validates its arguments and
//! renders the result as Markdown text. Client failures come back as error
//! results (`isError: true`) so the assistant can read them; malformed
//! arguments are protocol errors.

pub mod comments;
pub mod documents;
pub mod users;

pub use comments::*;
pub use documents::*;
pub use users::*;

use crate::server::{McpServerError, McpServerResult, Tool};
use quip_client::QuipClient;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Default number of items for listing tools.
pub const DEFAULT_LIMIT: usize = 10;

/// Get all Quip tools, sharing one client.
///
/// # Example
///
/// ```rust,no_run
/// use quip_client::QuipClient;
/// use quip_mcp::tools::all_tools;
///
/// let client = QuipClient::with_token("my-token").unwrap();
/// let tools = all_tools(client);
/// println!("Available tools: {}", tools.len());
/// ```
pub fn all_tools(client: QuipClient) -> Vec<Arc<dyn Tool>> {
    let mut tools = Vec::new();

    tools.extend(document_tools(client.clone()));
    tools.extend(user_tools(client.clone()));
    tools.extend(comment_tools(client));

    tools
}

/// Deserialize tool arguments, mapping failures to invalid params.
pub(crate) fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> McpServerResult<T> {
    serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))
}

/// Resolve a numeric `limit` argument. Clients may send integers or floats.
pub(crate) fn limit_or_default(limit: Option<f64>) -> usize {
    match limit {
        Some(n) if n.is_finite() && n >= 0.0 => n as usize,
        _ => DEFAULT_LIMIT,
    }
}

/// Reject blank required string arguments.
pub(crate) fn require(name: &str, value: &str) -> McpServerResult<()> {
    if value.trim().is_empty() {
        return Err(McpServerError::InvalidParams(format!(
            "{} must not be empty",
            name
        )));
    }
    Ok(())
}
