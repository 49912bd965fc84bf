//! # Quip MCP
//!
//! This crate provides an MCP (Model Context Protocol) server that lets AI
//! assistants search, read and edit Quip documents.
//!
//! ## Overview
//!
//! The quip-mcp crate handles:
//! - **JSON-RPC**: MCP protocol types and request dispatch over stdio
//! - **Tools**: one tool per Quip operation, backed by [`quip_client`]
//! - **Resources**: the authenticated user as `quip://user/current`
//! - **Settings**: token and endpoint configuration from file and environment
//!
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `ping`: Liveness check
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//! - `resources/list`: List available resources
//! - `resources/read`: Read a resource
//!
//! ## Available Tools
//!
//! - `search_documents`: Search documents by keyword
//! - `get_document`: Document metadata and content as Markdown
//! - `create_document`: Create a document from HTML or Markdown
//! - `edit_document`: Append or prepend content (REPLACE appends)
//! - `delete_document`: Delete a document; requires `confirm: "DELETE"`
//! - `get_user`: Look up a user, or `current`
//! - `get_document_comments`: List a document's comments
//! - `get_recent_threads`: Recently viewed threads, newest first
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quip_client::{ClientConfig, QuipClient};
//! use quip_mcp::build_server;
//!
//! async fn run() -> anyhow::Result<()> {
//!     let client = QuipClient::new(ClientConfig::new("my-token"))?;
//!     let server = build_server(client).await;
//!
//!     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//!     server.serve(stdin, tokio::io::stdout()).await?;
//!     Ok(())
//! }
//! ```

pub mod format;
pub mod resources;
pub mod server;
pub mod settings;
pub mod tools;
pub mod types;

pub use format::{format_timestamp, html_to_markdown, truncate_text};
pub use resources::{all_resources, CurrentUserResource, CURRENT_USER_URI};
pub use server::{McpServer, McpServerError, McpServerResult, Resource, Tool, ToolContext};
pub use settings::{default_config_path, mask_token, ConfigError, Settings};
pub use tools::all_tools;
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ResourceCapabilities,
    ResourceContents, ResourceDefinition, ServerCapabilities, ServerInfo, ToolAnnotations,
    ToolCall, ToolCapabilities, ToolDefinition, ToolResult, PROTOCOL_VERSION,
};

use quip_client::QuipClient;
use tracing_subscriber::EnvFilter;

/// Server name reported on initialize.
pub const SERVER_NAME: &str = "quip-mcp";

const INSTRUCTIONS: &str = "Tools for Quip documents. Document IDs are thread IDs. \
    edit_document cannot replace content: REPLACE appends like APPEND. \
    delete_document only proceeds when confirm is exactly DELETE.";

/// Build a server with every tool and resource registered.
pub async fn build_server(client: QuipClient) -> McpServer {
    let server =
        McpServer::new(SERVER_NAME, env!("CARGO_PKG_VERSION")).with_instructions(INSTRUCTIONS);

    server.register_tools(all_tools(client.clone())).await;
    for resource in all_resources(client) {
        server.register_resource(resource).await;
    }

    server
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr: stdout carries the protocol. `RUST_LOG` overrides
/// `default_level`.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
