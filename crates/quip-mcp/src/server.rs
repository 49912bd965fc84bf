//! MCP server implementation
//!
//! This module provides the MCP server that exposes Quip operations as tools
//! and resources, plus the newline-delimited JSON-RPC loop that drives it
//! over stdio.

use crate::types::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// MCP server error types.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Tool execution failed
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpServerError {
    /// JSON-RPC error object for this failure.
    pub fn to_rpc_error(&self) -> McpError {
        match self {
            McpServerError::ToolNotFound(_) | McpServerError::InvalidParams(_) => {
                McpError::invalid_params(self.to_string())
            }
            McpServerError::ResourceNotFound(uri) => McpError::resource_not_found(uri),
            McpServerError::ExecutionError(_) | McpServerError::Internal(_) => {
                McpError::internal_error(self.to_string())
            }
        }
    }
}

/// Result type for MCP server operations.
pub type McpServerResult<T> = Result<T, McpServerError>;

/// Trait for tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult>;
}

/// Trait for readable resources.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Get the resource definition.
    fn definition(&self) -> ResourceDefinition;

    /// Read the resource contents.
    async fn read(&self, context: &ToolContext) -> McpServerResult<ResourceContents>;
}

/// Context for tool execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Request correlation ID
    pub correlation_id: String,
}

impl ToolContext {
    /// Create a context with a fresh correlation ID.
    pub fn new() -> Self {
        Self {
            correlation_id: uuid::Uuid::now_v7().to_string(),
        }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new()
    }
}

/// MCP server.
///
/// Tools and resources are registered up front and looked up by name or URI
/// for each request.
pub struct McpServer {
    /// Server info
    info: ServerInfo,

    /// Server capabilities
    capabilities: ServerCapabilities,

    /// Instructions sent to the client on initialize
    instructions: Option<String>,

    /// Registered tools
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,

    /// Registered resources
    resources: Arc<RwLock<HashMap<String, Arc<dyn Resource>>>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities { list_changed: false }),
                resources: Some(ResourceCapabilities {
                    subscribe: false,
                    list_changed: false,
                }),
            },
            instructions: None,
            tools: Arc::new(RwLock::new(HashMap::new())),
            resources: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set the instructions returned from `initialize`.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Register a tool.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        let mut tools = self.tools.write().await;
        tools.insert(name, tool);
    }

    /// Register multiple tools.
    pub async fn register_tools(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register_tool(tool).await;
        }
    }

    /// Register a resource.
    pub async fn register_resource(&self, resource: Arc<dyn Resource>) {
        let uri = resource.definition().uri;
        let mut resources = self.resources.write().await;
        resources.insert(uri, resource);
    }

    /// Get all tool definitions, sorted by name.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        let mut definitions: Vec<_> = tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Get all resource definitions, sorted by URI.
    pub async fn list_resources(&self) -> Vec<ResourceDefinition> {
        let resources = self.resources.read().await;
        let mut definitions: Vec<_> = resources.values().map(|r| r.definition()).collect();
        definitions.sort_by(|a, b| a.uri.cmp(&b.uri));
        definitions
    }

    /// Execute a tool.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let tool = {
            let tools = self.tools.read().await;
            tools
                .get(name)
                .cloned()
                .ok_or_else(|| McpServerError::ToolNotFound(name.to_string()))?
        };

        tool.execute(arguments, context).await
    }

    /// Read a resource.
    pub async fn read_resource(
        &self,
        uri: &str,
        context: &ToolContext,
    ) -> McpServerResult<ResourceContents> {
        let resource = {
            let resources = self.resources.read().await;
            resources
                .get(uri)
                .cloned()
                .ok_or_else(|| McpServerError::ResourceNotFound(uri.to_string()))?
        };

        resource.read(context).await
    }

    /// Handle one raw message. Returns `None` when no reply is due.
    pub async fn handle_message(&self, line: &str) -> Option<McpResponse> {
        let request: McpRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Unparseable message: {}", e);
                return Some(McpResponse::error(
                    RequestId::Null,
                    McpError::parse_error().with_data(serde_json::json!(e.to_string())),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            let id = request.id.unwrap_or(RequestId::Null);
            return Some(McpResponse::error(id, McpError::invalid_request()));
        }

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        Some(self.handle_request(request).await)
    }

    /// Handle an MCP request.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn handle_request(&self, request: McpRequest) -> McpResponse {
        let id = request.id.unwrap_or(RequestId::Null);
        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => McpResponse::success(id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(id).await,
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "resources/list" => self.handle_resources_list(id).await,
            "resources/read" => self.handle_resources_read(id, request.params).await,
            _ => McpResponse::error(id, McpError::method_not_found(&request.method)),
        }
    }

    fn handle_initialize(&self, id: RequestId) -> McpResponse {
        let mut result = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": self.capabilities,
            "serverInfo": self.info
        });
        if let Some(instructions) = &self.instructions {
            result["instructions"] = serde_json::json!(instructions);
        }
        McpResponse::success(id, result)
    }

    async fn handle_tools_list(&self, id: RequestId) -> McpResponse {
        let tools = self.list_tools().await;
        McpResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
    ) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let call: ToolCall = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        let context = ToolContext::new();
        info!(tool = %call.name, correlation_id = %context.correlation_id, "Calling tool");

        let result = self
            .call_tool(&call.name, call.arguments, &context)
            .await
            .and_then(|result| {
                serde_json::to_value(result).map_err(|e| McpServerError::Internal(e.to_string()))
            });

        match result {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => {
                warn!(tool = %call.name, "Tool call failed: {}", e);
                McpResponse::error(id, e.to_rpc_error())
            }
        }
    }

    async fn handle_resources_list(&self, id: RequestId) -> McpResponse {
        let resources = self.list_resources().await;
        McpResponse::success(id, serde_json::json!({ "resources": resources }))
    }

    async fn handle_resources_read(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
    ) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let params: ReadResourceParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        let context = ToolContext::new();
        match self.read_resource(&params.uri, &context).await {
            Ok(contents) => McpResponse::success(id, serde_json::json!({ "contents": [contents] })),
            Err(e) => McpResponse::error(id, e.to_rpc_error()),
        }
    }

    /// Serve newline-delimited JSON-RPC until the reader reaches EOF.
    ///
    /// Each non-blank line is one message; each response is written as one
    /// line and flushed. Nothing but protocol messages goes to `writer`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                let mut encoded = serde_json::to_vec(&response)?;
                encoded.push(b'\n');
                writer.write_all(&encoded).await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Get server info.
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Get server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTool;

    #[async_trait]
    impl Tool for TestTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("test_tool", "A test tool")
        }

        async fn execute(
            &self,
            args: serde_json::Value,
            _context: &ToolContext,
        ) -> McpServerResult<ToolResult> {
            if args.get("fail").is_some() {
                return Err(McpServerError::InvalidParams("fail requested".to_string()));
            }
            Ok(ToolResult::text("Test result"))
        }
    }

    struct TestResource;

    #[async_trait]
    impl Resource for TestResource {
        fn definition(&self) -> ResourceDefinition {
            ResourceDefinition {
                uri: "test://thing".to_string(),
                name: "Thing".to_string(),
                description: None,
                mime_type: Some("text/plain".to_string()),
            }
        }

        async fn read(&self, _context: &ToolContext) -> McpServerResult<ResourceContents> {
            Ok(ResourceContents {
                uri: "test://thing".to_string(),
                mime_type: Some("text/plain".to_string()),
                text: "thing".to_string(),
            })
        }
    }

    async fn server() -> McpServer {
        let server = McpServer::new("test-server", "0.0.1");
        server.register_tool(Arc::new(TestTool)).await;
        server.register_resource(Arc::new(TestResource)).await;
        server
    }

    #[tokio::test]
    async fn test_register_tool() {
        let server = server().await;

        let tools = server.list_tools().await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "test_tool");
    }

    #[tokio::test]
    async fn test_call_tool() {
        let server = server().await;

        let result = server
            .call_tool("test_tool", serde_json::json!({}), &ToolContext::new())
            .await
            .unwrap();
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let server = server().await;

        let req = McpRequest::new("1", "tools/call")
            .with_params(serde_json::json!({"name": "nope", "arguments": {}}));
        let resp = server.handle_request(req).await;

        let error = resp.error.unwrap();
        assert_eq!(error.code, McpError::INVALID_PARAMS);
        assert!(error.message.contains("nope"));
    }

    #[tokio::test]
    async fn test_tool_param_error_maps_to_invalid_params() {
        let server = server().await;

        let req = McpRequest::new(3, "tools/call")
            .with_params(serde_json::json!({"name": "test_tool", "arguments": {"fail": true}}));
        let resp = server.handle_request(req).await;

        assert_eq!(resp.id, RequestId::Number(3));
        assert_eq!(resp.error.unwrap().code, McpError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_handle_initialize() {
        let server = McpServer::new("test-server", "0.0.1").with_instructions("Be nice");

        let resp = server.handle_request(McpRequest::new("1", "initialize")).await;

        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert_eq!(result["instructions"], "Be nice");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server().await;

        let resp = server.handle_request(McpRequest::new("1", "prompts/list")).await;
        assert_eq!(resp.error.unwrap().code, McpError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_read_resource() {
        let server = server().await;

        let req = McpRequest::new("1", "resources/read")
            .with_params(serde_json::json!({"uri": "test://thing"}));
        let result = server.handle_request(req).await.result.unwrap();
        assert_eq!(result["contents"][0]["text"], "thing");
        assert_eq!(result["contents"][0]["mimeType"], "text/plain");

        let req = McpRequest::new("2", "resources/read")
            .with_params(serde_json::json!({"uri": "test://other"}));
        let error = server.handle_request(req).await.error.unwrap();
        assert_eq!(error.code, McpError::RESOURCE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handle_message_parse_error() {
        let server = server().await;

        let resp = server.handle_message("{not json").await.unwrap();
        assert_eq!(resp.id, RequestId::Null);
        assert_eq!(resp.error.unwrap().code, McpError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let server = server().await;

        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_serve_writes_one_line_per_request() {
        let server = server().await;
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );

        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: McpResponse = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.id, RequestId::Number(1));
        let second: McpResponse = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.result.unwrap()["tools"][0]["name"], "test_tool");
    }
}
