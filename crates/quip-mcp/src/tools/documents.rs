//! Document tools
//!
//! Search, read, create, edit and delete Quip documents, and list recently
//! viewed threads.

use super::{limit_or_default, parse_args, require};
use crate::format::{format_timestamp, html_to_markdown};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use quip_client::{ContentFormat, Document, EditOperation, QuipClient, DELETE_CONFIRMATION};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Get all document tools.
pub fn document_tools(client: QuipClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SearchDocumentsTool::new(client.clone())),
        Arc::new(GetDocumentTool::new(client.clone())),
        Arc::new(CreateDocumentTool::new(client.clone())),
        Arc::new(EditDocumentTool::new(client.clone())),
        Arc::new(DeleteDocumentTool::new(client.clone())),
        Arc::new(RecentThreadsTool::new(client)),
    ]
}

fn parse_format(format: Option<&str>) -> McpServerResult<ContentFormat> {
    match format {
        None => Ok(ContentFormat::default()),
        Some(name) => name
            .parse()
            .map_err(|e: quip_client::QuipError| McpServerError::InvalidParams(e.to_string())),
    }
}

/// Tool to search documents.
pub struct SearchDocumentsTool {
    client: QuipClient,
}

impl SearchDocumentsTool {
    pub fn new(client: QuipClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchDocumentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("search_documents", "Search for Quip documents by keyword")
            .read_only()
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of results to return",
                        "default": 10
                    }
                },
                "required": ["query"]
            }))
    }

    #[instrument(skip(self, args, context), fields(tool = "search_documents", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: serde_json::Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: SearchDocumentsParams = parse_args(args)?;
        let limit = limit_or_default(params.limit);

        debug!("Searching documents: {} (limit {})", params.query, limit);

        match self.client.search_documents(&params.query, limit).await {
            Ok(result) => Ok(ToolResult::text(render_search(&params.query, &result.documents))),
            Err(e) => {
                error!("Failed to search documents: {}", e);
                Ok(ToolResult::error(format!("Failed to search documents: {}", e)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchDocumentsParams {
    query: String,
    #[serde(default)]
    limit: Option<f64>,
}

fn render_search(query: &str, documents: &[Document]) -> String {
    if documents.is_empty() {
        return format!("No documents found matching '{}'.", query);
    }

    let mut response = format!("Found {} documents:\n\n", documents.len());
    for (i, doc) in documents.iter().enumerate() {
        response.push_str(&format!("{}. **{}**\n", i + 1, doc.title));
        response.push_str(&format!("   - ID: {}\n", doc.id));
        response.push_str(&format!("   - Link: {}\n", doc.link));
        response.push_str(&format!("   - Author: {}\n", doc.author_id));
        response.push_str(&format!(
            "   - Updated: {}\n\n",
            format_timestamp(doc.updated_at.as_secs())
        ));
    }
    response
}

/// Tool to read a document with its content.
pub struct GetDocumentTool {
    client: QuipClient,
}

impl GetDocumentTool {
    pub fn new(client: QuipClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetDocumentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_document",
            "Get a Quip document's metadata and its content converted to Markdown",
        )
        .read_only()
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "document_id": {
                    "type": "string",
                    "description": "The document (thread) ID"
                }
            },
            "required": ["document_id"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "get_document", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: serde_json::Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: DocumentIdParams = parse_args(args)?;
        require("document_id", &params.document_id)?;

        match self.client.document(&params.document_id).await {
            Ok(doc) => Ok(ToolResult::text(render_document(&doc))),
            Err(e) => {
                error!("Failed to get document: {}", e);
                Ok(ToolResult::error(format!("Failed to get document: {}", e)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentIdParams {
    pub(crate) document_id: String,
}

fn render_document(doc: &Document) -> String {
    let mut response = format!("**{}**\n\n", doc.title);
    response.push_str(&format!("- **ID:** {}\n", doc.id));
    response.push_str(&format!("- **Type:** {}\n", doc.doc_type));
    response.push_str(&format!("- **Link:** {}\n", doc.link));
    response.push_str(&format!("- **Author:** {}\n", doc.author_id));
    response.push_str(&format!(
        "- **Created:** {}\n",
        format_timestamp(doc.created_at.as_secs())
    ));
    response.push_str(&format!(
        "- **Updated:** {}\n",
        format_timestamp(doc.updated_at.as_secs())
    ));
    if !doc.access_level.is_empty() {
        response.push_str(&format!("- **Access Level:** {}\n", doc.access_level));
    }

    if doc.has_content() {
        response.push_str(&format!("\n**Content:**\n{}\n", html_to_markdown(&doc.html)));
    }
    response
}

/// Tool to create a document.
pub struct CreateDocumentTool {
    client: QuipClient,
}

impl CreateDocumentTool {
    pub fn new(client: QuipClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateDocumentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_document", "Create a new Quip document")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Document title"
                    },
                    "content": {
                        "type": "string",
                        "description": "Initial document content"
                    },
                    "format": {
                        "type": "string",
                        "enum": ["html", "markdown"],
                        "description": "Format of the content",
                        "default": "html"
                    }
                },
                "required": ["title"]
            }))
            .annotated(false, false)
    }

    #[instrument(skip(self, args, context), fields(tool = "create_document", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: serde_json::Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateDocumentParams = parse_args(args)?;
        require("title", &params.title)?;
        let format = parse_format(params.format.as_deref())?;

        match self
            .client
            .create_document(&params.title, &params.content, format)
            .await
        {
            Ok(doc) => {
                let mut response = String::from("Document created successfully!\n\n");
                response.push_str(&format!("- **Title:** {}\n", doc.title));
                response.push_str(&format!("- **ID:** {}\n", doc.id));
                response.push_str(&format!("- **Link:** {}\n", doc.link));
                response.push_str(&format!(
                    "- **Created:** {}\n",
                    format_timestamp(doc.created_at.as_secs())
                ));
                Ok(ToolResult::text(response))
            }
            Err(e) => {
                error!("Failed to create document: {}", e);
                Ok(ToolResult::error(format!("Failed to create document: {}", e)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateDocumentParams {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    format: Option<String>,
}

/// Tool to edit a document.
pub struct EditDocumentTool {
    client: QuipClient,
}

impl EditDocumentTool {
    pub fn new(client: QuipClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EditDocumentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "edit_document",
            "Add content to an existing Quip document. APPEND adds at the end and PREPEND at the \
             start. REPLACE cannot replace existing content through the API and appends like APPEND.",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "document_id": {
                    "type": "string",
                    "description": "The document (thread) ID"
                },
                "content": {
                    "type": "string",
                    "description": "Content to add"
                },
                "operation": {
                    "type": "string",
                    "enum": ["REPLACE", "APPEND", "PREPEND"],
                    "description": "Where to put the content (REPLACE appends)",
                    "default": "REPLACE"
                },
                "format": {
                    "type": "string",
                    "enum": ["html", "markdown"],
                    "description": "Format of the content",
                    "default": "html"
                }
            },
            "required": ["document_id", "content"]
        }))
        .annotated(false, false)
    }

    #[instrument(skip(self, args, context), fields(tool = "edit_document", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: serde_json::Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: EditDocumentParams = parse_args(args)?;
        require("document_id", &params.document_id)?;
        let format = parse_format(params.format.as_deref())?;
        let operation = params
            .operation
            .as_deref()
            .map(EditOperation::from_name)
            .unwrap_or_default();

        debug!("Editing document {} ({})", params.document_id, operation);

        match self
            .client
            .edit_document(&params.document_id, &params.content, operation, format)
            .await
        {
            Ok(doc) => {
                let mut response = format!("Document updated successfully ({})!\n\n", operation);
                response.push_str(&format!("- **Title:** {}\n", doc.title));
                response.push_str(&format!("- **ID:** {}\n", doc.id));
                response.push_str(&format!("- **Link:** {}\n", doc.link));
                response.push_str(&format!(
                    "- **Updated:** {}\n",
                    format_timestamp(doc.updated_at.as_secs())
                ));
                Ok(ToolResult::text(response))
            }
            Err(e) => {
                error!("Failed to edit document: {}", e);
                Ok(ToolResult::error(format!("Failed to edit document: {}", e)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct EditDocumentParams {
    document_id: String,
    content: String,
    #[serde(default)]
    operation: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

/// Tool to delete a document. Requires `confirm` to be exactly `DELETE`.
pub struct DeleteDocumentTool {
    client: QuipClient,
}

impl DeleteDocumentTool {
    pub fn new(client: QuipClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DeleteDocumentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "delete_document",
            "Delete a Quip document. Set confirm to DELETE to proceed.",
        )
        .destructive()
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "document_id": {
                    "type": "string",
                    "description": "The document (thread) ID"
                },
                "confirm": {
                    "type": "string",
                    "description": "Must be exactly 'DELETE' to confirm deletion"
                }
            },
            "required": ["document_id", "confirm"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "delete_document", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: serde_json::Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: DeleteDocumentParams = parse_args(args)?;
        require("document_id", &params.document_id)?;

        match self
            .client
            .delete_document(&params.document_id, &params.confirm)
            .await
        {
            Ok(doc) => {
                let mut response = String::from("Document deleted successfully!\n\n");
                response.push_str(&format!("- **Deleted Document:** {}\n", doc.title));
                response.push_str(&format!("- **ID:** {}\n", doc.id));
                Ok(ToolResult::text(response))
            }
            Err(e) if e.is_validation() => {
                warn!("Deletion of {} not confirmed", params.document_id);
                Ok(ToolResult::error(format!(
                    "Deletion cancelled. To delete the document, you must set confirm='{}'",
                    DELETE_CONFIRMATION
                )))
            }
            Err(e) => {
                error!("Failed to delete document: {}", e);
                Ok(ToolResult::error(format!("Failed to delete document: {}", e)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteDocumentParams {
    document_id: String,
    #[serde(default)]
    confirm: String,
}

/// Tool to list recently viewed threads.
pub struct RecentThreadsTool {
    client: QuipClient,
}

impl RecentThreadsTool {
    pub fn new(client: QuipClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for RecentThreadsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_recent_threads",
            "List the current user's recently viewed Quip threads, newest first",
        )
        .read_only()
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "number",
                    "description": "Maximum number of threads to return",
                    "default": 10
                }
            },
            "required": []
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "get_recent_threads", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: serde_json::Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: RecentThreadsParams = parse_args(args)?;
        let limit = limit_or_default(params.limit);

        match self.client.recent_documents(limit).await {
            Ok(threads) => Ok(ToolResult::text(render_recent(&threads))),
            Err(e) => {
                error!("Failed to get recent threads: {}", e);
                Ok(ToolResult::error(format!("Failed to get recent threads: {}", e)))
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RecentThreadsParams {
    #[serde(default)]
    limit: Option<f64>,
}

fn render_recent(threads: &[Document]) -> String {
    if threads.is_empty() {
        return "No recent threads found.".to_string();
    }

    let mut response = format!("Found {} recent threads:\n\n", threads.len());
    for (i, thread) in threads.iter().enumerate() {
        response.push_str(&format!("{}. **{}**\n", i + 1, thread.title));
        response.push_str(&format!("   - ID: {}\n", thread.id));
        response.push_str(&format!("   - Type: {}\n", thread.doc_type));
        response.push_str(&format!("   - Link: {}\n", thread.link));
        response.push_str(&format!(
            "   - Updated: {}\n\n",
            format_timestamp(thread.updated_at.as_secs())
        ));
    }
    response
}
