//! Comment tools

use super::documents::DocumentIdParams;
use super::{parse_args, require};
use crate::format::{format_timestamp, truncate_text};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use quip_client::{Comment, QuipClient};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Longest comment text shown per entry.
pub const COMMENT_PREVIEW_CHARS: usize = 1000;

/// Get all comment tools.
pub fn comment_tools(client: QuipClient) -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(GetDocumentCommentsTool::new(client))]
}

/// Tool to list the comments on a document.
pub struct GetDocumentCommentsTool {
    client: QuipClient,
}

impl GetDocumentCommentsTool {
    pub fn new(client: QuipClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetDocumentCommentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_document_comments", "Get the comments on a Quip document")
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

    #[instrument(skip(self, args, context), fields(tool = "get_document_comments", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: serde_json::Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: DocumentIdParams = parse_args(args)?;
        require("document_id", &params.document_id)?;

        match self.client.document_comments(&params.document_id).await {
            Ok(comments) => {
                debug!("Fetched {} comments", comments.len());
                Ok(ToolResult::text(render_comments(&comments)))
            }
            Err(e) => {
                error!("Failed to get comments: {}", e);
                Ok(ToolResult::error(format!("Failed to get comments: {}", e)))
            }
        }
    }
}

fn render_comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return "No comments found for this document.".to_string();
    }

    let mut response = format!("Found {} comments:\n\n", comments.len());
    for (i, comment) in comments.iter().enumerate() {
        let author = comment
            .author_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&comment.author_id);
        response.push_str(&format!("{}. **Author:** {}\n", i + 1, author));
        response.push_str(&format!(
            "   **Created:** {}\n",
            format_timestamp(comment.created_at.as_secs())
        ));
        response.push_str(&format!(
            "   **Text:** {}\n\n",
            truncate_text(&comment.text, COMMENT_PREVIEW_CHARS)
        ));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use quip_client::MicrosTimestamp;

    #[test]
    fn test_render_comments() {
        let comments = vec![
            Comment {
                id: "C1".to_string(),
                text: "Looks good".to_string(),
                author_id: "U1".to_string(),
                author_name: Some("Ada".to_string()),
                created_at: MicrosTimestamp(1_640_995_200_000_000),
                ..Comment::default()
            },
            Comment {
                id: "C2".to_string(),
                text: "Agreed".to_string(),
                author_id: "U2".to_string(),
                ..Comment::default()
            },
        ];

        let text = render_comments(&comments);
        assert!(text.starts_with("Found 2 comments:"));
        assert!(text.contains("1. **Author:** Ada"));
        assert!(text.contains("   **Created:** 1640995200"));
        assert!(text.contains("2. **Author:** U2"));
        assert!(text.contains("   **Text:** Agreed"));
    }

    #[test]
    fn test_long_comment_is_truncated() {
        let comment = Comment {
            text: "x".repeat(COMMENT_PREVIEW_CHARS + 50),
            ..Comment::default()
        };

        let text = render_comments(&[comment]);
        assert!(text.contains(&format!("{}...", "x".repeat(COMMENT_PREVIEW_CHARS - 3))));
        assert!(!text.contains(&"x".repeat(COMMENT_PREVIEW_CHARS)));
    }

    #[test]
    fn test_render_no_comments() {
        assert_eq!(render_comments(&[]), "No comments found for this document.");
    }
}
