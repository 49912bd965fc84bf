//! User tools

use super::{parse_args, require};
use crate::format::format_timestamp;
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use quip_client::{QuipClient, User};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, instrument};

/// `user_id` value that selects the authenticated user.
pub const CURRENT_USER: &str = "current";

/// Get all user tools.
pub fn user_tools(client: QuipClient) -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(GetUserTool::new(client))]
}

/// Tool to look up a user, or the authenticated user with `current`.
pub struct GetUserTool {
    client: QuipClient,
}

impl GetUserTool {
    pub fn new(client: QuipClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetUserTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_user", "Get information about a Quip user")
            .read_only()
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "User ID, or 'current' for the authenticated user",
                        "default": CURRENT_USER
                    }
                },
                "required": []
            }))
    }

    #[instrument(skip(self, args, context), fields(tool = "get_user", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: serde_json::Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: GetUserParams = parse_args(args)?;

        let result = match params.user_id.as_deref() {
            None | Some(CURRENT_USER) => self.client.current_user().await,
            Some(user_id) => {
                require("user_id", user_id)?;
                self.client.user(user_id).await
            }
        };

        match result {
            Ok(user) => Ok(ToolResult::text(render_user(&user))),
            Err(e) => {
                error!("Failed to get user: {}", e);
                Ok(ToolResult::error(format!("Failed to get user: {}", e)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetUserParams {
    #[serde(default)]
    user_id: Option<String>,
}

// User timestamps are already seconds.
fn render_user(user: &User) -> String {
    let mut response = format!("**{}**\n\n", user.name);
    response.push_str(&format!("- **ID:** {}\n", user.id));
    response.push_str(&format!("- **Email:** {}\n", user.email));
    response.push_str(&format!("- **Profile URL:** {}\n", user.url));
    response.push_str(&format!(
        "- **Created:** {}\n",
        format_timestamp(user.created_at.as_secs())
    ));
    response.push_str(&format!(
        "- **Updated:** {}\n",
        format_timestamp(user.updated_at.as_secs())
    ));
    if let Some(picture) = user.profile_picture_url.as_deref().filter(|p| !p.is_empty()) {
        response.push_str(&format!("- **Profile Picture:** {}\n", picture));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use quip_client::SecondsTimestamp;

    #[test]
    fn test_render_user_uses_seconds() {
        let user = User {
            id: "U1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            created_at: SecondsTimestamp(1_640_995_200),
            ..User::default()
        };

        let text = render_user(&user);
        assert!(text.starts_with("**Ada**"));
        assert!(text.contains("- **Created:** 1640995200"));
        assert!(text.contains("- **Updated:** Unknown"));
        assert!(!text.contains("Profile Picture"));
    }

    #[test]
    fn test_render_user_picture() {
        let user = User {
            profile_picture_url: Some("https://quip.com/pic.png".to_string()),
            ..User::default()
        };
        assert!(render_user(&user).contains("- **Profile Picture:** https://quip.com/pic.png"));
    }
}
