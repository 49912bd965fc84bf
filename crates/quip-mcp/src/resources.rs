//! MCP resources

use crate::server::{McpServerError, McpServerResult, Resource, ToolContext};
use crate::types::{ResourceContents, ResourceDefinition};
use async_trait::async_trait;
use quip_client::{QuipClient, User};
use std::sync::Arc;
use tracing::{error, instrument};

/// URI of the current-user resource.
pub const CURRENT_USER_URI: &str = "quip://user/current";

/// Get all resources.
pub fn all_resources(client: QuipClient) -> Vec<Arc<dyn Resource>> {
    vec![Arc::new(CurrentUserResource::new(client))]
}

/// The authenticated user, as JSON.
pub struct CurrentUserResource {
    client: QuipClient,
}

impl CurrentUserResource {
    pub fn new(client: QuipClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for CurrentUserResource {
    fn definition(&self) -> ResourceDefinition {
        ResourceDefinition {
            uri: CURRENT_USER_URI.to_string(),
            name: "Current User".to_string(),
            description: Some("Information about the authenticated Quip user".to_string()),
            mime_type: Some("application/json".to_string()),
        }
    }

    #[instrument(skip(self, context), fields(resource = CURRENT_USER_URI, correlation_id = %context.correlation_id))]
    async fn read(&self, context: &ToolContext) -> McpServerResult<ResourceContents> {
        let user = self.client.current_user().await.map_err(|e| {
            error!("Failed to get current user: {}", e);
            McpServerError::ExecutionError(format!("Failed to get current user: {}", e))
        })?;

        let text = serde_json::to_string_pretty(&user_json(&user))
            .map_err(|e| McpServerError::Internal(e.to_string()))?;

        Ok(ResourceContents {
            uri: CURRENT_USER_URI.to_string(),
            mime_type: Some("application/json".to_string()),
            text,
        })
    }
}

fn user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "url": user.url,
        "created": user.created_at,
        "updated": user.updated_at,
    })
}
