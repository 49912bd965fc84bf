//! Quip API operations.
//!
//! [`QuipClient`] composes the transport and the normalizer: it validates
//! arguments, performs one round trip (two for delete) and normalizes the
//! response through the operation's cascade.

use crate::config::ClientConfig;
use crate::error::{QuipError, QuipResult};
use crate::models::{Comment, Document, SearchResult, User};
use crate::normalize;
use crate::transport::Transport;
use reqwest::Method;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};
use url::form_urlencoded;

/// Literal the caller must pass to confirm a deletion. Matched exactly.
pub const DELETE_CONFIRMATION: &str = "DELETE";

/// Logical edit operation.
///
/// The API only knows two insertion points: `0` (end of document) and `1`
/// (start of document). There is no replace-in-place, so `Replace` appends
/// exactly like `Append`. This is the observed API behavior and is kept
/// as is; whether some other parameter allows a true replace is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditOperation {
    /// Nominally replaces the content; actually appends.
    #[default]
    Replace,
    /// Append at the end of the document.
    Append,
    /// Insert at the start of the document.
    Prepend,
}

impl EditOperation {
    /// Parse an operation name. Unrecognized names fall back to `Replace`
    /// (and therefore append).
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "APPEND" => EditOperation::Append,
            "PREPEND" => EditOperation::Prepend,
            _ => EditOperation::Replace,
        }
    }

    /// Location code sent as the `location` form field.
    pub fn location(&self) -> u8 {
        match self {
            EditOperation::Replace | EditOperation::Append => 0,
            EditOperation::Prepend => 1,
        }
    }

    /// Operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EditOperation::Replace => "REPLACE",
            EditOperation::Append => "APPEND",
            EditOperation::Prepend => "PREPEND",
        }
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format of content sent to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFormat {
    /// HTML markup.
    #[default]
    Html,
    /// Markdown.
    Markdown,
}

impl ContentFormat {
    /// Wire value of the `format` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Html => "html",
            ContentFormat::Markdown => "markdown",
        }
    }
}

impl FromStr for ContentFormat {
    type Err = QuipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(ContentFormat::Html),
            "markdown" | "md" => Ok(ContentFormat::Markdown),
            other => Err(QuipError::validation(format!(
                "unsupported content format '{}': expected 'html' or 'markdown'",
                other
            ))),
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quip API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct QuipClient {
    transport: Transport,
}

impl QuipClient {
    /// Create a client.
    pub fn new(config: ClientConfig) -> QuipResult<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
        })
    }

    /// Create a client for the production API.
    pub fn with_token(token: impl Into<String>) -> QuipResult<Self> {
        Self::new(ClientConfig::new(token))
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Get the authenticated user.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> QuipResult<User> {
        let body = self.get("/users/current").await?;
        normalize::FETCH_USER.run(&body)
    }

    /// Get a user by ID.
    #[instrument(skip(self))]
    pub async fn user(&self, user_id: &str) -> QuipResult<User> {
        let body = self
            .get(&format!("/users/{}", path_segment("user_id", user_id)?))
            .await?;
        normalize::FETCH_USER.run(&body)
    }

    /// Search documents. A `limit` of zero leaves the count to the server.
    #[instrument(skip(self))]
    pub async fn search_documents(&self, query: &str, limit: usize) -> QuipResult<SearchResult> {
        let query_string = {
            let mut params = form_urlencoded::Serializer::new(String::new());
            params.append_pair("query", query);
            if limit > 0 {
                params.append_pair("count", &limit.to_string());
            }
            params.finish()
        };

        let body = self
            .get(&format!("/threads/search?{}", query_string))
            .await?;
        let documents = normalize::SEARCH_DOCUMENTS.run(&body)?;
        debug!("Search returned {} documents", documents.len());

        Ok(SearchResult::from_documents(documents))
    }

    /// Get a document, including its HTML content.
    #[instrument(skip(self))]
    pub async fn document(&self, document_id: &str) -> QuipResult<Document> {
        let body = self
            .get(&format!("/threads/{}", path_segment("document_id", document_id)?))
            .await?;
        normalize::FETCH_DOCUMENT.run(&body)
    }

    /// Create a document.
    #[instrument(skip(self, content))]
    pub async fn create_document(
        &self,
        title: &str,
        content: &str,
        format: ContentFormat,
    ) -> QuipResult<Document> {
        require("title", title)?;

        let body = self
            .transport
            .send_form(
                Method::POST,
                "/threads/new-document",
                &[
                    ("title", title),
                    ("content", content),
                    ("format", format.as_str()),
                ],
            )
            .await?;
        let doc = normalize::CREATE_DOCUMENT.run(&body)?;
        info!("Created document {}", doc.id);

        Ok(doc)
    }

    /// Edit a document. See [`EditOperation`] for what `Replace` really does.
    #[instrument(skip(self, content))]
    pub async fn edit_document(
        &self,
        document_id: &str,
        content: &str,
        operation: EditOperation,
        format: ContentFormat,
    ) -> QuipResult<Document> {
        require("document_id", document_id)?;

        let location = operation.location().to_string();
        let body = self
            .transport
            .send_form(
                Method::POST,
                "/threads/edit-document",
                &[
                    ("thread_id", document_id),
                    ("content", content),
                    ("location", location.as_str()),
                    ("format", format.as_str()),
                ],
            )
            .await?;

        normalize::EDIT_DOCUMENT.run(&body)
    }

    /// Delete a document.
    ///
    /// `confirmation` must equal [`DELETE_CONFIRMATION`] exactly; anything else
    /// is rejected before any request. The document is fetched first and
    /// returned so callers can report what was deleted. If that fetch fails
    /// the delete is not attempted.
    #[instrument(skip(self))]
    pub async fn delete_document(&self, document_id: &str, confirmation: &str) -> QuipResult<Document> {
        if confirmation != DELETE_CONFIRMATION {
            return Err(QuipError::validation(format!(
                "deletion not confirmed: confirm must be exactly '{}'",
                DELETE_CONFIRMATION
            )));
        }
        require("document_id", document_id)?;

        let doc = self.document(document_id).await?;

        self.transport
            .send_form(
                Method::POST,
                "/threads/delete",
                &[("thread_id", document_id), ("wipeout", "false")],
            )
            .await?;
        info!("Deleted document {} ({})", doc.id, doc.title);

        Ok(doc)
    }

    /// Get the current user's recently viewed documents.
    #[instrument(skip(self))]
    pub async fn recent_documents(&self, limit: usize) -> QuipResult<Vec<Document>> {
        let body = self
            .get(&format!("/threads/recent?count={}", limit))
            .await?;
        normalize::RECENT_DOCUMENTS.run(&body)
    }

    /// Get the comments on a document.
    #[instrument(skip(self))]
    pub async fn document_comments(&self, document_id: &str) -> QuipResult<Vec<Comment>> {
        let body = self
            .get(&format!(
                "/threads/{}/messages",
                path_segment("document_id", document_id)?
            ))
            .await?;
        normalize::FETCH_COMMENTS.run(&body)
    }

    async fn get(&self, path: &str) -> QuipResult<Vec<u8>> {
        self.transport.send::<()>(Method::GET, path, None).await
    }
}

/// Reject empty identifiers before they turn into odd URLs.
fn require(name: &str, value: &str) -> QuipResult<()> {
    if value.trim().is_empty() {
        return Err(QuipError::validation(format!("{} must not be empty", name)));
    }
    Ok(())
}

/// Percent-encode an identifier as exactly one path segment.
///
/// `/`, `?`, `#` and `%` are escaped, and the dot segments `.` and `..` are
/// rejected, so an id can never address a different endpoint.
fn path_segment(name: &str, id: &str) -> QuipResult<String> {
    require(name, id)?;
    if id == "." || id == ".." {
        return Err(QuipError::validation(format!(
            "{} must not be a relative path segment",
            name
        )));
    }

    // byte_serialize escapes a literal '+' as %2B, so any '+' left is a space.
    let encoded: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
    Ok(encoded.replace('+', "%20"))
}
