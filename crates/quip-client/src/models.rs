//! Canonical Quip entities.
//!
//! These are the records handed to callers regardless of which response shape
//! the API used. Every field defaults when absent so that a loosely matching
//! payload still decodes; the normalizer is what rejects empty results.
//!
//! Timestamps come in two units on the wire: documents and comments carry
//! microseconds (`created_usec`), users carry seconds (`created`). The unit
//! difference is an upstream inconsistency that is kept as observed, with a
//! distinct newtype per unit so the two cannot be mixed up.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Decode an explicit `null` as the field's default.
///
/// `#[serde(default)]` only covers absent keys; the API also sends `null`.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Timestamp in microseconds since the Unix epoch. Zero means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MicrosTimestamp(pub i64);

impl MicrosTimestamp {
    /// Whole seconds, or `None` when unknown.
    pub fn as_secs(&self) -> Option<i64> {
        (self.0 != 0).then(|| self.0 / 1_000_000)
    }

    /// Whether the server reported no timestamp.
    pub fn is_unknown(&self) -> bool {
        self.0 == 0
    }
}

/// Timestamp in seconds since the Unix epoch. Zero means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecondsTimestamp(pub i64);

impl SecondsTimestamp {
    /// Whole seconds, or `None` when unknown.
    pub fn as_secs(&self) -> Option<i64> {
        (self.0 != 0).then_some(self.0)
    }

    /// Whether the server reported no timestamp.
    pub fn is_unknown(&self) -> bool {
        self.0 == 0
    }
}

/// Kind of thread a document represents.
///
/// The API documents three values but others appear in practice; those are
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    /// Rich text document.
    Document,
    /// Chat room.
    Chat,
    /// Spreadsheet.
    Spreadsheet,
    /// Anything else, including the empty string.
    Other(String),
}

impl DocumentType {
    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            DocumentType::Document => "document",
            DocumentType::Chat => "chat",
            DocumentType::Spreadsheet => "spreadsheet",
            DocumentType::Other(other) => other,
        }
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Other(String::new())
    }
}

impl From<String> for DocumentType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "document" => DocumentType::Document,
            "chat" => DocumentType::Chat,
            "spreadsheet" => DocumentType::Spreadsheet,
            _ => DocumentType::Other(value),
        }
    }
}

impl From<DocumentType> for String {
    fn from(value: DocumentType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Quip document (a "thread" in API terms).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Stable identifier.
    #[serde(deserialize_with = "null_default")]
    pub id: String,

    /// Thread kind.
    #[serde(rename = "type", deserialize_with = "null_default")]
    pub doc_type: DocumentType,

    /// Title.
    #[serde(deserialize_with = "null_default")]
    pub title: String,

    /// Creation time.
    #[serde(rename = "created_usec", deserialize_with = "null_default")]
    pub created_at: MicrosTimestamp,

    /// Last update time.
    #[serde(rename = "updated_usec", deserialize_with = "null_default")]
    pub updated_at: MicrosTimestamp,

    /// Author user ID.
    #[serde(deserialize_with = "null_default")]
    pub author_id: String,

    /// Raw HTML content. Empty when the content was not fetched.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
    pub html: String,

    /// Web link.
    #[serde(deserialize_with = "null_default")]
    pub link: String,

    /// Access level of the current user.
    #[serde(deserialize_with = "null_default")]
    pub access_level: String,

    /// Whether the document is a template.
    #[serde(deserialize_with = "null_default")]
    pub is_template: bool,

    /// Thread identifier used by some endpoints.
    #[serde(deserialize_with = "null_default")]
    pub thread_id: String,

    /// Containing shared folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_folder_id: Option<String>,

    /// Whether the current user follows the thread.
    #[serde(deserialize_with = "null_default")]
    pub user_is_following: bool,

    /// Users with expanded access.
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_default")]
    pub expanded_user_ids: Vec<String>,
}

impl Document {
    /// Whether content was fetched alongside the metadata.
    pub fn has_content(&self) -> bool {
        !self.html.is_empty()
    }
}

/// A Quip user.
///
/// `created_at`/`updated_at` are seconds, unlike document timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// User ID.
    #[serde(deserialize_with = "null_default")]
    pub id: String,

    /// Display name.
    #[serde(deserialize_with = "null_default")]
    pub name: String,

    /// Primary email.
    #[serde(deserialize_with = "null_default")]
    pub email: String,

    /// Profile URL.
    #[serde(deserialize_with = "null_default")]
    pub url: String,

    /// Account creation time.
    #[serde(rename = "created", deserialize_with = "null_default")]
    pub created_at: SecondsTimestamp,

    /// Last update time.
    #[serde(rename = "updated", deserialize_with = "null_default")]
    pub updated_at: SecondsTimestamp,

    /// Profile picture URL.
    #[serde(rename = "profile_picture_url", skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,

    /// All known emails.
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_default")]
    pub emails: Vec<String>,

    /// Whether the account is chat-only.
    #[serde(deserialize_with = "null_default")]
    pub chat_only: bool,
}

/// A comment (message) on a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    /// Comment ID.
    #[serde(deserialize_with = "null_default")]
    pub id: String,

    /// Plain text.
    #[serde(deserialize_with = "null_default")]
    pub text: String,

    /// Author user ID.
    #[serde(deserialize_with = "null_default")]
    pub author_id: String,

    /// Author display name, when the API includes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Creation time.
    #[serde(rename = "created_usec", deserialize_with = "null_default")]
    pub created_at: MicrosTimestamp,

    /// Last update time.
    #[serde(rename = "updated_usec", deserialize_with = "null_default")]
    pub updated_at: MicrosTimestamp,

    /// Parent comment for replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Whether the comment is visible.
    #[serde(deserialize_with = "null_default")]
    pub visible: bool,
}

impl Comment {
    /// Whether this comment starts a thread rather than replying.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.as_deref().map_or(true, str::is_empty)
    }
}

/// Search results.
///
/// The search endpoint never returns users; `users` is always empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matching documents in server relevance order.
    pub documents: Vec<Document>,

    /// Matching users.
    pub users: Vec<User>,
}

impl SearchResult {
    /// Wrap documents returned by a search.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self {
            documents,
            users: Vec::new(),
        }
    }
}
