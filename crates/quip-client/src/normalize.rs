//! Response-shape normalization.
//!
//! The API wraps the same document in different envelopes depending on the
//! endpoint (and sometimes on the account):
//!
//! ```text
//! (a) bare          { "id": ..., "title": ... }
//! (b) wrapper       { "thread": { ... } }
//! (c) sideband      { "thread": { ... }, "html": "...", "user_ids": [...] }
//! (d) keyed map     { "<key>": <(c)>, ... }
//! (e) wrapper list  [ <(b)>, ... ]
//! ```
//!
//! Each operation owns a [`Cascade`]: an ordered list of [`Candidate`]
//! decoders. A candidate yields a value only when the body parses into its
//! shape AND the value passes the candidate's acceptance check (a non-empty
//! `id`). Loose JSON decodes into the wrong shape with every field defaulted,
//! so the id check is what tells the right shape from a structural accident.
//!
//! Ordering is empirical: a future response shape could satisfy an earlier,
//! wrong candidate. The id gate and the `thread` key required by the
//! envelope candidates keep that unlikely, not impossible.

use crate::error::{QuipError, QuipResult};
use crate::models::{null_default, Comment, Document, User};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Decodes a raw body into a candidate shape.
pub type DecodeFn<T> = fn(&[u8]) -> Result<T, serde_json::Error>;

/// Acceptance check applied to a structurally decoded value.
pub type AcceptFn<T> = fn(&T) -> bool;

/// One step of a cascade.
pub struct Candidate<T: 'static> {
    /// Shape name, used in logs.
    pub name: &'static str,
    /// Structural decoder.
    pub decode: DecodeFn<T>,
    /// Validity predicate.
    pub accept: AcceptFn<T>,
}

impl<T: 'static> Candidate<T> {
    /// Try this candidate. `Ok(None)` means it parsed but was not accepted.
    pub fn attempt(&self, body: &[u8]) -> Result<Option<T>, serde_json::Error> {
        let value = (self.decode)(body)?;
        Ok((self.accept)(&value).then_some(value))
    }
}

/// Ordered candidate decoders for one operation; first accepted value wins.
pub struct Cascade<T: 'static> {
    /// Operation name, used in logs and errors.
    pub operation: &'static str,
    /// Candidates in priority order.
    pub candidates: &'static [Candidate<T>],
}

impl<T: 'static> Cascade<T> {
    /// Run the cascade over a response body.
    pub fn run(&self, body: &[u8]) -> QuipResult<T> {
        let mut rejected = false;
        let mut last_error = None;

        for candidate in self.candidates {
            match candidate.attempt(body) {
                Ok(Some(value)) => {
                    debug!(
                        operation = self.operation,
                        shape = candidate.name,
                        "Normalized response"
                    );
                    return Ok(value);
                }
                Ok(None) => {
                    debug!(
                        operation = self.operation,
                        shape = candidate.name,
                        "Shape parsed but failed validity check"
                    );
                    rejected = true;
                }
                Err(e) => {
                    debug!(
                        operation = self.operation,
                        shape = candidate.name,
                        error = %e,
                        "Shape did not parse"
                    );
                    last_error = Some(e);
                }
            }
        }

        let reason = match last_error {
            Some(e) if !rejected => format!("malformed response: {}", e),
            _ => "unrecognized response format".to_string(),
        };
        Err(QuipError::decode(self.operation, reason, body))
    }
}

// -----------------------------------------------------------------------------
// Wire envelopes
// -----------------------------------------------------------------------------

/// Shape (b): `{ "thread": Document }`.
#[derive(Debug, Deserialize)]
struct ThreadWrapper {
    thread: Document,
}

/// Shape (c): `{ "thread": Document, "html": "...", ... }`.
///
/// `thread` is required, which keeps a bare document from parsing as (c).
#[derive(Debug, Deserialize)]
struct ThreadEnvelope {
    thread: Document,
    #[serde(default, deserialize_with = "null_default")]
    html: String,
}

impl ThreadEnvelope {
    /// The document, with sideband HTML moved in when present.
    fn into_document(self) -> Document {
        let mut doc = self.thread;
        if !self.html.is_empty() {
            doc.html = self.html;
        }
        doc
    }
}

// -----------------------------------------------------------------------------
// Candidate decoders
// -----------------------------------------------------------------------------

/// Shape (a).
pub fn bare_document(body: &[u8]) -> Result<Document, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Shape (c), also accepts (b) since `html` is optional.
pub fn sideband_envelope(body: &[u8]) -> Result<Document, serde_json::Error> {
    serde_json::from_slice::<ThreadEnvelope>(body).map(ThreadEnvelope::into_document)
}

/// Shape (d). Map entries carry no order; the most recently updated come first.
pub fn envelope_map(body: &[u8]) -> Result<Vec<Document>, serde_json::Error> {
    let map: BTreeMap<String, ThreadEnvelope> = serde_json::from_slice(body)?;
    let mut docs: Vec<Document> = map.into_values().map(ThreadEnvelope::into_document).collect();
    docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    Ok(docs)
}

/// Sequence of shape (a).
pub fn bare_document_list(body: &[u8]) -> Result<Vec<Document>, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Shape (e).
pub fn wrapper_list(body: &[u8]) -> Result<Vec<Document>, serde_json::Error> {
    let wrappers: Vec<ThreadWrapper> = serde_json::from_slice(body)?;
    Ok(wrappers.into_iter().map(|w| w.thread).collect())
}

/// Bare user object.
pub fn bare_user(body: &[u8]) -> Result<User, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Bare comment sequence.
pub fn comment_list(body: &[u8]) -> Result<Vec<Comment>, serde_json::Error> {
    serde_json::from_slice(body)
}

// -----------------------------------------------------------------------------
// Validity predicates
// -----------------------------------------------------------------------------

/// Entities that carry an identifier.
pub trait Identified {
    /// The entity's identifier.
    fn id(&self) -> &str;
}

impl Identified for Document {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for User {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A single entity is valid when its id is non-empty.
pub fn has_id<T: Identified>(value: &T) -> bool {
    !value.id().is_empty()
}

/// A sequence is valid when every element has an id. Empty is valid.
#[allow(clippy::ptr_arg)]
pub fn all_have_ids<T: Identified>(values: &Vec<T>) -> bool {
    values.iter().all(has_id)
}

/// Like [`all_have_ids`] but an empty sequence is rejected.
#[allow(clippy::ptr_arg)]
pub fn non_empty_with_ids<T: Identified>(values: &Vec<T>) -> bool {
    !values.is_empty() && all_have_ids(values)
}

// -----------------------------------------------------------------------------
// Per-operation cascades
// -----------------------------------------------------------------------------

/// `GET /threads/{id}`: sideband envelope, then bare document.
pub const FETCH_DOCUMENT: Cascade<Document> = Cascade {
    operation: "fetch document",
    candidates: &[
        Candidate {
            name: "sideband envelope",
            decode: sideband_envelope,
            accept: has_id,
        },
        Candidate {
            name: "bare document",
            decode: bare_document,
            accept: has_id,
        },
    ],
};

/// `POST /threads/new-document`: sideband envelope only.
pub const CREATE_DOCUMENT: Cascade<Document> = Cascade {
    operation: "create document",
    candidates: &[Candidate {
        name: "sideband envelope",
        decode: sideband_envelope,
        accept: has_id,
    }],
};

/// `POST /threads/edit-document`: sideband envelope, then bare document.
pub const EDIT_DOCUMENT: Cascade<Document> = Cascade {
    operation: "edit document",
    candidates: &[
        Candidate {
            name: "sideband envelope",
            decode: sideband_envelope,
            accept: has_id,
        },
        Candidate {
            name: "bare document",
            decode: bare_document,
            accept: has_id,
        },
    ],
};

/// `GET /threads/recent`: keyed map, bare list, then wrapper list.
pub const RECENT_DOCUMENTS: Cascade<Vec<Document>> = Cascade {
    operation: "list recent documents",
    candidates: &[
        Candidate {
            name: "keyed envelope map",
            decode: envelope_map,
            accept: non_empty_with_ids,
        },
        Candidate {
            name: "bare document list",
            decode: bare_document_list,
            accept: all_have_ids,
        },
        Candidate {
            name: "wrapper list",
            decode: wrapper_list,
            accept: all_have_ids,
        },
    ],
};

/// `GET /threads/search`: wrapper list only.
pub const SEARCH_DOCUMENTS: Cascade<Vec<Document>> = Cascade {
    operation: "search documents",
    candidates: &[Candidate {
        name: "wrapper list",
        decode: wrapper_list,
        accept: all_have_ids,
    }],
};

/// `GET /threads/{id}/messages`: fixed shape.
pub const FETCH_COMMENTS: Cascade<Vec<Comment>> = Cascade {
    operation: "fetch comments",
    candidates: &[Candidate {
        name: "comment list",
        decode: comment_list,
        accept: all_have_ids,
    }],
};

/// `GET /users/{id}`: fixed shape.
pub const FETCH_USER: Cascade<User> = Cascade {
    operation: "fetch user",
    candidates: &[Candidate {
        name: "bare user",
        decode: bare_user,
        accept: has_id,
    }],
};
