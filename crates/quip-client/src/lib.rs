//! # Quip Client
//!
//! HTTP client for the Quip API that always hands back canonical records.
//!
//! ## Overview
//!
//! The Quip API returns structurally different JSON for the same entity
//! depending on the endpoint: a document may arrive bare, wrapped as
//! `{"thread": ...}`, wrapped with its HTML as a sibling field, keyed in a map,
//! or as a list of wrappers. This crate is split along that problem:
//!
//! - **Transport** ([`transport`]): one authenticated round trip per call,
//!   returning raw bytes or a classified error.
//! - **Normalizer** ([`normalize`]): per-operation cascades of candidate
//!   decoders that turn raw bytes into a [`Document`], [`User`] or
//!   [`Comment`].
//! - **Operations** ([`client`]): [`QuipClient`] composes the two.
//!
//! The transport and normalizer do not depend on each other.
//!
//! ## Errors
//!
//! Every operation returns [`QuipError`], which keeps transport, API, decode
//! and validation failures distinguishable. Nothing is retried.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quip_client::{ClientConfig, EditOperation, ContentFormat, QuipClient};
//!
//! async fn example() -> Result<(), quip_client::QuipError> {
//!     let client = QuipClient::new(ClientConfig::new("my-token"))?;
//!
//!     let results = client.search_documents("roadmap", 5).await?;
//!     for doc in &results.documents {
//!         println!("{} ({})", doc.title, doc.id);
//!     }
//!
//!     // REPLACE appends: the API has no replace-in-place.
//!     client
//!         .edit_document("AbCdEf", "<p>More</p>", EditOperation::Replace, ContentFormat::Html)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod transport;

pub use client::{ContentFormat, EditOperation, QuipClient, DELETE_CONFIRMATION};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, USER_AGENT};
pub use error::{QuipError, QuipResult};
pub use models::{
    Comment, Document, DocumentType, MicrosTimestamp, SearchResult, SecondsTimestamp, User,
};
pub use normalize::{Candidate, Cascade};
pub use transport::Transport;
