//! Integration tests for the Quip client against a mock API.
//!
//! Each test starts a wiremock server, points a client at it through
//! `ClientConfig::with_base_url`, and checks both the request that went out
//! (path, headers, form fields) and the canonical record that came back.

use quip_client::{
    ClientConfig, ContentFormat, DocumentType, EditOperation, QuipClient, QuipError, USER_AGENT,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test fixture pairing a mock server with a client pointed at it.
struct TestFixture {
    server: MockServer,
    client: QuipClient,
}

impl TestFixture {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let config = ClientConfig::new("test-token")
            .with_base_url(server.uri())
            .with_timeout_secs(5);
        let client = QuipClient::new(config).expect("client should build");

        Self { server, client }
    }
}

fn thread(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": "document",
        "title": title,
        "created_usec": 1640995200000000i64,
        "updated_usec": 1640995200000000i64,
        "author_id": "user123",
        "link": format!("https://quip.com/{}", id),
        "access_level": "OWN",
        "is_template": false,
        "thread_id": id
    })
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_current_user() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/users/current"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("User-Agent", USER_AGENT))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user123",
            "name": "Test User",
            "email": "test@example.com",
            "url": "https://quip.com/user123",
            "created": 1640995200,
            "updated": 1640995300
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let user = fixture.client.current_user().await.unwrap();

    assert_eq!(user.id, "user123");
    assert_eq!(user.name, "Test User");
    assert_eq!(user.email, "test@example.com");
    // Seconds, not microseconds.
    assert_eq!(user.created_at.as_secs(), Some(1640995200));
    assert!(user.profile_picture_url.is_none());
}

#[tokio::test]
async fn test_unauthorized_is_api_error_with_verbatim_body() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/users/current"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"Invalid token"}"#))
        .mount(&fixture.server)
        .await;

    let err = fixture.client.current_user().await.unwrap_err();

    match &err {
        QuipError::Api { status, body } => {
            assert_eq!(*status, 401);
            assert_eq!(body, r#"{"error":"Invalid token"}"#);
        }
        other => panic!("expected API error, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("401"));
    assert!(message.contains(r#"{"error":"Invalid token"}"#));
}

#[tokio::test]
async fn test_user_by_id() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/users/user123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user123",
            "name": "John Doe",
            "email": "john@example.com",
            "profile_picture_url": "https://quip.com/pic.png"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let user = fixture.client.user("user123").await.unwrap();
    assert_eq!(user.name, "John Doe");
    assert_eq!(user.profile_picture_url.as_deref(), Some("https://quip.com/pic.png"));
}

#[tokio::test]
async fn test_empty_user_is_decode_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&fixture.server)
        .await;

    let err = fixture.client.user("ghost").await.unwrap_err();
    assert!(matches!(err, QuipError::Decode { .. }));
}

// =============================================================================
// Documents
// =============================================================================

#[tokio::test]
async fn test_search_documents() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/threads/search"))
        .and(query_param("query", "test query"))
        .and(query_param("count", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "thread": thread("doc1", "First") },
            { "thread": thread("doc2", "Second") },
            { "thread": thread("doc3", "Third") }
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let result = fixture
        .client
        .search_documents("test query", 5)
        .await
        .unwrap();

    let titles: Vec<&str> = result.documents.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, ["First", "Second", "Third"]);
    assert!(result.users.is_empty());
}

#[tokio::test]
async fn test_search_without_limit_omits_count() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/threads/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let result = fixture.client.search_documents("a&b", 0).await.unwrap();
    assert!(result.documents.is_empty());

    let requests = fixture.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), Some("query=a%26b"));
}

#[tokio::test]
async fn test_get_document_with_sideband_html() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/threads/doc123"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": thread("doc123", "Test Document"),
            "html": "<p>Test content</p>",
            "user_ids": ["user123"],
            "shared_folder_ids": ["folder1"]
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let doc = fixture.client.document("doc123").await.unwrap();

    assert_eq!(doc.id, "doc123");
    assert_eq!(doc.title, "Test Document");
    assert_eq!(doc.html, "<p>Test content</p>");
    assert_eq!(doc.doc_type, DocumentType::Document);
}

#[tokio::test]
async fn test_get_bare_document() {
    let fixture = TestFixture::new().await;

    let mut body = thread("doc123", "Bare Document");
    body["html"] = json!("<p>Inline</p>");

    Mock::given(method("GET"))
        .and(path("/threads/doc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&fixture.server)
        .await;

    let doc = fixture.client.document("doc123").await.unwrap();
    assert_eq!(doc.title, "Bare Document");
    assert_eq!(doc.html, "<p>Inline</p>");
}

#[tokio::test]
async fn test_document_id_stays_in_one_path_segment() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/users/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user123",
            "name": "Test User"
        })))
        .expect(0)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/threads/..%2Fusers%2Fcurrent"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such thread"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let err = fixture.client.document("../users/current").await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    Mock::given(method("GET"))
        .and(path("/threads/a%20b%3Fc/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let comments = fixture.client.document_comments("a b?c").await.unwrap();
    assert!(comments.is_empty());

    assert!(fixture.client.user("..").await.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_get_document_unrecognized_shape() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/threads/doc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": { "id": "", "title": "" },
            "html": ""
        })))
        .mount(&fixture.server)
        .await;

    match fixture.client.document("doc123").await.unwrap_err() {
        QuipError::Decode {
            operation,
            reason,
            excerpt,
        } => {
            assert_eq!(operation, "fetch document");
            assert_eq!(reason, "unrecognized response format");
            assert!(excerpt.contains("thread"));
        }
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_document_sends_form() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/threads/new-document"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_string_contains("title=New+Document"))
        .and(body_string_contains("content=%3Cp%3ENew+content%3C%2Fp%3E"))
        .and(body_string_contains("format=html"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": thread("newdoc123", "New Document"),
            "html": "<p>New content</p>"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let doc = fixture
        .client
        .create_document("New Document", "<p>New content</p>", ContentFormat::Html)
        .await
        .unwrap();

    assert_eq!(doc.id, "newdoc123");
    assert_eq!(doc.title, "New Document");
    assert_eq!(doc.created_at.as_secs(), Some(1640995200));
}

#[tokio::test]
async fn test_create_document_markdown_format() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/threads/new-document"))
        .and(body_string_contains("format=markdown"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": thread("md1", "Notes")
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let doc = fixture
        .client
        .create_document("Notes", "# Heading", ContentFormat::Markdown)
        .await
        .unwrap();
    assert_eq!(doc.id, "md1");
}

#[tokio::test]
async fn test_create_document_bare_response_is_terminal() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/threads/new-document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread("newdoc123", "New")))
        .mount(&fixture.server)
        .await;

    let err = fixture
        .client
        .create_document("New", "", ContentFormat::Html)
        .await
        .unwrap_err();
    assert!(matches!(err, QuipError::Decode { .. }));
}

#[tokio::test]
async fn test_edit_replace_and_append_share_location() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/threads/edit-document"))
        .and(body_string_contains("thread_id=doc123"))
        .and(body_string_contains("location=0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": thread("doc123", "Edited"),
            "html": "<p>Old</p><p>New</p>"
        })))
        .expect(2)
        .mount(&fixture.server)
        .await;

    for operation in [EditOperation::Replace, EditOperation::Append] {
        let doc = fixture
            .client
            .edit_document("doc123", "<p>New</p>", operation, ContentFormat::Html)
            .await
            .unwrap();
        assert_eq!(doc.id, "doc123");
    }
}

#[tokio::test]
async fn test_edit_prepend_location() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/threads/edit-document"))
        .and(body_string_contains("location=1"))
        .and(body_string_contains("format=markdown"))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread("doc123", "Edited")))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let doc = fixture
        .client
        .edit_document(
            "doc123",
            "intro",
            EditOperation::from_name("PREPEND"),
            ContentFormat::Markdown,
        )
        .await
        .unwrap();
    assert_eq!(doc.title, "Edited");
}

#[tokio::test]
async fn test_delete_fetches_then_deletes() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/threads/doc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": thread("doc123", "Doomed"),
            "html": "<p>bye</p>"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads/delete"))
        .and(body_string_contains("thread_id=doc123"))
        .and(body_string_contains("wipeout=false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let doc = fixture
        .client
        .delete_document("doc123", "DELETE")
        .await
        .unwrap();
    assert_eq!(doc.title, "Doomed");
}

#[tokio::test]
async fn test_delete_without_confirmation_makes_no_request() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread("doc123", "Safe")))
        .expect(0)
        .mount(&fixture.server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let err = fixture
        .client
        .delete_document("doc123", "delete")
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_delete_skipped_when_fetch_fails() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/threads/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads/delete"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let err = fixture
        .client
        .delete_document("missing", "DELETE")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_recent_documents_keyed_map() {
    let fixture = TestFixture::new().await;

    let mut older = thread("old1", "Older");
    older["updated_usec"] = json!(1640995200000000i64);
    let mut newer = thread("new1", "Newer");
    newer["updated_usec"] = json!(1640995300000000i64);

    Mock::given(method("GET"))
        .and(path("/threads/recent"))
        .and(query_param("count", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key-a": { "thread": older, "html": "" },
            "key-b": { "thread": newer, "html": "<p>hi</p>" }
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let docs = fixture.client.recent_documents(10).await.unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "new1");
    assert_eq!(docs[0].html, "<p>hi</p>");
    assert_eq!(docs[1].id, "old1");
}

#[tokio::test]
async fn test_recent_documents_wrapper_list() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/threads/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "thread": thread("a", "A") },
            { "thread": thread("b", "B") }
        ])))
        .mount(&fixture.server)
        .await;

    let docs = fixture.client.recent_documents(2).await.unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
}

// =============================================================================
// Comments
// =============================================================================

#[tokio::test]
async fn test_document_comments() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/threads/doc123/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "comment123",
                "text": "Great document!",
                "author_id": "user123",
                "created_usec": 1640995200000000i64,
                "visible": true
            }
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let comments = fixture.client.document_comments("doc123").await.unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, "comment123");
    assert_eq!(comments[0].text, "Great document!");
    assert_eq!(comments[0].created_at.as_secs(), Some(1640995200));
    assert!(comments[0].visible);
}

// =============================================================================
// Transport failures
// =============================================================================

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    // Nothing listens on port 1.
    let config = ClientConfig::new("test-token")
        .with_base_url("http://127.0.0.1:1")
        .with_timeout_secs(2);
    let client = QuipClient::new(config).unwrap();

    let err = client.current_user().await.unwrap_err();
    assert!(err.is_transport(), "expected transport error, got {err:?}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/threads/recent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let err = fixture.client.recent_documents(5).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("try later"));
}
