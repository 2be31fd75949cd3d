#![allow(clippy::unwrap_used)]
// Integration tests for `RestBackend` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefront_api::{DocumentBackend, Error, RestBackend, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestBackend) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let backend = RestBackend::with_client(reqwest::Client::new(), base_url, "acme");
    (server, backend)
}

fn doc_path(key: &str) -> String {
    format!("/tenants/acme/documents/{key}")
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_existing_document() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path(doc_path("theme")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "colors": { "brand": "#fff" } }
        })))
        .mount(&server)
        .await;

    let doc = backend.fetch("theme").await.unwrap();
    assert_eq!(doc, Some(json!({ "colors": { "brand": "#fff" } })));
}

#[tokio::test]
async fn test_fetch_missing_document_is_none() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path(doc_path("heroes")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(backend.fetch("heroes").await.unwrap(), None);
}

#[tokio::test]
async fn test_fetch_null_data_is_none() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path(doc_path("layout")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .mount(&server)
        .await;

    assert_eq!(backend.fetch("layout").await.unwrap(), None);
}

#[tokio::test]
async fn test_fetch_server_error() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path(doc_path("theme")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = backend.fetch("theme").await;
    match result {
        Err(Error::Http { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_unauthorized() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path(doc_path("theme")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = backend.fetch("theme").await;
    assert!(
        matches!(result, Err(Error::Unauthorized)),
        "expected Unauthorized, got: {result:?}"
    );
}

#[tokio::test]
async fn test_fetch_malformed_body() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path(doc_path("theme")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = backend.fetch("theme").await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_persist_wraps_document_in_envelope() {
    let (server, backend) = setup().await;

    Mock::given(method("PUT"))
        .and(path(doc_path("theme")))
        .and(body_json(json!({ "data": { "colors": { "brand": "#000" } } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend
        .persist("theme", &json!({ "colors": { "brand": "#000" } }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_persist_rejected() {
    let (server, backend) = setup().await;

    Mock::given(method("PUT"))
        .and(path(doc_path("theme")))
        .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
        .mount(&server)
        .await;

    let result = backend.persist("theme", &json!({})).await;
    assert!(
        matches!(result, Err(Error::Http { status: 409, .. })),
        "expected Http 409, got: {result:?}"
    );
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_token_sent_as_bearer() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        token: Some(SecretString::from("tok-123".to_string())),
        ..TransportConfig::default()
    };
    let backend = RestBackend::new(Url::parse(&server.uri()).unwrap(), "acme", &transport).unwrap();

    Mock::given(method("GET"))
        .and(path(doc_path("theme")))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(backend.fetch("theme").await.unwrap(), Some(json!({})));
}

// ── Live feed ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_subscribe_reports_connect_failure() {
    // Nothing listens on the WebSocket path, so the upgrade fails and the
    // subscriber sees a recoverable error instead of a silent hang.
    let (_server, backend) = setup().await;
    let mut sub = backend.subscribe("theme");

    match sub.recv().await {
        Some(storefront_api::FeedEvent::Error(message)) => {
            assert!(message.contains("WebSocket"), "unexpected message: {message}");
        }
        other => panic!("expected feed error, got: {other:?}"),
    }
}
