//! Tests for the feed client

use super::*;
use crate::config::FeedSettings;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feed(server: &MockServer) -> FeedSettings {
    FeedSettings {
        endpoint: Url::parse(&format!("{}/api/v2/elections/", server.uri())).unwrap(),
        token: "secret-token".to_string(),
    }
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.default_headers.is_empty());
    assert!(config.user_agent.starts_with("election-guide-sync/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(5))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[tokio::test]
async fn test_fetch_sends_token_and_returns_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/elections/"))
        .and(header("Authorization", "Token secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"election_id": "abc", "election_name": {"en_US": "Test"}},
            {"election_id": 2, "unknown_key": [1, 2]}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = FeedClient::new().unwrap();
    let records = client.fetch(&feed(&server)).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].election_id(), Some("abc".to_string()));
    assert_eq!(records[1].get("unknown_key"), Some(&json!([1, 2])));
}

#[tokio::test]
async fn test_fetch_sends_default_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("X-Trace", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder().header("X-Trace", "1").build();
    let client = FeedClient::with_config(config).unwrap();

    let records = client.fetch(&feed(&server)).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_fetch_non_ok_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token."))
        .mount(&server)
        .await;

    let client = FeedClient::new().unwrap();
    let err = client.fetch(&feed(&server)).await.unwrap_err();

    match &err {
        Error::HttpStatus { status, body } => {
            assert_eq!(*status, 401);
            assert_eq!(body, "Invalid token.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Unable to fetch data from the API. Status code: 401"
    );
}

#[tokio::test]
async fn test_fetch_other_success_codes_are_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = FeedClient::new().unwrap();
    let err = client.fetch(&feed(&server)).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 204, .. }));
}

#[tokio::test]
async fn test_fetch_object_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let client = FeedClient::new().unwrap();
    let err = client.fetch(&feed(&server)).await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
    assert!(err.to_string().contains("expected a JSON array, got object"));
}

#[tokio::test]
async fn test_fetch_unreachable_host() {
    let feed = FeedSettings {
        endpoint: Url::parse("http://127.0.0.1:1/api/").unwrap(),
        token: "t".to_string(),
    };
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(2))
        .build();
    let client = FeedClient::with_config(config).unwrap();

    let err = client.fetch(&feed).await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}

#[test]
fn test_parse_feed_rejects_scalars_and_invalid_json() {
    assert!(matches!(parse_feed("42"), Err(Error::Decode { .. })));
    assert!(matches!(parse_feed("not json"), Err(Error::Decode { .. })));
    assert!(matches!(parse_feed("[1, 2]"), Err(Error::Decode { .. })));
}

#[test]
fn test_parse_feed_keeps_elements_verbatim() {
    let body = r#"[{"election_id": 1, "nested": {"a": null}}]"#;
    let records = parse_feed(body).unwrap();

    assert_eq!(
        records[0].clone().into_value(),
        json!({"election_id": 1, "nested": {"a": null}})
    );
}
