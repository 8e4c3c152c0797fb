//! Tests for the HTTP client module

use super::client::{extract_error_detail, is_empty_document, parse_retry_after};
use super::*;
use crate::error::ErrorKind;
use crate::types::Method;
use serde_json::json;
use std::time::{Duration, Instant};
use test_case::test_case;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .api_key("secret_test")
        .rate_limit(RateLimiterConfig::new(100.0, 1.0))
        .build();
    HttpClient::with_config(config).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.base_url, "https://api.notion.com/v1");
    assert_eq!(config.api_version, "2022-06-28");
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.rate_limit, RateLimiterConfig::default());
    assert!(config.user_agent.starts_with("notion-pacer/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://notion.example.com/v1")
        .api_key("secret_abc")
        .api_version("2025-01-01")
        .timeout(Duration::from_secs(5))
        .rate_limit(RateLimiterConfig::new(2.0, 0.5))
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, "https://notion.example.com/v1");
    assert_eq!(config.api_key, "secret_abc");
    assert_eq!(config.api_version, "2025-01-01");
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.rate_limit, RateLimiterConfig::new(2.0, 0.5));
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_http_client_debug_redacts_key() {
    let config = HttpClientConfig::builder().api_key("secret_abc").build();
    let client = HttpClient::with_config(config).unwrap();
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(debug_str.contains("<redacted>"));
    assert!(!debug_str.contains("secret_abc"));
}

#[test]
fn test_http_client_rejects_invalid_rate_budget() {
    let config = HttpClientConfig::builder()
        .rate_limit(RateLimiterConfig::new(0.0, 0.8))
        .build();
    let err = HttpClient::with_config(config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_http_client_rejects_unprintable_key() {
    let config = HttpClientConfig::builder().api_key("bad\nkey").build();
    let err = HttpClient::with_config(config).unwrap_err();
    assert!(err.to_string().contains("api_key"));
}

#[tokio::test]
async fn test_execute_sends_auth_and_version_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/abc"))
        .and(header("Authorization", "Bearer secret_test"))
        .and(header("Notion-Version", "2022-06-28"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "page",
            "id": "abc"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let page = client.get("/pages/abc").await.unwrap();

    assert_eq!(page["object"], "page");
    assert_eq!(page["id"], "abc");
}

#[tokio::test]
async fn test_execute_post_sends_json_body() {
    let mock_server = MockServer::start().await;
    let body = json!({"parent": {"page_id": "p"}, "properties": {}});

    Mock::given(method("POST"))
        .and(path("/pages"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "new"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let created = client.post("/pages", &body).await.unwrap();

    assert_eq!(created["id"], "new");
}

#[tokio::test]
async fn test_execute_retries_once_after_429_honoring_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "1")
                .set_body_json(json!({"message": "Rate limited"})),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pages/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "limited"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let start = Instant::now();
    let page = client.execute(Method::GET, "/pages/limited", None).await.unwrap();

    assert_eq!(page["id"], "limited");
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_execute_second_429_is_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/busy"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_json(json!({"message": "Slow down"})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.get("/pages/busy").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamStatus);
    assert_eq!(err.status(), Some(429));
    assert_eq!(err.to_string(), "Notion API error (429): Slow down");
}

#[tokio::test]
async fn test_execute_404_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pages"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Parent not found"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.post("/pages", &json!({"x": 1})).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamStatus);
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("404"));
    assert!(err.to_string().contains("Parent not found"));
}

#[tokio::test]
async fn test_execute_500_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/flaky"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal failure"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.get("/pages/flaky").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "Notion API error (500): Internal failure");
}

#[tokio::test]
async fn test_execute_status_without_body_uses_generic_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.get("/pages/gone").await.unwrap_err();

    assert_eq!(err.to_string(), "Notion API error (410): Unknown error");
}

#[tokio::test]
async fn test_execute_timeout_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "slow"}))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .api_key("secret_test")
        .timeout(Duration::from_millis(200))
        .rate_limit(RateLimiterConfig::new(100.0, 1.0))
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let err = client.get("/pages/slow").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.to_string().contains("0.2s"));
}

#[tokio::test]
async fn test_execute_connection_refused_is_network_error() {
    let config = HttpClientConfig::builder()
        .base_url("http://127.0.0.1:1")
        .api_key("secret_test")
        .timeout(Duration::from_secs(5))
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let err = client.get("/pages/any").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err
        .to_string()
        .starts_with("Network error connecting to Notion API"));
}

#[test_case(ResponseTemplate::new(200); "no body")]
#[test_case(ResponseTemplate::new(200).set_body_string("   "); "whitespace")]
#[test_case(ResponseTemplate::new(200).set_body_string("null"); "null")]
#[test_case(ResponseTemplate::new(200).set_body_json(json!({})); "empty object")]
#[test_case(ResponseTemplate::new(200).set_body_string("<html>"); "not json")]
#[tokio::test]
async fn test_execute_empty_success_is_error(template: ResponseTemplate) {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/empty"))
        .respond_with(template)
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.get("/pages/empty").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyResponse);
}

#[tokio::test]
async fn test_execute_accepts_full_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "user"})))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url("https://unused.example.com")
        .api_key("secret_test")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let user = client
        .get(&format!("{}/v1/users/me", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(user["object"], "user");
}

#[tokio::test]
async fn test_clients_can_share_a_rate_limiter() {
    let limiter = std::sync::Arc::new(RateLimiter::new(&RateLimiterConfig::new(1.0, 1.0)).unwrap());
    let a = HttpClient::with_rate_limiter(HttpClientConfig::default(), limiter.clone()).unwrap();
    let b = HttpClient::with_rate_limiter(HttpClientConfig::default(), limiter).unwrap();

    assert!(std::sync::Arc::ptr_eq(a.rate_limiter(), b.rate_limiter()));
}

#[test_case("1", Some(Duration::from_secs(1)); "integer")]
#[test_case(" 2.5 ", Some(Duration::from_millis(2500)); "fractional")]
#[test_case("0", Some(Duration::ZERO); "zero")]
#[test_case("-3", None; "negative")]
#[test_case("Wed, 21 Oct 2015 07:28:00 GMT", None; "http date")]
#[test_case("", None; "blank")]
fn test_parse_retry_after(value: &str, expected: Option<Duration>) {
    assert_eq!(parse_retry_after(value), expected);
}

#[test_case(r#"{"object":"error","message":"Parent not found"}"#, "Parent not found"; "json message")]
#[test_case(r#"{"code":"validation_error"}"#, r#"{"code":"validation_error"}"#; "json without message")]
#[test_case("Bad gateway", "Bad gateway"; "plain text")]
#[test_case("", "Unknown error"; "empty")]
fn test_extract_error_detail(body: &str, expected: &str) {
    assert_eq!(extract_error_detail(body), expected);
}

#[test]
fn test_is_empty_document() {
    assert!(is_empty_document(&json!(null)));
    assert!(is_empty_document(&json!({})));
    assert!(is_empty_document(&json!([])));
    assert!(is_empty_document(&json!("")));
    assert!(!is_empty_document(&json!({"id": "x"})));
    assert!(!is_empty_document(&json!(0)));
}
