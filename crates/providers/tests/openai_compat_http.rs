//! HTTP-level tests for the OpenAI-compatible adapter against a mock server.

use rw_domain::config::LlmConfig;
use rw_domain::error::{Error, ErrorKind};
use rw_domain::message::Message;
use rw_domain::usage::UsageReport;
use rw_providers::{ChatRequest, LlmProvider, OpenAiCompatProvider};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> OpenAiCompatProvider {
    let cfg = LlmConfig {
        base_url: server.uri(),
        timeout_ms: 5_000,
        ..LlmConfig::default()
    };
    OpenAiCompatProvider::with_key(&cfg, "sk-test-key").unwrap()
}

fn request() -> ChatRequest {
    ChatRequest::new(vec![
        Message::system("You are a professional report writer."),
        Message::user("Instructions: write it"),
    ])
    .with_temperature(0.7)
    .with_max_tokens(4_000)
}

#[tokio::test]
async fn chat_success_with_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_partial_json(serde_json::json!({"model": "gpt-4o", "max_tokens": 4000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "gpt-4o",
            "choices": [{"message": {"role": "assistant", "content": "## Findings\nAll good."}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = provider_for(&server).chat(&request()).await.unwrap();
    assert_eq!(resp.content, "## Findings\nAll good.");
    assert_eq!(resp.usage.billable_tokens(|| 0), 150);
}

#[tokio::test]
async fn chat_without_usage_is_unreported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "text"}}]
        })))
        .mount(&server)
        .await;

    let resp = provider_for(&server).chat(&request()).await.unwrap();
    assert_eq!(resp.usage, UsageReport::Unreported);
}

#[tokio::test]
async fn rejected_request_carries_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"message": "This model's maximum context length is 128000 tokens"}
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server).chat(&request()).await.unwrap_err();
    match &err {
        Error::Provider { status, message, .. } => {
            assert_eq!(*status, Some(400));
            assert!(message.contains("maximum context length"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Rejected);
}

#[tokio::test]
async fn rate_limit_without_body_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = provider_for(&server).chat(&request()).await.unwrap_err();
    assert!(err.to_string().contains("API request failed with status 429"));
    assert_eq!(err.kind(), ErrorKind::Transient);
}

#[tokio::test]
async fn malformed_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = provider_for(&server).chat(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn test_connection_hits_models_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", "Bearer sk-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    provider_for(&server).test_connection().await.unwrap();
}

#[tokio::test]
async fn test_connection_reports_bad_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server).test_connection().await.unwrap_err();
    assert!(err.to_string().contains("Incorrect API key"));
}
