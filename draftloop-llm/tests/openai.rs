//! OpenAIProvider against a mock chat completions server

use draftloop_llm::{
    CompletionRequest, FinishReason, LlmProvider, OpenAIProvider, ProviderConfig, ProviderError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> OpenAIProvider {
    let config = ProviderConfig::openai("sk-test")
        .with_base_url(server.uri())
        .with_timeout(5);
    OpenAIProvider::new(config).expect("client builds")
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20 }
    })
}

#[tokio::test]
async fn sends_model_prompt_and_max_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "max_tokens": 500,
            "messages": [{ "role": "user", "content": "reverse a string" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("def f(s): return s[::-1]")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let response = provider
        .complete(
            CompletionRequest::prompt("reverse a string")
                .with_model("gpt-4o")
                .with_max_tokens(500),
        )
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("def f(s): return s[::-1]"));
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.usage.total_tokens, 20);
}

#[tokio::test]
async fn maps_unauthorized_to_authentication_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided" }
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server).prompt("hello").await.unwrap_err();
    assert_eq!(err, ProviderError::AuthenticationFailed);
}

#[tokio::test]
async fn maps_rate_limit_with_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let err = provider_for(&server).prompt("hello").await.unwrap_err();
    assert_eq!(err, ProviderError::RateLimited { retry_after: Some(7) });
}

#[tokio::test]
async fn surfaces_api_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "The server had an error" }
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server).prompt("hello").await.unwrap_err();
    assert_eq!(err.to_string(), "API error (500): The server had an error");
}

#[tokio::test]
async fn null_content_is_empty_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{
                "message": { "role": "assistant", "content": null },
                "finish_reason": "content_filter"
            }]
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server).prompt("hello").await.unwrap_err();
    assert_eq!(err, ProviderError::EmptyContent);
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let config = ProviderConfig::openai("sk-test")
        .with_base_url("http://127.0.0.1:9")
        .with_timeout(2);
    let provider = OpenAIProvider::new(config).unwrap();

    let err = provider.prompt("hello").await.unwrap_err();
    assert!(matches!(err, ProviderError::Network(_)), "got {err:?}");
}
