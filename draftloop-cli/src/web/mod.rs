//! Web front end: one form per bot plus a small JSON API.
//!
//! Routes:
//! - `GET /` index
//! - `GET|POST /bots/{id}` form and form submission
//! - `POST /api/v1/runs` JSON runs
//! - `GET /health`

mod error;
mod handlers;
mod html;

use axum::routing::{get, post};
use axum::Router;
use draftloop_error::{Error, ErrorKind, Result};
use draftloop_workflow::Controller;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub controller: Controller,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/bots/{id}",
            get(handlers::show_form).post(handlers::submit_form),
        )
        .route("/api/v1/runs", post(handlers::create_run))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await.map_err(|e| {
        Error::from(e)
            .with_operation("web::serve")
            .with_context("bind", bind.to_string())
    })?;

    info!(%bind, "listening");
    eprintln!("draftloop serving on http://{}", bind);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| {
            Error::new(ErrorKind::IoFailed, "server stopped unexpectedly")
                .with_operation("web::serve")
                .set_source(e)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use draftloop_llm::{
        CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ProviderError, Usage,
    };
    use http_body_util::BodyExt;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Replies from a queue and counts calls
    struct QueueProvider {
        replies: Mutex<VecDeque<String>>,
        calls: Mutex<usize>,
    }

    impl QueueProvider {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for QueueProvider {
        fn name(&self) -> &str {
            "queue"
        }

        fn models(&self) -> Vec<String> {
            vec!["queue".into()]
        }

        fn default_model(&self) -> &str {
            "queue"
        }

        async fn complete(&self, _request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::Other("no reply queued".into()))?;
            Ok(CompletionResponse {
                id: "test".into(),
                model: "queue".into(),
                content: Some(content),
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            })
        }
    }

    fn app(provider: &Arc<QueueProvider>) -> Router {
        build_router(AppState {
            controller: Controller::new(provider.clone()),
        })
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_post(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/runs")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(&QueueProvider::new(&[]))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_index_links_bots() {
        let response = app(&QueueProvider::new(&[]))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_string(response).await;
        assert!(body.contains("href=\"/bots/code\""));
        assert!(body.contains("href=\"/bots/story\""));
    }

    #[tokio::test]
    async fn test_unknown_bot_is_404() {
        let response = app(&QueueProvider::new(&[]))
            .oneshot(Request::get("/bots/poem").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_form_does_not_run() {
        let provider = QueueProvider::new(&[]);
        let response = app(&provider)
            .oneshot(form_post("/bots/code", "input=+++&feedback="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Please enter a code request."));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_form_run_escapes_artifact() {
        let provider = QueueProvider::new(&["<b>draft</b>", "Approved", "<script>x()</script>"]);
        let response = app(&provider)
            .oneshot(form_post("/bots/code", "input=reverse+a+string&param=Rust"))
            .await
            .unwrap();

        let body = body_string(response).await;
        assert!(body.contains("<pre><code>&lt;script&gt;x()&lt;/script&gt;</code></pre>"));
        assert!(body.contains("No feedback needed."));
        assert!(!body.contains("<script>x()"));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_api_run() {
        let provider = QueueProvider::new(&["Once upon a time", "Approved", "Once, long ago"]);
        let response = app(&provider)
            .oneshot(json_post(serde_json::json!({"bot": "story", "input": "Genre: Fantasy"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["bot"], "story");
        assert_eq!(json["result"]["status"], "success");
        assert_eq!(json["result"]["artifact"], "Once, long ago");
        assert_eq!(json["iterations"], 1);
        assert_eq!(json["outcome"], "approved");
        assert_eq!(json["trace"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_api_validation() {
        let provider = QueueProvider::new(&[]);

        let response = app(&provider)
            .oneshot(json_post(serde_json::json!({"bot": "code", "input": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["message"], "Please enter a code request.");

        let response = app(&provider)
            .oneshot(json_post(serde_json::json!({"bot": "poem", "input": "x"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_api_malformed_body_is_json_error() {
        let provider = QueueProvider::new(&[]);
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/runs")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app(&provider).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert!(!json["error"]["message"].as_str().unwrap().is_empty());

        // a missing field is rejected the same way
        let response = app(&provider)
            .oneshot(json_post(serde_json::json!({"bot": "code"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(provider.calls(), 0);
    }
}
