//! `draftloop check`: one tiny completion to verify key, endpoint and model

use draftloop_error::Result;
use draftloop_llm::{ChatMessage, CompletionRequest, LlmProvider};
use std::fmt;
use std::time::Instant;
use tracing::debug;

#[derive(Debug)]
pub struct CheckReport {
    pub provider: String,
    pub model: String,
    pub elapsed_ms: u64,
    /// Whether the provider lists the configured model
    pub known_model: bool,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: model {} answered in {} ms",
            self.provider, self.model, self.elapsed_ms
        )?;
        if !self.known_model {
            write!(f, " (not one of the provider's listed models)")?;
        }
        Ok(())
    }
}

pub async fn run(provider: &dyn LlmProvider) -> Result<CheckReport> {
    let request = CompletionRequest::new(vec![
        ChatMessage::system("Reply with the single word OK."),
        ChatMessage::user("ping"),
    ])
    .with_temperature(0.0)
    .with_max_tokens(5);

    let started = Instant::now();
    let response = provider
        .complete(request)
        .await
        .map_err(|e| e.into_error("check").with_context("provider", provider.name().to_string()))?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    debug!(reply = ?response.content, "check reply");

    let model = if response.model.is_empty() {
        provider.default_model().to_string()
    } else {
        response.model
    };
    let known_model = provider.models().iter().any(|m| model.starts_with(m.as_str()));

    Ok(CheckReport {
        provider: provider.name().to_string(),
        model,
        elapsed_ms,
        known_model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use draftloop_error::ErrorKind;
    use draftloop_llm::{CompletionResponse, FinishReason, ProviderError, Role, Usage};
    use std::sync::Mutex;

    struct OneShot {
        reply: Mutex<Option<std::result::Result<String, ProviderError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl OneShot {
        fn new(reply: std::result::Result<&str, ProviderError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply.map(str::to_string))),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for OneShot {
        fn name(&self) -> &str {
            "oneshot"
        }

        fn models(&self) -> Vec<String> {
            vec!["gpt-4o".into()]
        }

        fn default_model(&self) -> &str {
            "gpt-4o"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            let content = self.reply.lock().unwrap().take().unwrap()?;
            Ok(CompletionResponse {
                id: "chk".into(),
                model: "gpt-4o-2024-08-06".into(),
                content: Some(content),
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_check_ok() {
        let provider = OneShot::new(Ok("OK"));
        let report = run(&provider).await.unwrap();

        assert_eq!(report.provider, "oneshot");
        assert_eq!(report.model, "gpt-4o-2024-08-06");
        assert!(report.known_model);

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].messages[0].role, Role::System);
        assert_eq!(seen[0].max_tokens, Some(5));
    }

    #[tokio::test]
    async fn test_check_reports_auth_failure() {
        let provider = OneShot::new(Err(ProviderError::AuthenticationFailed));
        let err = run(&provider).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(err.operation(), "check");
        assert!(err
            .context()
            .iter()
            .any(|(k, v)| *k == "provider" && v == "oneshot"));
    }

    #[tokio::test]
    async fn test_check_rate_limit_keeps_retry_after() {
        let provider = OneShot::new(Err(ProviderError::RateLimited { retry_after: Some(30) }));
        let err = run(&provider).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.is_retryable());
        assert!(err.context().iter().any(|(k, v)| *k == "retry_after" && v == "30"));
    }
}
