//! # draftloop-llm
//!
//! The completion service used by the draftloop workflows: send a prompt to a
//! model, get text back (or an error).
//!
//! - `LlmProvider` is the trait every backend implements; it is object safe,
//!   so callers hold an `Arc<dyn LlmProvider>` and tests swap in scripted fakes.
//! - `OpenAIProvider` talks to OpenAI and any OpenAI-compatible endpoint.
//! - `UsageTracker` aggregates token counts across the calls of one run.

pub mod provider;

pub use draftloop_error::{Error, ErrorKind, ErrorStatus, Result};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role, Usage, UsageTracker,
    DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, OPENAI_BASE_URL,
};
