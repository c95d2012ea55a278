//! Step functions. Each issues at most one completion call and then
//! updates the record.

use crate::flow::{FeedbackSource, FlowConfig};
use crate::profile::{BotProfile, Step, StepPrompt};
use crate::record::{SessionRecord, MAX_ITERATIONS, MAX_ITERATIONS_MESSAGE, NO_FEEDBACK};
use draftloop_llm::{CompletionRequest, LlmProvider, UsageTracker};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

/// What a step did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Called the model and updated the record
    Completed,
    /// Updated the record without a model call (cap message, copied notes)
    Local,
    /// Preconditions not met; record untouched
    Skipped,
    /// The model call failed; `failure` is now set
    Failed,
}

/// Everything a step needs besides the record
pub struct StepContext<'a> {
    provider: &'a dyn LlmProvider,
    model: &'a str,
    profile: &'a BotProfile,
    flow: FlowConfig,
    usage: UsageTracker,
}

impl<'a> StepContext<'a> {
    pub fn new(
        provider: &'a dyn LlmProvider,
        model: &'a str,
        profile: &'a BotProfile,
        flow: FlowConfig,
    ) -> Self {
        Self {
            provider,
            model,
            profile,
            flow,
            usage: UsageTracker::new(),
        }
    }

    pub fn into_usage(self) -> UsageTracker {
        self.usage
    }

    /// Render the step's prompt and send it. `Err` carries the tagged
    /// failure message.
    async fn call(&mut self, step: Step, vars: &[(&str, &str)]) -> Result<String, String> {
        let profile = self.profile;
        let prompt: &StepPrompt = profile.prompt(step);
        let text = prompt
            .template
            .render(vars)
            .map_err(|e| prompt.failure(e.message()))?;

        trace!(%step, prompt = %text, "rendered prompt");

        let request = CompletionRequest::prompt(text)
            .with_model(self.model)
            .with_max_tokens(prompt.max_tokens);

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| prompt.failure(e))?;

        let model = if response.model.is_empty() {
            self.model.to_string()
        } else {
            response.model.clone()
        };
        self.usage.track(&model, &response.usage);

        let content = response.text().map_err(|e| prompt.failure(e))?;
        let content = content.trim().to_string();
        debug!(%step, chars = content.len(), "model responded");
        Ok(content)
    }

    fn parameter<'r>(&self, record: &'r SessionRecord) -> Option<(&'static str, &'r str)> {
        self.profile.parameter_value(record.parameters())
    }
}

fn fail(record: &mut SessionRecord, step: Step, message: String) -> StepOutcome {
    warn!(%step, failure = %message, "step failed");
    record.fail(message);
    StepOutcome::Failed
}

/// Generate: fill the generation prompt with the request, the parameter and
/// the current feedback (or "No feedback."), store the trimmed result.
pub async fn generate(cx: &mut StepContext<'_>, record: &mut SessionRecord) -> StepOutcome {
    let result = {
        let mut vars = vec![
            (cx.profile.input_var, record.input_spec()),
            ("feedback", record.feedback().unwrap_or(NO_FEEDBACK)),
        ];
        vars.extend(cx.parameter(record));
        cx.call(Step::Generate, &vars).await
    };

    match result {
        Ok(artifact) => {
            record.record_generation(artifact);
            info!(iteration = record.iteration_count(), "generated draft");
            StepOutcome::Completed
        }
        Err(message) => fail(record, Step::Generate, message),
    }
}

/// Review: ask for "Approved" or a list of issues. Skipped once failed.
pub async fn review(cx: &mut StepContext<'_>, record: &mut SessionRecord) -> StepOutcome {
    if record.is_failed() {
        return StepOutcome::Skipped;
    }

    let result = {
        let mut vars = vec![(cx.profile.artifact_var, record.artifact().unwrap_or_default())];
        vars.extend(cx.parameter(record));
        cx.call(Step::Review, &vars).await
    };

    match result {
        Ok(response) => {
            record.record_review(response, cx.flow.on_rejection);
            info!(approved = record.is_approved(), failed = record.is_failed(), "reviewed draft");
            StepOutcome::Completed
        }
        Err(message) => fail(record, Step::Review, message),
    }
}

/// Refine: only for an approved, unfailed record; overwrites the artifact.
pub async fn refine(cx: &mut StepContext<'_>, record: &mut SessionRecord) -> StepOutcome {
    if !record.is_approved() || record.is_failed() {
        return StepOutcome::Skipped;
    }

    let result = {
        let mut vars = vec![(cx.profile.artifact_var, record.artifact().unwrap_or_default())];
        vars.extend(cx.parameter(record));
        cx.call(Step::Refine, &vars).await
    };

    match result {
        Ok(refined) => {
            record.record_refinement(refined);
            info!("refined draft");
            StepOutcome::Completed
        }
        Err(message) => fail(record, Step::Refine, message),
    }
}

/// Feedback handler: enforces the cap, otherwise turns the review notes
/// into feedback for the next generation.
pub async fn handle_feedback(cx: &mut StepContext<'_>, record: &mut SessionRecord) -> StepOutcome {
    if record.is_approved() || record.is_failed() {
        return StepOutcome::Skipped;
    }

    if record.iteration_count() >= MAX_ITERATIONS {
        info!(iterations = record.iteration_count(), "iteration cap reached");
        record.set_feedback(MAX_ITERATIONS_MESSAGE.to_string());
        return StepOutcome::Local;
    }

    let notes = record.review_notes().unwrap_or_default().to_string();
    match cx.flow.feedback {
        FeedbackSource::ReviewNotes => {
            record.set_feedback(notes);
            StepOutcome::Local
        }
        FeedbackSource::Model => match cx.call(Step::HandleFeedback, &[("notes", notes.as_str())]).await {
            Ok(feedback) => {
                record.set_feedback(feedback);
                StepOutcome::Completed
            }
            Err(message) => fail(record, Step::HandleFeedback, message),
        },
    }
}

/// Dispatch by step
pub async fn run_step(step: Step, cx: &mut StepContext<'_>, record: &mut SessionRecord) -> StepOutcome {
    match step {
        Step::Generate => generate(cx, record).await,
        Step::Review => review(cx, record).await,
        Step::Refine => refine(cx, record).await,
        Step::HandleFeedback => handle_feedback(cx, record).await,
    }
}
