//! Controller - drives one run of the state machine to completion

use crate::flow::FlowConfig;
use crate::profile::{BotProfile, Step};
use crate::record::{Outcome, RunInput, SessionRecord};
use crate::router::{self, NextStep};
use crate::steps::{self, StepContext, StepOutcome};
use draftloop_error::{Error, Result};
use draftloop_llm::{LlmProvider, UsageTracker};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Shown in place of feedback when a run succeeds without any
pub const NO_FEEDBACK_NEEDED: &str = "No feedback needed.";

/// One executed step, for display and debugging
#[derive(Debug, Clone, Serialize)]
pub struct StepTrace {
    pub step: Step,
    /// Iteration count after the step ran
    pub iteration: u32,
    pub outcome: StepOutcome,
    pub elapsed_ms: u64,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub bot: &'static str,
    pub record: SessionRecord,
    pub trace: Vec<StepTrace>,
    pub usage: UsageTracker,
}

/// What the user is shown at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Presentation {
    Failure {
        error: String,
    },
    Success {
        artifact: String,
        feedback: String,
        iterations: u32,
    },
}

impl RunReport {
    pub fn outcome(&self) -> Outcome {
        self.record.outcome()
    }

    /// Failure wins; otherwise the last artifact with the feedback.
    pub fn presentation(&self) -> Presentation {
        let record = &self.record;
        match record.failure() {
            Some(error) => Presentation::Failure {
                error: error.to_string(),
            },
            None => Presentation::Success {
                artifact: record.artifact().unwrap_or_default().to_string(),
                feedback: record.feedback().unwrap_or(NO_FEEDBACK_NEEDED).to_string(),
                iterations: record.iteration_count(),
            },
        }
    }

    /// Number of model calls made during the run
    pub fn calls(&self) -> usize {
        self.trace
            .iter()
            .filter(|t| t.outcome == StepOutcome::Completed || t.outcome == StepOutcome::Failed)
            .count()
    }
}

/// Reject an empty request with the bot's own message, before any model call.
pub fn validate_input(profile: &BotProfile, input: &RunInput) -> Result<()> {
    if input.is_empty() {
        return Err(Error::invalid_argument(profile.form.empty_input)
            .with_operation("workflow::validate_input")
            .with_context("bot", profile.id));
    }
    Ok(())
}

/// Runs bots against one provider.
///
/// Cheap to clone; the web server shares one across requests.
#[derive(Clone)]
pub struct Controller {
    provider: Arc<dyn LlmProvider>,
    model: String,
    flow: FlowConfig,
}

impl Controller {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let model = provider.default_model().to_string();
        Self {
            provider,
            model,
            flow: FlowConfig::default(),
        }
    }

    pub fn with_flow(mut self, flow: FlowConfig) -> Self {
        self.flow = flow;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn flow(&self) -> &FlowConfig {
        &self.flow
    }

    /// Run the workflow from Generate until the router says Finish.
    ///
    /// Never fails: step errors end up in the record's `failure`.
    pub async fn run(&self, profile: &BotProfile, input: RunInput) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("workflow", bot = profile.id, run_id = %run_id);

        async move {
            let mut record = SessionRecord::new(input);
            let mut cx = StepContext::new(self.provider.as_ref(), &self.model, profile, self.flow);
            let mut trace = Vec::new();

            info!(model = %self.model, flow = ?self.flow, "starting run");

            let mut next = NextStep::Generate;
            while let Some(step) = next.step() {
                if step == Step::Generate && record.cap_reached() {
                    // the router already finishes at the cap
                    warn!(iterations = record.iteration_count(), "generate requested past the cap");
                    break;
                }

                let started = Instant::now();
                let outcome = steps::run_step(step, &mut cx, &mut record).await;
                trace.push(StepTrace {
                    step,
                    iteration: record.iteration_count(),
                    outcome,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });

                next = router::next_step(step, &record, &self.flow);
            }

            info!(
                outcome = ?record.outcome(),
                iterations = record.iteration_count(),
                steps = trace.len(),
                "run finished"
            );

            RunReport {
                run_id,
                bot: profile.id,
                record,
                trace,
                usage: cx.into_usage(),
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::RejectionPolicy;
    use crate::record::MAX_ITERATIONS_MESSAGE;

    fn report(record: SessionRecord) -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            bot: "code",
            record,
            trace: Vec::new(),
            usage: UsageTracker::new(),
        }
    }

    #[test]
    fn test_presentation_success_without_feedback() {
        let mut record = SessionRecord::new(RunInput::new("reverse a string"));
        record.record_generation("def f(s): return s[::-1]".into());
        record.record_review("Approved".into(), RejectionPolicy::Iterate);
        record.record_refinement("def reverse(s): return s[::-1]".into());

        assert_eq!(
            report(record).presentation(),
            Presentation::Success {
                artifact: "def reverse(s): return s[::-1]".into(),
                feedback: NO_FEEDBACK_NEEDED.into(),
                iterations: 1,
            }
        );
    }

    #[test]
    fn test_presentation_cap_shows_message() {
        let mut record = SessionRecord::new(RunInput::new("x"));
        record.record_generation("v1".into());
        record.set_feedback(MAX_ITERATIONS_MESSAGE.into());

        match report(record).presentation() {
            Presentation::Success { feedback, .. } => assert_eq!(feedback, MAX_ITERATIONS_MESSAGE),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_presentation_failure_hides_artifact() {
        let mut record = SessionRecord::new(RunInput::new("x"));
        record.record_generation("v1".into());
        record.fail("Code generation failed: timeout");

        let json = serde_json::to_value(report(record).presentation()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "failure", "error": "Code generation failed: timeout"})
        );
    }

    #[test]
    fn test_validate_input() {
        let story = BotProfile::story();
        let err = validate_input(&story, &RunInput::new("  \n")).unwrap_err();
        assert_eq!(err.message(), "Please enter story preferences.");
        assert!(validate_input(&story, &RunInput::new("a dragon")).is_ok());
    }
}
