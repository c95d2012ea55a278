//! The session record: the single mutable state of one workflow run

use crate::flow::RejectionPolicy;
use serde::{Deserialize, Serialize};

/// Hard cap on successful generations per run
pub const MAX_ITERATIONS: u32 = 3;

/// Bound to `{feedback}` when there is none yet
pub const NO_FEEDBACK: &str = "No feedback.";

/// Feedback written when the cap ends the run
pub const MAX_ITERATIONS_MESSAGE: &str = "Max iterations reached.";

/// A review counts as approval when it contains this, anywhere, case-sensitive
pub const APPROVAL_TOKEN: &str = "Approved";

/// Approval test applied to review responses.
///
/// Plain substring containment: "Not Approved material" counts as approval.
pub fn is_approval(review: &str) -> bool {
    review.contains(APPROVAL_TOKEN)
}

/// What the user asked for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    pub input_spec: String,
    #[serde(default)]
    pub parameters: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl RunInput {
    pub fn new(input_spec: impl Into<String>) -> Self {
        Self {
            input_spec: input_spec.into(),
            ..Default::default()
        }
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    /// Blank optional fields become `None`; a form's empty textarea is not feedback.
    pub fn normalized(self) -> Self {
        Self {
            input_spec: self.input_spec,
            parameters: non_blank(self.parameters),
            feedback: non_blank(self.feedback),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.input_spec.trim().is_empty()
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// How a finished run ended. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Review approved and refinement succeeded
    Approved,
    /// The iteration cap ended the loop
    CapReached,
    /// A step failed, or a strict-mode review rejected
    Failed,
}

/// State of one run, threaded through every step.
///
/// Fields are read-only from outside the crate; only the step functions
/// mutate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    input_spec: String,
    parameters: Option<String>,
    artifact: Option<String>,
    feedback: Option<String>,
    review_notes: Option<String>,
    iteration_count: u32,
    is_approved: bool,
    failure: Option<String>,
}

impl SessionRecord {
    pub fn new(input: RunInput) -> Self {
        let input = input.normalized();
        Self {
            input_spec: input.input_spec,
            parameters: input.parameters,
            artifact: None,
            feedback: input.feedback,
            review_notes: None,
            iteration_count: 0,
            is_approved: false,
            failure: None,
        }
    }

    pub fn input_spec(&self) -> &str {
        &self.input_spec
    }

    pub fn parameters(&self) -> Option<&str> {
        self.parameters.as_deref()
    }

    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn review_notes(&self) -> Option<&str> {
        self.review_notes.as_deref()
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn is_approved(&self) -> bool {
        self.is_approved
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn cap_reached(&self) -> bool {
        self.iteration_count >= MAX_ITERATIONS
    }

    /// Terminal classification; meaningful once the controller has finished.
    pub fn outcome(&self) -> Outcome {
        if self.failure.is_some() {
            Outcome::Failed
        } else if self.is_approved {
            Outcome::Approved
        } else {
            Outcome::CapReached
        }
    }

    // =========================================================================
    // Mutations (step functions only)
    // =========================================================================

    /// Record a failure. The first failure wins and approval is withdrawn.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some(message.into());
        }
        self.is_approved = false;
    }

    pub(crate) fn record_generation(&mut self, artifact: String) {
        debug_assert!(self.failure.is_none(), "generate ran on a failed record");
        self.artifact = Some(artifact);
        self.iteration_count += 1;
        self.is_approved = false;
        self.failure = None;
    }

    pub(crate) fn record_review(&mut self, response: String, policy: RejectionPolicy) {
        if is_approval(&response) {
            self.is_approved = true;
            self.review_notes = None;
            self.failure = None;
            return;
        }

        self.is_approved = false;
        match policy {
            RejectionPolicy::Iterate => self.review_notes = non_blank(Some(response)),
            RejectionPolicy::Fail => self.fail(response),
        }
    }

    pub(crate) fn record_refinement(&mut self, artifact: String) {
        self.artifact = Some(artifact);
    }

    /// Blank feedback clears it, so the "No feedback." fallbacks apply.
    pub(crate) fn set_feedback(&mut self, feedback: String) {
        self.feedback = non_blank(Some(feedback));
    }
}
