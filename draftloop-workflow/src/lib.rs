//! # draftloop-workflow
//!
//! The generate -> review -> (feedback -> generate)* -> refine loop shared by
//! the draftloop bots.
//!
//! 1. Generate a draft from the user's request and any feedback
//! 2. Review it; a response containing "Approved" approves it
//! 3. On rejection, turn the review into feedback and generate again,
//!    at most three drafts per run
//! 4. On approval, refine the draft once and finish
//!
//! A `BotProfile` supplies prompts and copy, a `FlowConfig` picks how
//! rejections are handled, and the `Controller` runs the state machine
//! against any `LlmProvider`.

pub mod controller;
pub mod flow;
pub mod profile;
pub mod record;
pub mod router;
pub mod steps;
pub mod template;

pub use controller::{validate_input, Controller, Presentation, RunReport, StepTrace, NO_FEEDBACK_NEEDED};
pub use flow::{FeedbackSource, FlowConfig, FlowPreset, RejectionPolicy, ReviewRoute};
pub use profile::{BotProfile, FormCopy, ParameterSpec, Step, StepPrompt};
pub use record::{
    is_approval, Outcome, RunInput, SessionRecord, MAX_ITERATIONS, MAX_ITERATIONS_MESSAGE,
    NO_FEEDBACK,
};
pub use router::NextStep;
pub use steps::StepOutcome;
pub use template::PromptTemplate;
