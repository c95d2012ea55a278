//! Flow configuration: the knobs on which the two reference workflows differ

use draftloop_error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a rejecting review does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionPolicy {
    /// The review text becomes the run's failure; the run stops
    Fail,
    /// The review text becomes `review_notes` and the loop continues
    Iterate,
}

/// Where the next round's feedback comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
    /// Ask the model to turn review notes into actionable guidance
    Model,
    /// Use the review notes as-is, no extra call
    ReviewNotes,
}

/// Where control goes right after Review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewRoute {
    /// Always through the feedback handler, which routes afterwards
    ViaFeedback,
    /// Route immediately: approval goes straight to Refine
    Direct,
}

/// Named flow presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPreset {
    Strict,
    Iterative,
}

impl FlowPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowPreset::Strict => "strict",
            FlowPreset::Iterative => "iterative",
        }
    }

    pub fn config(self) -> FlowConfig {
        match self {
            FlowPreset::Strict => FlowConfig::strict(),
            FlowPreset::Iterative => FlowConfig::iterative(),
        }
    }
}

impl fmt::Display for FlowPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(FlowPreset::Strict),
            "iterative" => Ok(FlowPreset::Iterative),
            other => Err(Error::invalid_argument(format!(
                "unknown flow preset '{}', expected 'strict' or 'iterative'",
                other
            ))),
        }
    }
}

/// How the shared state machine behaves.
///
/// All combinations are valid. The presets reproduce the two reference
/// workflows exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub on_rejection: RejectionPolicy,
    pub feedback: FeedbackSource,
    pub route: ReviewRoute,
}

impl FlowConfig {
    /// A rejecting review ends the run with the review text as failure;
    /// review always passes through the feedback handler.
    pub fn strict() -> Self {
        Self {
            on_rejection: RejectionPolicy::Fail,
            feedback: FeedbackSource::Model,
            route: ReviewRoute::ViaFeedback,
        }
    }

    /// A rejecting review feeds its notes into the next generation;
    /// approval goes straight to refinement.
    pub fn iterative() -> Self {
        Self {
            on_rejection: RejectionPolicy::Iterate,
            feedback: FeedbackSource::ReviewNotes,
            route: ReviewRoute::Direct,
        }
    }

    pub fn with_rejection(mut self, policy: RejectionPolicy) -> Self {
        self.on_rejection = policy;
        self
    }

    pub fn with_feedback(mut self, source: FeedbackSource) -> Self {
        self.feedback = source;
        self
    }

    pub fn with_route(mut self, route: ReviewRoute) -> Self {
        self.route = route;
        self
    }

    /// The preset this configuration matches, if any
    pub fn preset(&self) -> Option<FlowPreset> {
        [FlowPreset::Strict, FlowPreset::Iterative]
            .into_iter()
            .find(|p| p.config() == *self)
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::iterative()
    }
}
