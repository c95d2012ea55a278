//! Routing: which step runs next, as a pure function of the record

use crate::flow::{FlowConfig, ReviewRoute};
use crate::profile::Step;
use crate::record::{SessionRecord, MAX_ITERATIONS};
use serde::Serialize;

/// Decision consumed by the controller loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    Generate,
    Review,
    Refine,
    HandleFeedback,
    Finish,
}

impl NextStep {
    pub fn step(self) -> Option<Step> {
        match self {
            NextStep::Generate => Some(Step::Generate),
            NextStep::Review => Some(Step::Review),
            NextStep::Refine => Some(Step::Refine),
            NextStep::HandleFeedback => Some(Step::HandleFeedback),
            NextStep::Finish => None,
        }
    }
}

/// The loop decision:
/// failure ends the run, approval goes to Refine, the cap ends the run,
/// anything else generates again.
pub fn decide(record: &SessionRecord) -> NextStep {
    if record.is_failed() {
        NextStep::Finish
    } else if record.is_approved() {
        NextStep::Refine
    } else if record.iteration_count() >= MAX_ITERATIONS {
        NextStep::Finish
    } else {
        NextStep::Generate
    }
}

/// The full edge set of the state machine
pub fn next_step(after: Step, record: &SessionRecord, flow: &FlowConfig) -> NextStep {
    match after {
        Step::Generate => NextStep::Review,
        Step::Review => match flow.route {
            ReviewRoute::ViaFeedback => NextStep::HandleFeedback,
            ReviewRoute::Direct => {
                if record.is_failed() {
                    NextStep::Finish
                } else if record.is_approved() {
                    NextStep::Refine
                } else {
                    // the feedback handler owns the cap message
                    NextStep::HandleFeedback
                }
            }
        },
        Step::HandleFeedback => decide(record),
        Step::Refine => NextStep::Finish,
    }
}
