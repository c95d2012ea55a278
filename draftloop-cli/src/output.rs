//! Rendering a finished run for the terminal and for JSON clients

use draftloop_llm::UsageTracker;
use draftloop_workflow::{BotProfile, Outcome, Presentation, RunReport, StepTrace};
use serde::Serialize;
use std::fmt::Write;

/// JSON body for `run --json` and `POST /api/v1/runs`
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub run_id: String,
    pub bot: &'static str,
    pub result: Presentation,
    pub outcome: Outcome,
    pub iterations: u32,
    pub trace: Vec<StepTrace>,
    pub usage: UsageTracker,
}

impl From<&RunReport> for RunResponse {
    fn from(report: &RunReport) -> Self {
        Self {
            run_id: report.run_id.to_string(),
            bot: report.bot,
            result: report.presentation(),
            outcome: report.outcome(),
            iterations: report.record.iteration_count(),
            trace: report.trace.clone(),
            usage: report.usage.clone(),
        }
    }
}

/// The result block shown after a successful run
pub fn success_text(profile: &BotProfile, artifact: &str, feedback: &str, iterations: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- {} ---\n", profile.form.artifact_heading);
    let _ = writeln!(out, "{}\n", artifact);
    let _ = writeln!(out, "--- Feedback ---\n");
    let _ = writeln!(out, "{}\n", feedback);
    let _ = writeln!(out, "--- Iterations ---\n");
    let _ = write!(out, "{}", iterations);
    out
}

/// Step trace and token usage, one line per step
pub fn trace_text(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run {} ({})", report.run_id, report.bot);
    for (i, t) in report.trace.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<16} {:<10} iteration {} ({} ms)",
            i + 1,
            t.step.as_str(),
            format!("{:?}", t.outcome).to_lowercase(),
            t.iteration,
            t.elapsed_ms
        );
    }
    let _ = write!(
        out,
        "Tokens: {} prompt + {} completion over {} calls",
        report.usage.total_prompt_tokens,
        report.usage.total_completion_tokens,
        report.usage.total_calls
    );
    out
}
