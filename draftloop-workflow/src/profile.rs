//! Bot profiles: the prompts and copy that distinguish the code bot from
//! the story bot. The state machine itself is shared.

use crate::template::PromptTemplate;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// The four workflow steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Generate,
    Review,
    Refine,
    HandleFeedback,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Generate => "generate",
            Step::Review => "review",
            Step::Refine => "refine",
            Step::HandleFeedback => "handle_feedback",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The prompt one step sends, with its token budget and failure tag
#[derive(Debug, Clone)]
pub struct StepPrompt {
    pub template: PromptTemplate,
    pub max_tokens: usize,
    /// Prefix of the failure message, e.g. "Code generation failed"
    pub failure_tag: &'static str,
}

impl StepPrompt {
    fn builtin(
        template: &'static str,
        vars: &[&'static str],
        max_tokens: usize,
        failure_tag: &'static str,
    ) -> Self {
        Self {
            template: PromptTemplate::builtin(template, vars.iter().map(|v| Cow::Borrowed(*v)).collect()),
            max_tokens,
            failure_tag,
        }
    }

    /// "<tag>: <detail>"
    pub fn failure(&self, detail: impl fmt::Display) -> String {
        format!("{}: {}", self.failure_tag, detail)
    }
}

/// Optional auxiliary input a bot accepts (the code bot's target language)
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    /// Template variable name
    pub name: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    /// Used when the user leaves the field empty
    pub default: &'static str,
}

/// Form copy shown by the presentation layer
#[derive(Debug, Clone)]
pub struct FormCopy {
    pub title: &'static str,
    pub description: &'static str,
    pub input_label: &'static str,
    pub input_placeholder: &'static str,
    pub feedback_placeholder: &'static str,
    pub button_label: &'static str,
    pub spinner: &'static str,
    /// Shown instead of running when the request is empty
    pub empty_input: &'static str,
    /// Heading above the artifact, e.g. "Generated Code"
    pub artifact_heading: &'static str,
    /// Whether the artifact is rendered as a code block
    pub artifact_is_code: bool,
}

/// Everything that makes one bot different from another
#[derive(Debug, Clone)]
pub struct BotProfile {
    pub id: &'static str,
    /// Template variable carrying the user's request
    pub input_var: &'static str,
    /// Template variable carrying the current artifact
    pub artifact_var: &'static str,
    pub parameter: Option<ParameterSpec>,
    pub generate: StepPrompt,
    pub review: StepPrompt,
    pub refine: StepPrompt,
    pub feedback: StepPrompt,
    pub form: FormCopy,
}

const FEEDBACK_FAILED: &str = "Feedback generation failed";

impl BotProfile {
    /// Code generator: generate, review for correctness, optimize
    pub fn code() -> Self {
        Self {
            id: "code",
            input_var: "request",
            artifact_var: "code",
            parameter: Some(ParameterSpec {
                name: "language",
                label: "Language",
                placeholder: "e.g., Python, Rust, TypeScript",
                default: "Python",
            }),
            generate: StepPrompt::builtin(
                "Generate a clean, functional {language} code snippet for: {request}. \
                 Incorporate feedback if provided: {feedback}.",
                &["language", "request", "feedback"],
                500,
                "Code generation failed",
            ),
            review: StepPrompt::builtin(
                "Review this {language} code for correctness and clarity: \n\n{code}\n\n\
                 Return 'Approved' if no issues, else list specific issues.",
                &["language", "code"],
                500,
                "Code review failed",
            ),
            refine: StepPrompt::builtin(
                "Optimize this {language} code for performance and readability: \n\n{code}",
                &["language", "code"],
                500,
                "Code optimization failed",
            ),
            feedback: StepPrompt::builtin(
                "Provide concise feedback to improve this code based on: {notes}",
                &["notes"],
                500,
                FEEDBACK_FAILED,
            ),
            form: FormCopy {
                title: "Agentic AI Code Generator Bot",
                description: "Enter a coding request to generate, review, and optimize code.",
                input_label: "Code Request",
                input_placeholder: "e.g., Write a Python function to reverse a string",
                feedback_placeholder: "e.g., Make it more efficient",
                button_label: "Generate Code",
                spinner: "Generating and optimizing code...",
                empty_input: "Please enter a code request.",
                artifact_heading: "Generated Code",
                artifact_is_code: true,
            },
        }
    }

    /// Storyteller: craft, review for coherence, refine
    pub fn story() -> Self {
        Self {
            id: "story",
            input_var: "preferences",
            artifact_var: "story",
            parameter: None,
            generate: StepPrompt::builtin(
                "Craft an engaging, coherent, and creative story based on these preferences: \
                 {preferences}. Incorporate feedback if provided: {feedback}.",
                &["preferences", "feedback"],
                1000,
                "Story generation failed",
            ),
            review: StepPrompt::builtin(
                "Review this story for coherence, engagement, and creativity: \n\n{story}\n\n\
                 Return 'Approved' if no issues, else list specific issues.",
                &["story"],
                500,
                "Story review failed",
            ),
            refine: StepPrompt::builtin(
                "Refine this story to enhance its creativity, coherence, and engagement: \n\n{story}",
                &["story"],
                1000,
                "Story refinement failed",
            ),
            feedback: StepPrompt::builtin(
                "Provide concise feedback to improve this story based on: {notes}",
                &["notes"],
                500,
                FEEDBACK_FAILED,
            ),
            form: FormCopy {
                title: "Agentic AI Storytelling Bot",
                description: "Enter story preferences to generate, review, and refine a creative narrative.",
                input_label: "Story Preferences",
                input_placeholder: "e.g., Genre: Fantasy, Theme: Adventure, Characters: A brave knight and a cunning dragon",
                feedback_placeholder: "e.g., Make the story more suspenseful",
                button_label: "Generate Story",
                spinner: "Generating and refining story...",
                empty_input: "Please enter story preferences.",
                artifact_heading: "Generated Story",
                artifact_is_code: false,
            },
        }
    }

    pub fn all() -> Vec<BotProfile> {
        vec![Self::code(), Self::story()]
    }

    pub fn by_id(id: &str) -> Option<BotProfile> {
        match id {
            "code" => Some(Self::code()),
            "story" => Some(Self::story()),
            _ => None,
        }
    }

    pub fn prompt(&self, step: Step) -> &StepPrompt {
        match step {
            Step::Generate => &self.generate,
            Step::Review => &self.review,
            Step::Refine => &self.refine,
            Step::HandleFeedback => &self.feedback,
        }
    }

    /// The parameter value to bind: the user's value, else the default.
    pub fn parameter_value<'a>(&self, given: Option<&'a str>) -> Option<(&'static str, &'a str)> {
        self.parameter
            .as_ref()
            .map(|p| (p.name, given.unwrap_or(p.default)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEPS: [Step; 4] = [Step::Generate, Step::Review, Step::Refine, Step::HandleFeedback];

    #[test]
    fn test_builtin_templates_are_valid() {
        for profile in BotProfile::all() {
            for step in STEPS {
                profile
                    .prompt(step)
                    .template
                    .validate()
                    .unwrap_or_else(|e| panic!("{} {}: {}", profile.id, step, e));
            }
        }
    }

    #[test]
    fn test_review_prompts_ask_for_approval_token() {
        for profile in BotProfile::all() {
            assert!(profile.review.template.source().contains("'Approved'"));
        }
    }

    #[test]
    fn test_failure_tags() {
        let code = BotProfile::code();
        assert_eq!(code.generate.failure("boom"), "Code generation failed: boom");
        assert_eq!(code.review.failure("boom"), "Code review failed: boom");
        assert_eq!(code.refine.failure("boom"), "Code optimization failed: boom");

        let story = BotProfile::story();
        assert_eq!(story.generate.failure("x"), "Story generation failed: x");
        assert_eq!(story.refine.failure("x"), "Story refinement failed: x");
        assert_eq!(story.feedback.failure("x"), "Feedback generation failed: x");
    }

    #[test]
    fn test_token_budgets() {
        let story = BotProfile::story();
        assert_eq!(story.generate.max_tokens, 1000);
        assert_eq!(story.review.max_tokens, 500);
        assert_eq!(BotProfile::code().refine.max_tokens, 500);
    }

    #[test]
    fn test_by_id() {
        assert_eq!(BotProfile::by_id("story").map(|p| p.id), Some("story"));
        assert!(BotProfile::by_id("poem").is_none());
    }

    #[test]
    fn test_parameter_value_defaults() {
        let code = BotProfile::code();
        assert_eq!(code.parameter_value(None), Some(("language", "Python")));
        assert_eq!(code.parameter_value(Some("Rust")), Some(("language", "Rust")));
        assert_eq!(BotProfile::story().parameter_value(Some("noir")), None);
    }
}
