//! Server-rendered pages. Every piece of user or model text goes through
//! `escape`.

use draftloop_workflow::{BotProfile, Presentation};
use serde::Deserialize;
use std::fmt::Write;

/// Fields posted by the bot form
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FormInput {
    pub input: String,
    pub param: String,
    pub feedback: String,
}

/// What to show under the form
#[derive(Debug)]
pub enum FormResult {
    /// Validation message, no run happened
    Invalid(String),
    Run(Presentation),
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:1rem;font-weight:bold}\
input,textarea{width:100%;box-sizing:border-box}\
pre{background:#f4f4f4;padding:1rem;overflow-x:auto}\
.error{color:#a00;border:1px solid #a00;padding:.5rem}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{}</style></head><body>\n{}\n</body></html>\n",
        escape(title),
        STYLE,
        body
    )
}

pub fn index_page(profiles: &[BotProfile]) -> String {
    let mut body = String::from("<h1>draftloop</h1>\n<ul>\n");
    for profile in profiles {
        let _ = writeln!(
            body,
            "<li><a href=\"/bots/{}\">{}</a> - {}</li>",
            escape(profile.id),
            escape(profile.form.title),
            escape(profile.form.description)
        );
    }
    body.push_str("</ul>");
    page("draftloop", &body)
}

pub fn not_found_page(id: &str) -> String {
    page(
        "Not found",
        &format!(
            "<h1>Not found</h1>\n<p>No bot named '{}'. <a href=\"/\">All bots</a></p>",
            escape(id)
        ),
    )
}

pub fn form_page(profile: &BotProfile, input: &FormInput, result: Option<&FormResult>) -> String {
    let form = &profile.form;
    let mut body = String::new();

    let _ = writeln!(body, "<h1>{}</h1>", escape(form.title));
    let _ = writeln!(body, "<p>{}</p>", escape(form.description));
    let _ = writeln!(
        body,
        "<form method=\"post\" action=\"/bots/{}\" onsubmit=\"document.getElementById('spinner').hidden=false\">",
        escape(profile.id)
    );

    let _ = writeln!(
        body,
        "<label for=\"input\">{}</label>\n<textarea id=\"input\" name=\"input\" rows=\"3\" placeholder=\"{}\">{}</textarea>",
        escape(form.input_label),
        escape(form.input_placeholder),
        escape(&input.input)
    );

    if let Some(param) = &profile.parameter {
        let _ = writeln!(
            body,
            "<label for=\"param\">{}</label>\n<input id=\"param\" name=\"param\" placeholder=\"{}\" value=\"{}\">",
            escape(param.label),
            escape(param.placeholder),
            escape(&input.param)
        );
    }

    let _ = writeln!(
        body,
        "<label for=\"feedback\">Feedback (optional)</label>\n<textarea id=\"feedback\" name=\"feedback\" rows=\"4\" placeholder=\"{}\">{}</textarea>",
        escape(form.feedback_placeholder),
        escape(&input.feedback)
    );
    let _ = writeln!(body, "<p><button type=\"submit\">{}</button></p>", escape(form.button_label));
    let _ = writeln!(body, "<p id=\"spinner\" hidden>{}</p>\n</form>", escape(form.spinner));

    match result {
        None => {}
        Some(FormResult::Invalid(message)) => {
            let _ = writeln!(body, "<div class=\"error\">{}</div>", escape(message));
        }
        Some(FormResult::Run(Presentation::Failure { error })) => {
            let _ = writeln!(body, "<div class=\"error\">{}</div>", escape(error));
        }
        Some(FormResult::Run(Presentation::Success {
            artifact,
            feedback,
            iterations,
        })) => {
            let _ = writeln!(body, "<h2>{}</h2>", escape(form.artifact_heading));
            if form.artifact_is_code {
                let _ = writeln!(body, "<pre><code>{}</code></pre>", escape(artifact));
            } else {
                let _ = writeln!(body, "<div class=\"artifact\">{}</div>", paragraphs(artifact));
            }
            let _ = writeln!(body, "<h2>Feedback</h2>\n<p>{}</p>", escape(feedback));
            let _ = writeln!(body, "<h2>Iterations</h2>\n<p>{}</p>", iterations);
        }
    }

    body.push_str("<p><a href=\"/\">All bots</a></p>");
    page(form.title, &body)
}

/// Prose split on blank lines, one `<p>` each
fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape(p).replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#x27;y&#x27;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_form_has_parameter_only_for_code() {
        let code = form_page(&BotProfile::code(), &FormInput::default(), None);
        assert!(code.contains("name=\"param\""));
        assert!(code.contains("Generate Code"));

        let story = form_page(&BotProfile::story(), &FormInput::default(), None);
        assert!(!story.contains("name=\"param\""));
        assert!(story.contains("Story Preferences"));
    }

    #[test]
    fn test_story_renders_paragraphs() {
        let result = FormResult::Run(Presentation::Success {
            artifact: "Once upon a time.\n\nThe <end>.".into(),
            feedback: "No feedback needed.".into(),
            iterations: 2,
        });
        let html = form_page(&BotProfile::story(), &FormInput::default(), Some(&result));
        assert!(html.contains("<p>Once upon a time.</p>\n<p>The &lt;end&gt;.</p>"));
        assert!(html.contains("<h2>Iterations</h2>\n<p>2</p>"));
    }

    #[test]
    fn test_input_is_echoed_escaped() {
        let input = FormInput {
            input: "</textarea><b>".into(),
            ..Default::default()
        };
        let html = form_page(&BotProfile::code(), &input, None);
        assert!(html.contains("&lt;/textarea&gt;&lt;b&gt;</textarea>"));
    }
}
