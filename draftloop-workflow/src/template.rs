//! Prompt templates with `{name}` placeholders

use draftloop_error::{Error, Result};
use std::borrow::Cow;

/// A prompt with named placeholders.
///
/// `{name}` is replaced by the value bound to `name`; `{{` and `}}` produce
/// literal braces. Substituted values are inserted verbatim and never
/// re-scanned, so user text containing braces is safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: Cow<'static, str>,
    input_variables: Vec<Cow<'static, str>>,
}

enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Var(&'a str),
}

impl PromptTemplate {
    /// Build a template, checking that the declared variables and the
    /// placeholders in the text agree.
    pub fn new(template: impl Into<String>, input_variables: &[&str]) -> Result<Self> {
        let tpl = Self {
            source: Cow::Owned(template.into()),
            input_variables: input_variables
                .iter()
                .map(|v| Cow::Owned(v.to_string()))
                .collect(),
        };
        tpl.validate()?;
        Ok(tpl)
    }

    /// Built-in template; checked by the profile tests instead of at runtime.
    pub(crate) fn builtin(
        template: &'static str,
        input_variables: Vec<Cow<'static, str>>,
    ) -> Self {
        Self {
            source: Cow::Borrowed(template),
            input_variables,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn input_variables(&self) -> impl Iterator<Item = &str> {
        self.input_variables.iter().map(|v| v.as_ref())
    }

    /// Every placeholder must be declared and every declared variable used.
    pub fn validate(&self) -> Result<()> {
        let placeholders = self.placeholders()?;

        for name in &placeholders {
            if !self.input_variables.iter().any(|v| v == name) {
                return Err(Error::template_invalid(format!(
                    "placeholder '{{{}}}' is not a declared input variable",
                    name
                ))
                .with_operation("template::validate"));
            }
        }
        for var in &self.input_variables {
            if !placeholders.iter().any(|p| p == var) {
                return Err(Error::template_invalid(format!(
                    "input variable '{}' does not appear in the template",
                    var
                ))
                .with_operation("template::validate"));
            }
        }
        Ok(())
    }

    /// Fill the template. Bindings not referenced by the template are ignored.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String> {
        let mut out = String::with_capacity(self.source.len() + 64);

        for segment in self.segments()? {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Brace(c) => out.push(c),
                Segment::Var(name) => {
                    let value = vars
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| {
                            Error::invalid_argument(format!("no value bound for '{{{}}}'", name))
                                .with_operation("template::render")
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    fn placeholders(&self) -> Result<Vec<&str>> {
        Ok(self
            .segments()?
            .into_iter()
            .filter_map(|s| match s {
                Segment::Var(name) => Some(name),
                _ => None,
            })
            .collect())
    }

    fn segments(&self) -> Result<Vec<Segment<'_>>> {
        let src: &str = &self.source;
        let mut segments = Vec::new();
        let mut rest = src;

        while let Some(pos) = rest.find(['{', '}']) {
            if pos > 0 {
                segments.push(Segment::Literal(&rest[..pos]));
            }
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                segments.push(Segment::Brace('{'));
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                segments.push(Segment::Brace('}'));
                rest = &tail[2..];
            } else if tail.starts_with('{') {
                let close = tail.find('}').ok_or_else(|| unbalanced(src))?;
                let name = &tail[1..close];
                if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    return Err(Error::template_invalid(format!(
                        "invalid placeholder '{{{}}}'",
                        name
                    ))
                    .with_operation("template::parse"));
                }
                segments.push(Segment::Var(name));
                rest = &tail[close + 1..];
            } else {
                return Err(unbalanced(src));
            }
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest));
        }
        Ok(segments)
    }
}

fn unbalanced(src: &str) -> Error {
    Error::template_invalid("unbalanced brace in template")
        .with_operation("template::parse")
        .with_context("template", src.chars().take(60).collect::<String>())
}
