use serde_json::Value;
use thiserror::Error;

use super::schema::ProjectDescriptor;

const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no JSON found in response")]
    NoJson,
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("JSON does not describe a project: {0}")]
    Schema(#[source] serde_json::Error),
    #[error("missing files in project descriptor")]
    MissingFiles,
    #[error("invalid project descriptor: {0}")]
    Invalid(String),
}

/// Parses a model reply into a [`ProjectDescriptor`].
pub fn extract(raw: &str) -> Result<ProjectDescriptor, ExtractionError> {
    let value = extract_value(raw)?;
    serde_json::from_value(value).map_err(ExtractionError::Schema)
}

/// Finds the first JSON object in a model reply, tolerating code fences and prose around it.
///
/// A balanced `{...}` span that does not parse (prose such as `{project}`) is skipped
/// along with everything inside it, and the scan resumes after it. The first parse
/// error is reported when no span parses.
pub fn extract_value(raw: &str) -> Result<Value, ExtractionError> {
    let text = strip_code_fence(raw);
    let mut from = 0;
    let mut first_error = None;

    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        let span = match balanced_object_at(text, start) {
            Some(span) => span,
            None => break,
        };
        match serde_json::from_str::<Value>(span) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_error.get_or_insert(e);
                from = start + span.len();
            }
        }
    }

    Err(first_error.map_or(ExtractionError::NoJson, ExtractionError::InvalidJson))
}

/// Removes one opening fence (with optional language tag) and one closing fence.
pub fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest.trim_start_matches(|c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')
        });
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    text.trim()
}

/// Returns the span from the `{` at byte `start` to its depth-balanced `}`.
///
/// Braces inside string literals are ignored, so code in file contents
/// does not throw the count off.
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }

    None
}
