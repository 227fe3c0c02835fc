//! Parsing the outline JSON returned by the model.
//!
//! Models are asked for a bare JSON object but often wrap it in a
//! ```` ```json ```` fence or add a sentence around it. Parsing is lenient
//! about shape (wrong types become empty) and strict about content: an
//! outline with neither subjects nor lecture topics is an error.

use crate::error::PlannerError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// Fields of an outline as understood from the model's JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutline {
    pub subject_names: Vec<String>,
    pub lecture_topics: Vec<String>,
    pub lecture_focus_mapping: IndexMap<String, Vec<String>>,
}

static RE_LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z]*\s*").unwrap());

/// Trim, drop a leading ```` ```json ```` / ```` ``` ```` fence and every
/// remaining fence marker, trim again.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_lead = RE_LEADING_FENCE.replace(trimmed, "");
    without_lead.replace("```", "").trim().to_string()
}

/// Parse the model's reply into a [`ParsedOutline`].
pub fn parse_outline(raw: &str) -> Result<ParsedOutline, PlannerError> {
    let cleaned = strip_code_fences(raw);
    let root = parse_object(&cleaned)?;

    let outline = ParsedOutline {
        subject_names: string_list(root.get("subject_names")),
        lecture_topics: string_list(root.get("lecture_topics")),
        lecture_focus_mapping: focus_mapping(root.get("lecture_focus_mapping")),
    };

    if outline.subject_names.is_empty() && outline.lecture_topics.is_empty() {
        return Err(PlannerError::EmptyOutline);
    }

    debug!(
        "Parsed outline: {} subjects, {} lectures, {} mapped",
        outline.subject_names.len(),
        outline.lecture_topics.len(),
        outline.lecture_focus_mapping.len()
    );
    Ok(outline)
}

/// Parse `text` as a JSON object, falling back to the span between the first
/// `{` and the last `}` when the model added prose around it.
fn parse_object(text: &str) -> Result<Map<String, Value>, PlannerError> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        Err(first) => match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str::<Value>(&text[start..=end]).map_err(|_| {
                    PlannerError::OutlineParse {
                        detail: first.to_string(),
                    }
                })?
            }
            _ => {
                return Err(PlannerError::OutlineParse {
                    detail: first.to_string(),
                })
            }
        },
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(PlannerError::OutlineParse {
            detail: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strings of a JSON array, trimmed, blanks and non-strings dropped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn focus_mapping(value: Option<&Value>) -> IndexMap<String, Vec<String>> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(k, _)| !k.trim().is_empty())
            .map(|(k, v)| (k.trim().to_string(), string_list(Some(v))))
            .collect(),
        _ => IndexMap::new(),
    }
}
