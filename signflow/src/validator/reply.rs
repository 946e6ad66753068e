//! Model reply parsing
//!
//! Replies are expected to be a bare JSON object, but models sometimes wrap
//! it in prose or code fences. The outermost `{...}` span is parsed and each
//! field is coerced leniently; anything that is not a JSON object is an error.

use super::types::{ValidationResult, NO_FEEDBACK};
use serde_json::{Map, Value};

/// Reply could not be turned into a verdict
#[derive(Debug, thiserror::Error)]
pub enum ReplyParseError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Verdict plus the JSON it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub validation: ValidationResult,
    pub value: Value,
}

/// Slice from the first `{` to the last `}`, or the whole text when there is
/// no such ordered pair.
pub fn extract_json_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Parse model reply text into a verdict
pub fn parse_reply(text: &str) -> Result<ParsedReply, ReplyParseError> {
    let text = if text.trim().is_empty() { "{}" } else { text };
    let value: Value = serde_json::from_str(extract_json_object(text))?;

    let object = value
        .as_object()
        .ok_or_else(|| ReplyParseError::NotAnObject(kind(&value)))?;

    Ok(ParsedReply {
        validation: coerce(object),
        value,
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn coerce(object: &Map<String, Value>) -> ValidationResult {
    let feedback = match object.get("feedback") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => NO_FEEDBACK.to_string(),
    };
    let suggestions = match object.get("suggestions") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    ValidationResult {
        is_valid: object.get("isValid").map_or(false, truthy),
        confidence: object.get("confidence").map_or(0.0, numeric).clamp(0.0, 1.0),
        feedback,
        suggestions,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn numeric(value: &Value) -> f32 {
    let number = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if number.is_finite() {
        number as f32
    } else {
        0.0
    }
}
