//! Validation result and debug record types

use crate::lesson::Language;
use serde::{Deserialize, Serialize};

/// Feedback used when the reply has no usable feedback text
pub const NO_FEEDBACK: &str = "No feedback provided.";
/// Feedback for a transport failure or non-success status
pub const UNREACHABLE_FEEDBACK: &str = "AI Service Unreachable";
/// Feedback for a reply that is not a JSON object
pub const PARSE_FAILURE_FEEDBACK: &str = "Failed to parse AI response.";
/// Error recorded when no credentials are configured
pub const MISSING_KEY_ERROR: &str = "API Key Missing";

/// Verdict for one attempt at a sign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Model confidence in [0, 1]
    pub confidence: f32,
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    /// Negative result with no confidence and no suggestions
    pub fn rejected(feedback: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            confidence: 0.0,
            feedback: feedback.into(),
            suggestions: Vec::new(),
        }
    }

    /// Localized result for missing credentials
    pub fn missing_key(language: Language) -> Self {
        Self::rejected(match language {
            Language::En => "API Key missing.",
            Language::Es => "Falta la clave API.",
        })
    }
}

/// Why a call produced a fallback result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationFailure {
    MissingKey,
    Transport,
    MalformedReply,
}

/// Diagnostics for a single validation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugRecord {
    pub latency_ms: u64,
    /// e.g. "Lesson: Letter A (en)"
    pub prompt_context: String,
    pub raw_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Local wall-clock time the call started (HH:MM:SS)
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ValidationFailure>,
}

impl DebugRecord {
    pub fn new(prompt_context: impl Into<String>) -> Self {
        Self {
            latency_ms: 0,
            prompt_context: prompt_context.into(),
            raw_response: String::new(),
            parsed_response: None,
            error: None,
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            failure: None,
        }
    }

    pub(crate) fn failed(mut self, failure: ValidationFailure, error: impl Into<String>) -> Self {
        self.failure = Some(failure);
        self.error = Some(error.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Result plus diagnostics, as returned by every validator call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorResponse {
    pub validation: ValidationResult,
    pub debug: DebugRecord,
}
