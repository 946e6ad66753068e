//! Validator client

use super::prompt::{build_prompt, prompt_context};
use super::reply::parse_reply;
use super::transport::{GenerateRequest, GenerationConfig, HttpTransport, ModelTransport};
use super::types::{
    DebugRecord, ValidationFailure, ValidationResult, ValidatorResponse, MISSING_KEY_ERROR, PARSE_FAILURE_FEEDBACK,
    UNREACHABLE_FEEDBACK,
};
use crate::app::config::ValidatorConfig;
use crate::lesson::{Language, Lesson};
use crate::pipeline::Snapshot;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Judges a snapshot against a lesson.
///
/// Implementations never fail: every problem is reported as a negative
/// result with the cause in the debug record.
pub trait SignValidator: Send + Sync {
    fn validate(
        &self,
        snapshot: &Snapshot,
        lesson: &Lesson,
        language: Language,
    ) -> impl Future<Output = ValidatorResponse> + Send;
}

impl<T: SignValidator> SignValidator for Arc<T> {
    async fn validate(&self, snapshot: &Snapshot, lesson: &Lesson, language: Language) -> ValidatorResponse {
        (**self).validate(snapshot, lesson, language).await
    }
}

/// Validator backed by a Gemini model
#[derive(Debug, Clone)]
pub struct GeminiValidator<T = HttpTransport> {
    transport: T,
    /// API key; `None` disables remote calls
    api_key: Option<String>,
    /// Model name
    pub model: String,
    generation: GenerationConfig,
}

impl GeminiValidator<HttpTransport> {
    /// Build from configuration, reading the key from the configured
    /// environment variable
    pub fn from_config(config: &ValidatorConfig) -> crate::Result<Self> {
        let transport = HttpTransport::new(&config.endpoint, Duration::from_secs(config.timeout_secs))
            .map_err(|e| crate::Error::Validator(e.to_string()))?;
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(var = %config.api_key_env, "API key is missing from environment variables");
        }
        Ok(Self::with_transport(transport, api_key, config))
    }
}

impl<T: ModelTransport> GeminiValidator<T> {
    pub fn with_transport(transport: T, api_key: Option<String>, config: &ValidatorConfig) -> Self {
        Self {
            transport,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            generation: GenerationConfig {
                max_output_tokens: config.max_output_tokens,
                temperature: config.temperature,
                response_mime_type: "application/json".to_string(),
            },
        }
    }

    /// Check if API key is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: ModelTransport> SignValidator for GeminiValidator<T> {
    async fn validate(&self, snapshot: &Snapshot, lesson: &Lesson, language: Language) -> ValidatorResponse {
        let mut record = DebugRecord::new(prompt_context(lesson, language));

        let Some(api_key) = self.api_key.as_deref() else {
            return ValidatorResponse {
                validation: ValidationResult::missing_key(language),
                debug: record.failed(ValidationFailure::MissingKey, MISSING_KEY_ERROR),
            };
        };

        let request = GenerateRequest::with_image(
            build_prompt(lesson, language),
            snapshot.mime_type(),
            snapshot.to_base64(),
            self.generation.clone(),
        );

        let started = Instant::now();
        let reply = self.transport.generate(api_key, &self.model, &request).await;
        record.latency_ms = started.elapsed().as_millis() as u64;

        let text = match reply {
            Ok(text) => text,
            Err(e) => {
                warn!(lesson = %lesson.id, error = %e, "Validation request failed");
                return ValidatorResponse {
                    validation: ValidationResult::rejected(UNREACHABLE_FEEDBACK),
                    debug: record.failed(ValidationFailure::Transport, e.to_string()),
                };
            }
        };
        record.raw_response = if text.is_empty() { "{}".to_string() } else { text };

        match parse_reply(&record.raw_response) {
            Ok(parsed) => {
                info!(
                    lesson = %lesson.id,
                    valid = parsed.validation.is_valid,
                    confidence = parsed.validation.confidence,
                    latency_ms = record.latency_ms,
                    "Validation complete"
                );
                record.parsed_response = Some(parsed.value);
                ValidatorResponse {
                    validation: parsed.validation,
                    debug: record,
                }
            }
            Err(e) => {
                warn!(lesson = %lesson.id, error = %e, "Failed to parse validation reply");
                debug!(raw = %record.raw_response, "Unparseable reply");
                ValidatorResponse {
                    validation: ValidationResult::rejected(PARSE_FAILURE_FEEDBACK),
                    debug: record.failed(ValidationFailure::MalformedReply, format!("JSON Parse Error: {}", e)),
                }
            }
        }
    }
}
