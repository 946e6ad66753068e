//! Remote Validator Client
//!
//! Wraps one call to a multimodal model: builds the prompt from the lesson,
//! submits the snapshot, and parses the structured verdict. Every failure is
//! mapped to a negative [`ValidationResult`] with the cause recorded in the
//! accompanying [`DebugRecord`], so callers never handle an error.

pub mod types;
pub mod prompt;
pub mod reply;
pub mod transport;
pub mod client;

pub use client::{GeminiValidator, SignValidator};
pub use prompt::{build_prompt, prompt_context};
pub use reply::{extract_json_object, parse_reply, ParsedReply, ReplyParseError};
pub use transport::{GenerateRequest, HttpTransport, ModelTransport, TransportError};
pub use types::{DebugRecord, ValidationFailure, ValidationResult, ValidatorResponse};
