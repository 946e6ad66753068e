//! # SignFlow
//!
//! Sign-language practice loop: a camera feed composited with background
//! blur and a hand-skeleton overlay, per-attempt gesture validation by a
//! remote vision model, and lesson / name-spelling progression driven by
//! the validation results.
//!
//! ## Quick Start
//!
//! ```no_run
//! use signflow::app::config::Config;
//! use signflow::lesson::{Catalog, Language};
//! use signflow::pipeline::SharedSurface;
//! use signflow::session::ValidationSession;
//! use signflow::shell::SessionStorage;
//! use signflow::validator::GeminiValidator;
//!
//! # async fn demo() -> signflow::Result<()> {
//! let config = Config::load_default()?;
//! let validator = GeminiValidator::from_config(&config.validator)?;
//! let surface = SharedSurface::new(config.pipeline.snapshot_quality);
//!
//! let session = ValidationSession::builder(validator, surface.clone())
//!     .lessons(Catalog::default_lessons())
//!     .storage(SessionStorage::new())
//!     .config(&config.session)
//!     .default_language(Language::En)
//!     .build();
//!
//! // The frame pipeline presents composited frames into `surface` and
//! // publishes hand counts; the auto-validate loop does the rest.
//! session.run_auto_validate().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`lesson`]: lesson records, built-in catalogs, languages
//! - [`pipeline`]: frame sources, perception traits, compositing, snapshots
//! - [`validator`]: prompt building, model transport, reply parsing
//! - [`session`]: session state machine, auto-validate policy, progression
//! - [`shell`]: read-only view projection, localized strings, session storage
//! - [`app`]: CLI and configuration management
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────┐   ┌─────────────┐
//! │  Camera  │──▶│    Frame     │──▶│ Validation │──▶│   Remote    │
//! │  frames  │   │   Pipeline   │   │  Session   │◀──│  Validator  │
//! └──────────┘   └──────────────┘   └────────────┘   └─────────────┘
//!                                         │
//!                                         ▼
//!                                  ┌─────────────┐
//!                                  │    Shell    │
//!                                  └─────────────┘
//! ```

pub mod lesson;
pub mod pipeline;
pub mod validator;
pub mod session;
pub mod shell;
pub mod app;

// Re-export commonly used types
pub use lesson::{Catalog, Language, Lesson};
pub use pipeline::{FramePipeline, PipelineError, PipelineStatus, SharedSurface, Snapshot};
pub use session::{SessionState, TriggerOrigin, ValidationSession};
pub use validator::{DebugRecord, GeminiValidator, SignValidator, ValidationResult};

/// Result type alias for SignFlow
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SignFlow
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lesson catalog error: {0}")]
    Catalog(String),

    #[error("Frame pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Validator setup error: {0}")]
    Validator(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
