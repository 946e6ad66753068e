//! Presentation Shell
//!
//! Read-only projection of session state into what a UI shows, the
//! localized UI strings, and per-process language storage.

pub mod strings;
pub mod view;
pub mod storage;

pub use storage::{SessionStorage, LANGUAGE_KEY};
pub use strings::{hands_detected, strings, UiStrings};
pub use view::{render_text, CameraErrorPanel, FeedbackPanel, GameSuccessPanel, ViewModel};
