//! Validation Session
//!
//! Snapshot capture, the remote validation round trip, and lesson / game
//! progression from its result. At most one validation is in flight at a
//! time; a correct attempt advances the target after a short delay unless
//! the learner changes the target first.

pub mod state;
pub mod policy;
pub mod controller;

pub use controller::{SessionBuilder, SessionView, ValidationSession, DEFAULT_ADVANCE_DELAY};
pub use policy::AutoValidatePolicy;
pub use state::{
    SessionError, SessionMode, SessionPhase, SessionState, TriggerOrigin, TriggerRejected, ValidationOutcome,
};
