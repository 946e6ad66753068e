//! Validation Session Integration Tests
//!
//! Drives `ValidationSession` with scripted validators under paused time:
//! - single-flight triggering
//! - deferred advancement timing and cancellation
//! - name game progression to completion
//! - the auto-validate poll loop and its cooldown
//! - failure results flowing through the ordinary path

use parking_lot::Mutex;
use signflow::lesson::{Catalog, Language, Lesson};
use signflow::pipeline::{SharedSurface, Snapshot};
use signflow::session::{
    SessionMode, SessionPhase, TriggerOrigin, TriggerRejected, ValidationOutcome, ValidationSession,
};
use signflow::validator::{DebugRecord, ValidationResult, ValidatorResponse};
use signflow::SignValidator;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helpers
// ============================================================================

/// Validator that replays a script of verdicts, then repeats the last one
struct ScriptedValidator {
    verdicts: Mutex<VecDeque<bool>>,
    fallback: bool,
    latency: Duration,
    calls: AtomicUsize,
    targets: Mutex<Vec<String>>,
}

impl ScriptedValidator {
    fn new(verdicts: &[bool]) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.iter().copied().collect()),
            fallback: verdicts.last().copied().unwrap_or(false),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        }
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl SignValidator for ScriptedValidator {
    async fn validate(&self, _snapshot: &Snapshot, lesson: &Lesson, language: Language) -> ValidatorResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().push(lesson.id.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let is_valid = self.verdicts.lock().pop_front().unwrap_or(self.fallback);
        ValidatorResponse {
            validation: ValidationResult {
                is_valid,
                confidence: if is_valid { 0.95 } else { 0.2 },
                feedback: if is_valid { "Well done" } else { "Curl your fingers" }.to_string(),
                suggestions: Vec::new(),
            },
            debug: DebugRecord::new(format!("Lesson: {} ({})", lesson.label.get(language), language)),
        }
    }
}

fn frame_snapshot() -> Snapshot {
    Snapshot::from_encoded(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg")
}

fn session_with(
    validator: &Arc<ScriptedValidator>,
) -> ValidationSession<Arc<ScriptedValidator>, Snapshot> {
    let session = ValidationSession::builder(validator.clone(), frame_snapshot()).build();
    session.set_hands_detected(1);
    session
}

// ============================================================================
// Triggering
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_trigger_while_in_flight_is_rejected() {
    let validator = Arc::new(ScriptedValidator::new(&[false]).with_latency(Duration::from_millis(500)));
    let session = session_with(&validator);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.trigger(TriggerOrigin::Manual).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(session.snapshot().is_validation_in_flight);

    assert_eq!(session.trigger(TriggerOrigin::Manual).await, Err(TriggerRejected::InFlight));
    assert_eq!(session.trigger(TriggerOrigin::Auto).await, Err(TriggerRejected::InFlight));

    assert_eq!(first.await.unwrap(), Ok(ValidationOutcome::Retry));
    assert_eq!(validator.calls.load(Ordering::SeqCst), 1);
    assert!(!session.snapshot().is_validation_in_flight);
}

#[tokio::test]
async fn test_no_hands_rejects_manual_trigger() {
    let validator = Arc::new(ScriptedValidator::new(&[true]));
    let session = ValidationSession::builder(validator.clone(), frame_snapshot()).build();

    assert_eq!(session.trigger(TriggerOrigin::Manual).await, Err(TriggerRejected::NoHands));
    assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_snapshot_failure_leaves_session_idle() {
    let validator = Arc::new(ScriptedValidator::new(&[true]));
    let session = ValidationSession::builder(validator.clone(), SharedSurface::new(60)).build();
    session.set_hands_detected(2);

    assert_eq!(session.trigger(TriggerOrigin::Manual).await, Ok(ValidationOutcome::Aborted));
    let state = session.snapshot();
    assert_eq!(state.phase, SessionPhase::Idle);
    assert!(!state.is_validation_in_flight);
    assert!(state.last_validation_result.is_none());
    assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_discards_in_flight_result() {
    let validator = Arc::new(ScriptedValidator::new(&[true]).with_latency(Duration::from_millis(300)));
    let session = session_with(&validator);

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.trigger(TriggerOrigin::Manual).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.shutdown();

    assert_eq!(pending.await.unwrap(), Ok(ValidationOutcome::Aborted));
    let state = session.snapshot();
    assert!(state.last_validation_result.is_none());
    assert!(!state.is_validation_in_flight);
    assert_eq!(state.current_lesson_index, 0);
}

// ============================================================================
// Advancement
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_lesson_advances_after_exactly_the_delay() {
    let validator = Arc::new(ScriptedValidator::new(&[true]));
    let session = session_with(&validator);

    let outcome = session.trigger(TriggerOrigin::Manual).await.unwrap();
    assert!(matches!(outcome, ValidationOutcome::AdvanceScheduled { .. }));
    assert_eq!(session.snapshot().phase, SessionPhase::Advancing);

    tokio::time::sleep(Duration::from_millis(1999)).await;
    let state = session.snapshot();
    assert_eq!(state.current_lesson_index, 0);
    assert!(state.last_validation_result.as_ref().unwrap().is_valid);

    tokio::time::sleep(Duration::from_millis(2)).await;
    let state = session.snapshot();
    assert_eq!(state.current_lesson_index, 1);
    assert!(state.last_validation_result.is_none());
    assert_eq!(state.phase, SessionPhase::Idle);

    // Applied exactly once
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.snapshot().current_lesson_index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_cancels_pending_advance() {
    let validator = Arc::new(ScriptedValidator::new(&[true]));
    let session = session_with(&validator);

    session.trigger(TriggerOrigin::Manual).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    session.next_lesson();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(session.snapshot().current_lesson_index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_lesson_index_wraps_after_last_lesson() {
    let validator = Arc::new(ScriptedValidator::new(&[true]));
    let session = session_with(&validator);
    let len = Catalog::default_lessons().len();

    for _ in 0..len - 1 {
        session.next_lesson();
    }
    assert_eq!(session.current_target().unwrap().id, "hello");

    session.trigger(TriggerOrigin::Manual).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2001)).await;
    assert_eq!(session.snapshot().current_lesson_index, 0);
}

#[tokio::test(start_paused = true)]
async fn test_name_game_runs_to_completion() {
    let validator = Arc::new(ScriptedValidator::new(&[false, true, true, true]));
    let session = session_with(&validator);
    session.start_game("Abe").unwrap();

    // Wrong attempt keeps the letter
    assert_eq!(session.trigger(TriggerOrigin::Manual).await, Ok(ValidationOutcome::Retry));
    assert_eq!(session.snapshot().game_letter_index, 0);

    for expected_next in 1..3 {
        session.trigger(TriggerOrigin::Manual).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert_eq!(session.snapshot().game_letter_index, expected_next);
    }

    assert_eq!(session.trigger(TriggerOrigin::Manual).await, Ok(ValidationOutcome::GameComplete));
    let state = session.snapshot();
    assert!(state.game_complete);
    assert_eq!(state.phase, SessionPhase::Complete);
    assert_eq!(state.game_letter_index, 2);
    assert_eq!(*validator.targets.lock(), vec!["a", "a", "b", "e"]);

    assert_eq!(session.trigger(TriggerOrigin::Manual).await, Err(TriggerRejected::GameComplete));

    session.restart_game();
    let state = session.snapshot();
    assert_eq!(state.mode, SessionMode::Game);
    assert!(state.game_target_name.is_none());
    assert!(!state.game_complete);
}

// ============================================================================
// Auto-validate loop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_auto_validate_respects_cooldown() {
    let validator = Arc::new(ScriptedValidator::new(&[false]));
    let session = session_with(&validator);

    let auto = tokio::spawn({
        let session = session.clone();
        async move { session.run_auto_validate().await }
    });

    // Ticks at 1s (fires), 2s, 3s, 4s (cooling down), 5s (fires)
    tokio::time::sleep(Duration::from_millis(5500)).await;
    assert_eq!(validator.calls.load(Ordering::SeqCst), 2);

    session.shutdown();
    auto.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_auto_validate_waits_for_hands_and_toggle() {
    let validator = Arc::new(ScriptedValidator::new(&[false]));
    let session = ValidationSession::builder(validator.clone(), frame_snapshot()).build();
    session.set_auto_validate(false);

    let auto = tokio::spawn({
        let session = session.clone();
        async move { session.run_auto_validate().await }
    });

    session.set_hands_detected(1);
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(validator.calls.load(Ordering::SeqCst), 0);

    session.set_auto_validate(true);
    session.set_hands_detected(0);
    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert_eq!(validator.calls.load(Ordering::SeqCst), 0);

    session.set_hands_detected(1);
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(validator.calls.load(Ordering::SeqCst), 1);

    session.shutdown();
    auto.await.unwrap();
}

// ============================================================================
// Language and observers
// ============================================================================

#[tokio::test]
async fn test_language_toggle_clears_feedback_and_reaches_validator() {
    let validator = Arc::new(ScriptedValidator::new(&[false]));
    let session = session_with(&validator);

    session.trigger(TriggerOrigin::Manual).await.unwrap();
    assert!(session.snapshot().last_validation_result.is_some());

    assert_eq!(session.toggle_language(), Language::Es);
    let state = session.snapshot();
    assert!(state.last_validation_result.is_none());

    session.trigger(TriggerOrigin::Manual).await.unwrap();
    let debug = session.snapshot().last_debug.unwrap();
    assert_eq!(debug.prompt_context, "Lesson: Letra A (es)");
}

#[tokio::test]
async fn test_subscribers_see_result() {
    let validator = Arc::new(ScriptedValidator::new(&[false]));
    let session = session_with(&validator);
    let mut updates = session.subscribe();

    session.trigger(TriggerOrigin::Manual).await.unwrap();
    assert!(updates.has_changed().unwrap());
    let view = updates.borrow_and_update().clone();
    assert_eq!(view.state.last_validation_result.unwrap().feedback, "Curl your fingers");
    assert_eq!(view.target.unwrap().id, "a");
}
