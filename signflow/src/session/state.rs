//! Session state and its pure transitions
//!
//! Every mutation of the practice session goes through a method here; the
//! controller only adds locking, timers and I/O around them.

use crate::lesson::{Catalog, Language, Lesson};
use crate::validator::{DebugRecord, ValidatorResponse};
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};
use uuid::Uuid;

/// Which sequence of targets is being practiced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Fixed lesson catalog
    #[default]
    Lesson,
    /// Letters of a learner-supplied name
    Game,
}

/// Validation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    InFlight,
    /// Correct attempt; target moves on after the advance delay
    Advancing,
    /// Every letter of the game name was signed correctly
    Complete,
}

/// What started a validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOrigin {
    Manual,
    Auto,
}

/// Why a trigger did not start a validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TriggerRejected {
    #[error("a validation is already in flight")]
    InFlight,
    #[error("no hands detected")]
    NoHands,
    #[error("auto-validate is disabled")]
    AutoValidateDisabled,
    #[error("cooldown has not elapsed")]
    CoolingDown,
    #[error("no game name entered")]
    GameNotStarted,
    #[error("game already complete")]
    GameComplete,
    #[error("advancing to the next target")]
    Advancing,
}

/// Invalid session operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("game name must not be empty")]
    EmptyGameName,
}

/// Effect of applying a validator response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Incorrect attempt; feedback shown, target unchanged
    Retry,
    /// Correct attempt; apply the advance for `generation` after the delay
    AdvanceScheduled { generation: u64 },
    /// Last letter of the game name signed correctly
    GameComplete,
    /// The target changed while the call was in flight; result dropped
    Stale,
    /// No result was produced (snapshot failed or session shut down)
    Aborted,
}

/// Complete state of one practice session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub session_id: Uuid,
    pub mode: SessionMode,
    pub current_lesson_index: usize,
    pub game_target_name: Option<String>,
    pub game_letter_index: usize,
    pub game_complete: bool,
    pub last_validation_result: Option<crate::validator::ValidationResult>,
    /// Diagnostics of the most recent call
    pub last_debug: Option<DebugRecord>,
    pub is_validation_in_flight: bool,
    #[serde(skip)]
    pub last_validation_at: Option<Instant>,
    pub hands_detected_count: usize,
    pub auto_validate: bool,
    pub language: Language,
    pub phase: SessionPhase,
    /// Bumped whenever the active target changes
    pub target_generation: u64,
}

impl SessionState {
    pub fn new(language: Language, auto_validate: bool) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            mode: SessionMode::Lesson,
            current_lesson_index: 0,
            game_target_name: None,
            game_letter_index: 0,
            game_complete: false,
            last_validation_result: None,
            last_debug: None,
            is_validation_in_flight: false,
            last_validation_at: None,
            hands_detected_count: 0,
            auto_validate,
            language,
            phase: SessionPhase::Idle,
            target_generation: 0,
        }
    }

    /// Letter currently being spelled in game mode
    pub fn game_letter(&self) -> Option<char> {
        match self.mode {
            SessionMode::Game => self
                .game_target_name
                .as_deref()
                .and_then(|name| name.chars().nth(self.game_letter_index)),
            SessionMode::Lesson => None,
        }
    }

    /// Number of letters in the game name
    pub fn game_length(&self) -> usize {
        self.game_target_name.as_deref().map_or(0, |name| name.chars().count())
    }

    /// The lesson being attempted, or `None` in game mode before a name is
    /// entered
    pub fn current_target<'a>(&self, lessons: &'a Catalog, alphabet: &'a Catalog) -> Option<&'a Lesson> {
        match self.mode {
            SessionMode::Lesson => lessons.get(self.current_lesson_index % lessons.len()),
            SessionMode::Game => self.game_letter().map(|ch| alphabet.lesson_for_char(ch)),
        }
    }

    /// Whether a manual trigger would be accepted right now
    pub fn can_validate(&self) -> bool {
        !self.is_validation_in_flight && self.hands_detected_count > 0
    }

    fn retarget(&mut self) {
        self.last_validation_result = None;
        self.target_generation = self.target_generation.wrapping_add(1);
        if self.phase == SessionPhase::Advancing {
            self.phase = SessionPhase::Idle;
        }
    }

    /// Check-and-set the single-flight flag.
    ///
    /// Returns the target generation the call is validating against.
    pub fn begin_validation(
        &mut self,
        origin: TriggerOrigin,
        now: Instant,
        cooldown: Duration,
    ) -> Result<u64, TriggerRejected> {
        if self.is_validation_in_flight {
            return Err(TriggerRejected::InFlight);
        }
        match self.phase {
            SessionPhase::Advancing => return Err(TriggerRejected::Advancing),
            SessionPhase::Complete => return Err(TriggerRejected::GameComplete),
            SessionPhase::Idle | SessionPhase::InFlight => {}
        }
        if self.mode == SessionMode::Game && self.game_letter().is_none() {
            return Err(TriggerRejected::GameNotStarted);
        }
        if self.hands_detected_count == 0 {
            return Err(TriggerRejected::NoHands);
        }
        if origin == TriggerOrigin::Auto {
            if !self.auto_validate {
                return Err(TriggerRejected::AutoValidateDisabled);
            }
            if let Some(last) = self.last_validation_at {
                if now.saturating_duration_since(last) <= cooldown {
                    return Err(TriggerRejected::CoolingDown);
                }
            }
        }

        self.is_validation_in_flight = true;
        self.phase = SessionPhase::InFlight;
        Ok(self.target_generation)
    }

    /// Apply a validator response for a call started at `generation`
    pub fn finish_validation(&mut self, generation: u64, response: ValidatorResponse, now: Instant) -> ValidationOutcome {
        self.is_validation_in_flight = false;
        self.last_validation_at = Some(now);
        self.last_debug = Some(response.debug);
        if self.phase == SessionPhase::InFlight {
            self.phase = SessionPhase::Idle;
        }

        if generation != self.target_generation {
            return ValidationOutcome::Stale;
        }

        let is_valid = response.validation.is_valid;
        self.last_validation_result = Some(response.validation);
        if !is_valid {
            return ValidationOutcome::Retry;
        }

        match self.mode {
            SessionMode::Game if self.game_letter_index + 1 >= self.game_length() => {
                self.game_complete = true;
                self.phase = SessionPhase::Complete;
                ValidationOutcome::GameComplete
            }
            SessionMode::Game | SessionMode::Lesson => {
                self.phase = SessionPhase::Advancing;
                ValidationOutcome::AdvanceScheduled { generation }
            }
        }
    }

    /// Release the single-flight flag without a result (snapshot or task
    /// failure)
    pub fn abort_validation(&mut self) {
        self.is_validation_in_flight = false;
        if self.phase == SessionPhase::InFlight {
            self.phase = SessionPhase::Idle;
        }
    }

    /// Move to the next target if nothing changed since the advance was
    /// scheduled. Returns whether the advance was applied.
    pub fn apply_advance(&mut self, generation: u64, lessons: &Catalog) -> bool {
        if generation != self.target_generation || self.phase != SessionPhase::Advancing {
            return false;
        }
        match self.mode {
            SessionMode::Lesson => self.current_lesson_index = lessons.next_index(self.current_lesson_index),
            SessionMode::Game => self.game_letter_index += 1,
        }
        self.phase = SessionPhase::Idle;
        self.retarget();
        true
    }

    pub fn next_lesson(&mut self, lessons: &Catalog) {
        self.current_lesson_index = lessons.next_index(self.current_lesson_index);
        self.retarget();
    }

    pub fn prev_lesson(&mut self, lessons: &Catalog) {
        self.current_lesson_index = lessons.prev_index(self.current_lesson_index);
        self.retarget();
    }

    pub fn set_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
        if self.phase == SessionPhase::Complete && mode == SessionMode::Lesson {
            self.phase = SessionPhase::Idle;
        } else if mode == SessionMode::Game && self.game_complete {
            self.phase = SessionPhase::Complete;
        }
        self.retarget();
    }

    /// Start spelling `name`; switches to game mode
    pub fn start_game(&mut self, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyGameName);
        }
        self.mode = SessionMode::Game;
        self.game_target_name = Some(name.to_string());
        self.game_letter_index = 0;
        self.game_complete = false;
        if self.phase == SessionPhase::Complete {
            self.phase = SessionPhase::Idle;
        }
        self.retarget();
        Ok(())
    }

    /// Clear the game name so a new one can be entered
    pub fn restart_game(&mut self) {
        self.game_target_name = None;
        self.game_letter_index = 0;
        self.game_complete = false;
        if self.phase == SessionPhase::Complete {
            self.phase = SessionPhase::Idle;
        }
        self.retarget();
    }

    /// Returns whether the language changed
    pub fn set_language(&mut self, language: Language) -> bool {
        if self.language == language {
            return false;
        }
        self.language = language;
        self.retarget();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{DebugRecord, ValidationResult};

    const COOLDOWN: Duration = Duration::from_secs(3);

    fn response(is_valid: bool) -> ValidatorResponse {
        ValidatorResponse {
            validation: ValidationResult {
                is_valid,
                confidence: if is_valid { 0.9 } else { 0.1 },
                feedback: "feedback".into(),
                suggestions: Vec::new(),
            },
            debug: DebugRecord::new("Lesson: test (en)"),
        }
    }

    fn ready() -> SessionState {
        let mut state = SessionState::new(Language::En, true);
        state.hands_detected_count = 1;
        state
    }

    #[test]
    fn test_second_trigger_rejected_while_in_flight() {
        let mut state = ready();
        let now = Instant::now();
        state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN).unwrap();
        assert_eq!(
            state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN),
            Err(TriggerRejected::InFlight)
        );
        assert_eq!(state.phase, SessionPhase::InFlight);
    }

    #[test]
    fn test_manual_trigger_needs_hands() {
        let mut state = SessionState::new(Language::En, true);
        assert_eq!(
            state.begin_validation(TriggerOrigin::Manual, Instant::now(), COOLDOWN),
            Err(TriggerRejected::NoHands)
        );
        assert!(!state.can_validate());
    }

    #[test]
    fn test_auto_trigger_respects_cooldown_and_toggle() {
        let mut state = ready();
        let start = Instant::now();
        let generation = state.begin_validation(TriggerOrigin::Auto, start, COOLDOWN).unwrap();
        state.finish_validation(generation, response(false), start);

        assert_eq!(
            state.begin_validation(TriggerOrigin::Auto, start + COOLDOWN, COOLDOWN),
            Err(TriggerRejected::CoolingDown)
        );
        // Manual triggers ignore the cooldown
        state.begin_validation(TriggerOrigin::Manual, start, COOLDOWN).unwrap();
        state.abort_validation();

        state.auto_validate = false;
        assert_eq!(
            state.begin_validation(TriggerOrigin::Auto, start + Duration::from_secs(10), COOLDOWN),
            Err(TriggerRejected::AutoValidateDisabled)
        );
    }

    #[test]
    fn test_invalid_result_keeps_target() {
        let mut state = ready();
        let now = Instant::now();
        let generation = state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN).unwrap();

        assert_eq!(state.finish_validation(generation, response(false), now), ValidationOutcome::Retry);
        assert_eq!(state.phase, SessionPhase::Idle);
        assert_eq!(state.current_lesson_index, 0);
        assert!(!state.last_validation_result.as_ref().unwrap().is_valid);
    }

    #[test]
    fn test_valid_lesson_result_advances_once() {
        let lessons = Catalog::default_lessons();
        let mut state = ready();
        let now = Instant::now();
        let generation = state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN).unwrap();

        let outcome = state.finish_validation(generation, response(true), now);
        assert_eq!(outcome, ValidationOutcome::AdvanceScheduled { generation });
        assert_eq!(state.phase, SessionPhase::Advancing);

        assert!(state.apply_advance(generation, &lessons));
        assert_eq!(state.current_lesson_index, 1);
        assert!(state.last_validation_result.is_none());
        assert!(!state.apply_advance(generation, &lessons));
        assert_eq!(state.current_lesson_index, 1);
    }

    #[test]
    fn test_navigation_cancels_pending_advance() {
        let lessons = Catalog::default_lessons();
        let mut state = ready();
        let now = Instant::now();
        let generation = state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN).unwrap();
        state.finish_validation(generation, response(true), now);

        state.prev_lesson(&lessons);
        assert_eq!(state.current_lesson_index, lessons.len() - 1);
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(!state.apply_advance(generation, &lessons));
        assert_eq!(state.current_lesson_index, lessons.len() - 1);
    }

    #[test]
    fn test_result_for_changed_target_is_stale() {
        let lessons = Catalog::default_lessons();
        let mut state = ready();
        let now = Instant::now();
        let generation = state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN).unwrap();
        state.next_lesson(&lessons);

        assert_eq!(state.finish_validation(generation, response(true), now), ValidationOutcome::Stale);
        assert!(state.last_validation_result.is_none());
        assert!(state.last_debug.is_some());
        assert!(!state.is_validation_in_flight);
        assert_eq!(state.current_lesson_index, 1);
    }

    #[test]
    fn test_game_spells_every_letter_then_completes() {
        let lessons = Catalog::default_lessons();
        let alphabet = Catalog::alphabet();
        let mut state = ready();
        state.start_game("  Ana ").unwrap();
        assert_eq!(state.game_target_name.as_deref(), Some("Ana"));

        let now = Instant::now();
        for expected in 0..2 {
            assert_eq!(state.game_letter_index, expected);
            let generation = state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN).unwrap();
            state.finish_validation(generation, response(true), now);
            assert!(state.apply_advance(generation, &lessons));
        }

        assert_eq!(state.current_target(&lessons, &alphabet).unwrap().id, "a");
        let generation = state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN).unwrap();
        assert_eq!(
            state.finish_validation(generation, response(true), now),
            ValidationOutcome::GameComplete
        );
        assert!(state.game_complete);
        assert_eq!(state.game_letter_index, 2);
        assert_eq!(
            state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN),
            Err(TriggerRejected::GameComplete)
        );

        state.restart_game();
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(state.game_target_name.is_none());
        assert_eq!(
            state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN),
            Err(TriggerRejected::GameNotStarted)
        );
    }

    #[test]
    fn test_start_game_rejects_blank_name() {
        let mut state = ready();
        assert_eq!(state.start_game("   "), Err(SessionError::EmptyGameName));
        assert_eq!(state.mode, SessionMode::Lesson);
    }

    #[test]
    fn test_language_change_clears_result() {
        let mut state = ready();
        let now = Instant::now();
        let generation = state.begin_validation(TriggerOrigin::Manual, now, COOLDOWN).unwrap();
        state.finish_validation(generation, response(false), now);

        assert!(!state.set_language(Language::En));
        assert!(state.last_validation_result.is_some());
        assert!(state.set_language(Language::Es));
        assert!(state.last_validation_result.is_none());
    }

    #[test]
    fn test_game_target_falls_back_for_unknown_letters() {
        let lessons = Catalog::default_lessons();
        let alphabet = Catalog::alphabet();
        let mut state = ready();
        state.start_game("Ñu").unwrap();
        assert_eq!(state.current_target(&lessons, &alphabet).unwrap().id, "a");
    }
}
