//! Session controller
//!
//! Shares one [`SessionState`] between the frame pipeline (hand counts), the
//! auto-validate loop, user actions and deferred advancement timers.

use super::policy::AutoValidatePolicy;
use super::state::{
    SessionError, SessionMode, SessionState, TriggerOrigin, TriggerRejected, ValidationOutcome,
};
use crate::app::config::SessionConfig;
use crate::lesson::{Catalog, Language, Lesson};
use crate::pipeline::{HandCountSink, SnapshotSource};
use crate::shell::SessionStorage;
use crate::validator::SignValidator;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Delay between a correct attempt and moving to the next target
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(2000);

/// State plus the lesson it currently targets, as published to observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub state: SessionState,
    pub target: Option<Lesson>,
}

struct Inner<V, S> {
    validator: V,
    snapshots: S,
    lessons: Catalog,
    alphabet: Catalog,
    policy: AutoValidatePolicy,
    advance_delay: Duration,
    storage: Option<SessionStorage>,
    state: Mutex<SessionState>,
    updates: watch::Sender<SessionView>,
    shutdown: watch::Sender<bool>,
}

impl<V, S> Inner<V, S> {
    fn view_of(&self, state: &SessionState) -> SessionView {
        SessionView {
            state: state.clone(),
            target: state.current_target(&self.lessons, &self.alphabet).cloned(),
        }
    }

    /// Mutate under the lock and publish the new view before releasing it
    fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.lock();
        let result = f(&mut state);
        self.updates.send_replace(self.view_of(&state));
        result
    }

    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// Releases the single-flight flag unless the call completed normally
struct InFlightGuard<'a, V, S> {
    inner: &'a Inner<V, S>,
    armed: bool,
}

impl<'a, V, S> InFlightGuard<'a, V, S> {
    fn new(inner: &'a Inner<V, S>) -> Self {
        Self { inner, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<V, S> Drop for InFlightGuard<'_, V, S> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.update(|state| state.abort_validation());
        }
    }
}

/// Builder for [`ValidationSession`]
pub struct SessionBuilder<V, S> {
    validator: V,
    snapshots: S,
    lessons: Catalog,
    alphabet: Catalog,
    policy: AutoValidatePolicy,
    advance_delay: Duration,
    auto_validate: bool,
    storage: Option<SessionStorage>,
    default_language: Language,
}

impl<V, S> SessionBuilder<V, S>
where
    V: SignValidator + 'static,
    S: SnapshotSource + 'static,
{
    pub fn lessons(mut self, lessons: Catalog) -> Self {
        self.lessons = lessons;
        self
    }

    /// Letters used for game-mode spelling
    pub fn alphabet(mut self, alphabet: Catalog) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn policy(mut self, policy: AutoValidatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    pub fn auto_validate(mut self, enabled: bool) -> Self {
        self.auto_validate = enabled;
        self
    }

    /// Language store; a stored language overrides the default
    pub fn storage(mut self, storage: SessionStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    /// Apply timing and auto-validate settings from configuration
    pub fn config(mut self, config: &SessionConfig) -> Self {
        self.policy = AutoValidatePolicy {
            cooldown: Duration::from_millis(config.cooldown_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        };
        self.advance_delay = Duration::from_millis(config.advance_delay_ms);
        self.auto_validate = config.auto_validate;
        self
    }

    pub fn build(self) -> ValidationSession<V, S> {
        let language = self
            .storage
            .as_ref()
            .and_then(SessionStorage::language)
            .unwrap_or(self.default_language);
        let state = SessionState::new(language, self.auto_validate);
        let view = SessionView {
            target: state.current_target(&self.lessons, &self.alphabet).cloned(),
            state: state.clone(),
        };
        let (updates, _) = watch::channel(view);
        let (shutdown, _) = watch::channel(false);

        info!(session_id = %state.session_id, language = %language, lessons = self.lessons.len(), "Session started");

        ValidationSession {
            inner: Arc::new(Inner {
                validator: self.validator,
                snapshots: self.snapshots,
                lessons: self.lessons,
                alphabet: self.alphabet,
                policy: self.policy,
                advance_delay: self.advance_delay,
                storage: self.storage,
                state: Mutex::new(state),
                updates,
                shutdown,
            }),
        }
    }
}

/// Practice session over a validator `V` and snapshot source `S`.
///
/// Cheap to clone; all clones share the same state.
pub struct ValidationSession<V, S> {
    inner: Arc<Inner<V, S>>,
}

impl<V, S> Clone for ValidationSession<V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V, S> ValidationSession<V, S>
where
    V: SignValidator + 'static,
    S: SnapshotSource + 'static,
{
    pub fn builder(validator: V, snapshots: S) -> SessionBuilder<V, S> {
        SessionBuilder {
            validator,
            snapshots,
            lessons: Catalog::default_lessons(),
            alphabet: Catalog::alphabet(),
            policy: AutoValidatePolicy::default(),
            advance_delay: DEFAULT_ADVANCE_DELAY,
            auto_validate: true,
            storage: None,
            default_language: Language::default(),
        }
    }

    /// Attempt one validation of the current target.
    ///
    /// Rejected triggers leave the state untouched.
    pub async fn trigger(&self, origin: TriggerOrigin) -> Result<ValidationOutcome, TriggerRejected> {
        let inner = &*self.inner;
        let started = inner.update(|state| {
            let generation = state.begin_validation(origin, Instant::now(), inner.policy.cooldown)?;
            match state.current_target(&inner.lessons, &inner.alphabet).cloned() {
                Some(lesson) => Ok((generation, lesson, state.language)),
                None => {
                    state.abort_validation();
                    Err(TriggerRejected::GameNotStarted)
                }
            }
        });
        let (generation, lesson, language) = match started {
            Ok(started) => started,
            Err(rejected) => {
                debug!(?origin, reason = %rejected, "Validation trigger rejected");
                return Err(rejected);
            }
        };

        let guard = InFlightGuard::new(inner);
        debug!(?origin, lesson = %lesson.id, "Validation started");

        let snapshot = match inner.snapshots.capture() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Snapshot capture failed");
                return Ok(ValidationOutcome::Aborted);
            }
        };

        let response = inner.validator.validate(&snapshot, &lesson, language).await;
        if inner.is_shut_down() {
            debug!("Session shut down during validation, discarding result");
            return Ok(ValidationOutcome::Aborted);
        }

        guard.disarm();
        let outcome = inner.update(|state| state.finish_validation(generation, response, Instant::now()));
        info!(lesson = %lesson.id, ?outcome, "Validation finished");

        if let ValidationOutcome::AdvanceScheduled { generation } = outcome {
            self.schedule_advance(generation);
        }
        Ok(outcome)
    }

    fn schedule_advance(&self, generation: u64) {
        let session = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(session.inner.advance_delay).await;
            if session.inner.is_shut_down() {
                return;
            }
            let inner = &*session.inner;
            let applied = inner.update(|state| state.apply_advance(generation, &inner.lessons));
            if applied {
                debug!(generation, "Advanced to next target");
            } else {
                debug!(generation, "Pending advance superseded");
            }
        });
    }

    /// Poll the auto-validate policy until [`shutdown`](Self::shutdown)
    pub async fn run_auto_validate(&self) {
        let inner = &*self.inner;
        let mut shutdown = inner.shutdown.subscribe();
        let mut ticker = tokio::time::interval(inner.policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            if inner.is_shut_down() {
                break;
            }
            tokio::select! {
                _ = shutdown.changed() => continue,
                _ = ticker.tick() => {}
            }

            let due = {
                let state = inner.state.lock();
                inner.policy.should_trigger(&state, Instant::now())
            };
            if due {
                if let Err(rejected) = self.trigger(TriggerOrigin::Auto).await {
                    debug!(reason = %rejected, "Auto-validate skipped");
                }
            }
        }
        debug!("Auto-validate loop stopped");
    }

    /// Stop the auto-validate loop and drop any pending or in-flight results
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.is_shut_down()
    }

    pub fn start_game(&self, name: &str) -> Result<(), SessionError> {
        self.inner.update(|state| state.start_game(name))
    }

    pub fn restart_game(&self) {
        self.inner.update(SessionState::restart_game);
    }

    pub fn set_mode(&self, mode: SessionMode) {
        self.inner.update(|state| state.set_mode(mode));
    }

    pub fn next_lesson(&self) {
        let inner = &*self.inner;
        inner.update(|state| state.next_lesson(&inner.lessons));
    }

    pub fn prev_lesson(&self) {
        let inner = &*self.inner;
        inner.update(|state| state.prev_lesson(&inner.lessons));
    }

    /// Switch to the other language and return it
    pub fn toggle_language(&self) -> Language {
        let language = self.inner.update(|state| {
            let next = state.language.toggled();
            state.set_language(next);
            next
        });
        self.persist_language(language);
        language
    }

    pub fn select_language(&self, language: Language) {
        self.inner.update(|state| state.set_language(language));
        self.persist_language(language);
    }

    fn persist_language(&self, language: Language) {
        if let Some(storage) = &self.inner.storage {
            storage.set_language(language);
        }
    }

    pub fn set_auto_validate(&self, enabled: bool) {
        self.inner.update(|state| state.auto_validate = enabled);
    }

    /// Record the latest hand count; observers are notified only on change
    pub fn set_hands_detected(&self, count: usize) {
        let inner = &*self.inner;
        let mut state = inner.state.lock();
        if state.hands_detected_count != count {
            state.hands_detected_count = count;
            inner.updates.send_replace(inner.view_of(&state));
        }
    }

    pub fn current_target(&self) -> Option<Lesson> {
        let inner = &*self.inner;
        inner.state.lock().current_target(&inner.lessons, &inner.alphabet).cloned()
    }

    /// Read-only copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.lock().clone()
    }

    pub fn view(&self) -> SessionView {
        let inner = &*self.inner;
        inner.view_of(&inner.state.lock())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.inner.updates.subscribe()
    }

    pub fn lessons(&self) -> &Catalog {
        &self.inner.lessons
    }

    pub fn validator(&self) -> &V {
        &self.inner.validator
    }
}

impl<V, S> HandCountSink for ValidationSession<V, S>
where
    V: SignValidator + 'static,
    S: SnapshotSource + 'static,
{
    fn publish_hand_count(&self, count: usize) {
        self.set_hands_detected(count);
    }
}
