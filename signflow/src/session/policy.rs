//! Auto-validate policy

use super::state::{SessionPhase, SessionState};
use tokio::time::{Duration, Instant};

/// Default minimum time between completed validations and auto triggers
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);
/// Default poll period of the auto-validate loop
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// When the background loop should start a validation on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoValidatePolicy {
    pub cooldown: Duration,
    pub poll_interval: Duration,
}

impl Default for AutoValidatePolicy {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl AutoValidatePolicy {
    /// Auto-validate is on, hands are visible, nothing is in flight and the
    /// cooldown has strictly elapsed since the last completed validation
    pub fn should_trigger(&self, state: &SessionState, now: Instant) -> bool {
        state.auto_validate
            && state.hands_detected_count > 0
            && !state.is_validation_in_flight
            && state.phase == SessionPhase::Idle
            && state
                .last_validation_at
                .map_or(true, |last| now.saturating_duration_since(last) > self.cooldown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::Language;

    #[test]
    fn test_should_trigger_gates() {
        let policy = AutoValidatePolicy::default();
        let now = Instant::now();
        let mut state = SessionState::new(Language::En, true);
        assert!(!policy.should_trigger(&state, now));

        state.hands_detected_count = 2;
        assert!(policy.should_trigger(&state, now));

        state.last_validation_at = Some(now);
        assert!(!policy.should_trigger(&state, now + Duration::from_secs(3)));
        assert!(policy.should_trigger(&state, now + Duration::from_millis(3001)));

        state.is_validation_in_flight = true;
        assert!(!policy.should_trigger(&state, now + Duration::from_secs(10)));

        state.is_validation_in_flight = false;
        state.auto_validate = false;
        assert!(!policy.should_trigger(&state, now + Duration::from_secs(10)));
    }
}
