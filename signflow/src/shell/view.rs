//! View projection and terminal rendering

use super::strings::{hands_detected, strings};
use crate::lesson::Catalog;
use crate::pipeline::PipelineStatus;
use crate::session::{SessionMode, SessionPhase, SessionView};
use serde::Serialize;
use std::fmt;

/// Content of the feedback panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackPanel {
    /// No hands and nothing in flight
    PositionHands { message: String },
    Analyzing { message: String },
    Result {
        headline: String,
        is_valid: bool,
        /// Whole percent
        confidence_percent: u32,
        feedback: String,
        tips_label: String,
        suggestions: Vec<String>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSuccessPanel {
    pub title: String,
    pub message: String,
    pub play_again: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraErrorPanel {
    pub title: String,
    pub message: String,
    pub detail: String,
}

/// Everything the interface renders for one session state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub subtitle: String,
    pub language: String,
    pub mode_label: String,
    /// Lesson label, or the uppercase game letter
    pub target_title: Option<String>,
    pub target_description: Option<String>,
    pub reference_image: Option<String>,
    /// "Reference" or "Spelling: NAME"
    pub reference_label: Option<String>,
    /// "Current Lesson" or "Spelling 2/5"
    pub progress: Option<String>,
    /// "3 / 6" in lesson mode
    pub lesson_position: Option<String>,
    pub hands_badge: String,
    pub auto_validate: String,
    pub feedback: FeedbackPanel,
    pub game_success: Option<GameSuccessPanel>,
    pub camera_error: Option<CameraErrorPanel>,
    pub camera_notice: Option<String>,
    pub validate_label: String,
    pub validate_enabled: bool,
    /// Game mode is waiting for a name
    pub awaiting_name: Option<String>,
}

impl ViewModel {
    /// Pure projection of session and pipeline state
    pub fn project(view: &SessionView, lessons: &Catalog, pipeline: &PipelineStatus) -> Self {
        let state = &view.state;
        let t = strings(state.language);
        let language = state.language;
        let game = state.mode == SessionMode::Game;
        let game_started = state.game_target_name.is_some();
        let showing_target = !game || (game_started && !state.game_complete);

        let target_title = showing_target
            .then(|| match state.game_letter() {
                Some(letter) if game => Some(letter.to_uppercase().to_string()),
                _ => view.target.as_ref().map(|l| l.label.get(language).to_string()),
            })
            .flatten();

        let progress = showing_target.then(|| {
            if game {
                format!("{} {}/{}", t.spelling, state.game_letter_index + 1, state.game_length())
            } else {
                t.current_lesson.to_string()
            }
        });

        let reference_label = showing_target.then(|| match &state.game_target_name {
            Some(name) if game => format!("{}: {}", t.spelling, name),
            _ => t.reference.to_string(),
        });

        let feedback = if state.is_validation_in_flight {
            FeedbackPanel::Analyzing {
                message: t.analyzing.to_string(),
            }
        } else if let Some(result) = &state.last_validation_result {
            FeedbackPanel::Result {
                headline: if result.is_valid { t.excellent } else { t.keep_trying }.to_string(),
                is_valid: result.is_valid,
                confidence_percent: (result.confidence * 100.0).round() as u32,
                feedback: result.feedback.clone(),
                tips_label: t.tips.to_string(),
                suggestions: result.suggestions.clone(),
            }
        } else if state.hands_detected_count == 0 {
            FeedbackPanel::PositionHands {
                message: t.position_hand.to_string(),
            }
        } else {
            FeedbackPanel::Empty
        };

        let game_success = (game && state.phase == SessionPhase::Complete).then(|| GameSuccessPanel {
            title: t.congrats.to_string(),
            message: t.finished_name.to_string(),
            play_again: t.play_again.to_string(),
        });

        let camera_error = match pipeline {
            PipelineStatus::CameraError(detail) => Some(CameraErrorPanel {
                title: t.camera_error.to_string(),
                message: t.camera_not_found.to_string(),
                detail: detail.clone(),
            }),
            _ => None,
        };

        Self {
            subtitle: t.subtitle.to_string(),
            language: language.code().to_uppercase(),
            mode_label: if game { t.game_mode } else { t.current_lesson }.to_string(),
            target_description: showing_target
                .then(|| view.target.as_ref().map(|l| l.description.get(language).to_string()))
                .flatten(),
            reference_image: showing_target
                .then(|| view.target.as_ref().and_then(|l| l.image_url.clone()))
                .flatten(),
            target_title,
            reference_label,
            progress,
            lesson_position: (!game).then(|| {
                format!("{} / {}", state.current_lesson_index % lessons.len() + 1, lessons.len())
            }),
            hands_badge: if state.hands_detected_count > 0 {
                hands_detected(language, state.hands_detected_count)
            } else {
                t.no_hands_detected.to_string()
            },
            auto_validate: format!("{}: {}", t.auto_validate, if state.auto_validate { "ON" } else { "OFF" }),
            feedback,
            game_success,
            camera_error,
            camera_notice: (*pipeline == PipelineStatus::InitTimeout).then(|| t.camera_slow.to_string()),
            validate_label: if state.is_validation_in_flight { t.validating } else { t.validate }.to_string(),
            validate_enabled: state.can_validate(),
            awaiting_name: (game && !game_started).then(|| t.enter_name.to_string()),
        }
    }
}

/// Plain-text rendering for the terminal
pub fn render_text(model: &ViewModel) -> String {
    model.to_string()
}

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SignFlow [{}] {}", self.language, self.subtitle)?;

        if let Some(error) = &self.camera_error {
            writeln!(f, "!! {}: {}", error.title, error.message)?;
            return writeln!(f, "   {}", error.detail);
        }
        if let Some(notice) = &self.camera_notice {
            writeln!(f, "!  {}", notice)?;
        }

        writeln!(f, "-- {} --", self.mode_label)?;
        if let Some(prompt) = &self.awaiting_name {
            writeln!(f, "{}", prompt)?;
        }
        if let Some(success) = &self.game_success {
            writeln!(f, "** {} {}", success.title, success.message)?;
        }

        if let Some(title) = &self.target_title {
            let progress = self.progress.as_deref().unwrap_or_default();
            match &self.lesson_position {
                Some(position) => writeln!(f, "{} ({}) {}", progress, position, title)?,
                None => writeln!(f, "{} {}", progress, title)?,
            }
        }
        if let Some(description) = &self.target_description {
            writeln!(f, "   {}", description)?;
        }

        writeln!(f, "[{}] {}", self.hands_badge, self.auto_validate)?;

        match &self.feedback {
            FeedbackPanel::PositionHands { message } | FeedbackPanel::Analyzing { message } => {
                writeln!(f, "> {}", message)?;
            }
            FeedbackPanel::Result {
                headline,
                confidence_percent,
                feedback,
                tips_label,
                suggestions,
                ..
            } => {
                writeln!(f, "> {} ({}%)", headline, confidence_percent)?;
                writeln!(f, "  {}", feedback)?;
                if !suggestions.is_empty() {
                    writeln!(f, "  {}:", tips_label)?;
                    for suggestion in suggestions {
                        writeln!(f, "   - {}", suggestion)?;
                    }
                }
            }
            FeedbackPanel::Empty => {}
        }
        Ok(())
    }
}
