//! Localized UI strings

use crate::lesson::Language;

/// Every label the interface shows, in one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiStrings {
    pub subtitle: &'static str,
    pub current_lesson: &'static str,
    pub ai_feedback: &'static str,
    pub position_hand: &'static str,
    pub analyzing: &'static str,
    pub excellent: &'static str,
    pub keep_trying: &'static str,
    pub tips: &'static str,
    pub no_hands_detected: &'static str,
    pub validate: &'static str,
    pub validating: &'static str,
    pub next: &'static str,
    pub auto_validate: &'static str,
    pub reference: &'static str,
    pub blur: &'static str,
    pub game_mode: &'static str,
    pub enter_name: &'static str,
    pub start_game: &'static str,
    pub spelling: &'static str,
    pub congrats: &'static str,
    pub finished_name: &'static str,
    pub play_again: &'static str,
    pub back_to_lessons: &'static str,
    pub camera_not_found: &'static str,
    pub camera_error: &'static str,
    pub camera_slow: &'static str,
    pub welcome_title: &'static str,
    pub welcome_desc: &'static str,
    pub start_learning: &'static str,
    pub select_lang: &'static str,
}

static EN: UiStrings = UiStrings {
    subtitle: "Interactive Sign Language Learning",
    current_lesson: "Current Lesson",
    ai_feedback: "AI Feedback",
    position_hand: "Position your hands in front of the camera.",
    analyzing: "Analyzing gesture...",
    excellent: "Excellent!",
    keep_trying: "Keep Trying",
    tips: "Tips",
    no_hands_detected: "NO HANDS DETECTED",
    validate: "Validate Gesture",
    validating: "Validating...",
    next: "Next Lesson",
    auto_validate: "Auto-Validate",
    reference: "Reference",
    blur: "Background Blur",
    game_mode: "Name Game",
    enter_name: "Enter your name",
    start_game: "Start Game",
    spelling: "Spelling",
    congrats: "Congratulations!",
    finished_name: "You spelled your name correctly!",
    play_again: "Play Again",
    back_to_lessons: "Back to Lessons",
    camera_not_found: "Camera not found. Please ensure your webcam is connected and permissions are granted.",
    camera_error: "Camera Error",
    camera_slow: "The camera is taking longer than expected to start.",
    welcome_title: "Welcome to SignFlow",
    welcome_desc: "Master American Sign Language with real-time AI feedback. Choose your language to begin.",
    start_learning: "Start Learning",
    select_lang: "Select Language",
};

static ES: UiStrings = UiStrings {
    subtitle: "Aprendizaje Interactivo de Lengua de Señas",
    current_lesson: "Lección Actual",
    ai_feedback: "Retroalimentación IA",
    position_hand: "Coloca tus manos frente a la cámara.",
    analyzing: "Analizando gesto...",
    excellent: "¡Excelente!",
    keep_trying: "Sigue intentando",
    tips: "Consejos",
    no_hands_detected: "MANOS NO DETECTADAS",
    validate: "Validar Gesto",
    validating: "Validando...",
    next: "Siguiente Lección",
    auto_validate: "Auto-Validar",
    reference: "Referencia",
    blur: "Desenfoque de Fondo",
    game_mode: "Juego del Nombre",
    enter_name: "Ingresa tu nombre",
    start_game: "Empezar Juego",
    spelling: "Deletreando",
    congrats: "¡Felicidades!",
    finished_name: "¡Deletreaste tu nombre correctamente!",
    play_again: "Jugar de Nuevo",
    back_to_lessons: "Volver a Lecciones",
    camera_not_found: "Cámara no encontrada. Por favor asegúrate de que tu webcam esté conectada y los permisos concedidos.",
    camera_error: "Error de Cámara",
    camera_slow: "La cámara está tardando más de lo esperado en iniciar.",
    welcome_title: "Bienvenido a SignFlow",
    welcome_desc: "Domina el Lenguaje de Señas con retroalimentación de IA en tiempo real. Elige tu idioma para comenzar.",
    start_learning: "Empezar a Aprender",
    select_lang: "Seleccionar Idioma",
};

/// String table for a language
pub fn strings(language: Language) -> &'static UiStrings {
    match language {
        Language::En => &EN,
        Language::Es => &ES,
    }
}

/// Hands badge text, e.g. "2 HANDS DETECTED" / "1 MANO DETECTADA"
pub fn hands_detected(language: Language, count: usize) -> String {
    let plural = if count != 1 { "S" } else { "" };
    match language {
        Language::En => format!("{} HAND{} DETECTED", count, plural),
        Language::Es => format!("{} MANO{} DETECTADA{}", count, plural, plural),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hands_detected_pluralization() {
        assert_eq!(hands_detected(Language::En, 1), "1 HAND DETECTED");
        assert_eq!(hands_detected(Language::En, 2), "2 HANDS DETECTED");
        assert_eq!(hands_detected(Language::Es, 1), "1 MANO DETECTADA");
        assert_eq!(hands_detected(Language::Es, 2), "2 MANOS DETECTADAS");
    }

    #[test]
    fn test_tables_differ_by_language() {
        assert_eq!(strings(Language::En).excellent, "Excellent!");
        assert_eq!(strings(Language::Es).excellent, "¡Excelente!");
    }
}
