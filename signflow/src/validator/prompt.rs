//! Prompt construction

use crate::lesson::{Language, Lesson};

/// Short description of the call for the debug record
pub fn prompt_context(lesson: &Lesson, language: Language) -> String {
    format!("Lesson: {} ({})", lesson.label.get(language), language.code())
}

/// Instruction text sent alongside the snapshot
pub fn build_prompt(lesson: &Lesson, language: Language) -> String {
    let label = lesson.label.get(language);
    let description = lesson.description.get(language);

    format!(
        r#"You are an expert Sign Language instructor.
Analyze the provided image of a student's hand gesture.
The student is trying to sign: "{label}" ({description}).

Respond in {response_language}.

### YOUR TASK
1. Determine if the gesture is correct for the target sign.
2. Provide a confidence score (0.0 to 1.0).
3. Give constructive feedback. If incorrect, explain why.
4. Provide 1-2 specific suggestions for improvement.

### OUTPUT FORMAT
Return RAW JSON only. Do not use Markdown. Do not use code blocks.
JSON structure:
{{
  "isValid": boolean,
  "confidence": number,
  "feedback": "string",
  "suggestions": ["string"]
}}
"#,
        response_language = language.display_name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::Catalog;

    #[test]
    fn test_prompt_names_target_and_language() {
        let catalog = Catalog::default_lessons();
        let lesson = catalog.get(0).unwrap();

        let prompt = build_prompt(lesson, Language::Es);
        assert!(prompt.contains("\"Letra A\""));
        assert!(prompt.contains("Respond in Spanish."));
        assert!(prompt.contains("\"isValid\": boolean"));
    }

    #[test]
    fn test_prompt_context() {
        let catalog = Catalog::default_lessons();
        let lesson = catalog.get(0).unwrap();
        assert_eq!(prompt_context(lesson, Language::En), "Lesson: Letter A (en)");
    }
}
