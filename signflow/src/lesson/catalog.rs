//! Lesson records and the built-in catalogs

use super::language::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Text available in every supported language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub es: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, es: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            es: es.into(),
        }
    }

    /// Text for the given language
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Es => &self.es,
        }
    }
}

/// A single sign the learner practices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier (a lowercase letter for alphabet lessons)
    pub id: String,
    /// Short title, e.g. "Letter A"
    pub label: LocalizedText,
    /// How to form the sign
    pub description: LocalizedText,
    /// Reference image shown next to the camera view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// (id, english description, spanish description)
const ALPHABET_TABLE: [(&str, &str, &str); 26] = [
    ("a", "Make a fist with the thumb resting against the side of the index finger.", "Haz un puño con el pulgar apoyado contra el costado del dedo índice."),
    ("b", "Open palm with fingers together and thumb tucked across the palm.", "Palma abierta con los dedos juntos y el pulgar metido en la palma."),
    ("c", "Curve your hand into a \"C\" shape.", "Curva tu mano en forma de \"C\"."),
    ("d", "Index finger points up, other fingers curve to touch the thumb.", "El dedo índice apunta hacia arriba, los otros dedos se curvan para tocar el pulgar."),
    ("e", "All fingers curled in, thumb tucked under the fingers.", "Todos los dedos curvados hacia adentro, el pulgar metido debajo de los dedos."),
    ("f", "Touch index finger to thumb, other three fingers extended and spread.", "Toca el dedo índice con el pulgar, los otros tres dedos extendidos y separados."),
    ("g", "Thumb and index finger extended parallel, pointing sideways.", "Pulgar e índice extendidos en paralelo, apuntando hacia un lado."),
    ("h", "Index and middle fingers extended parallel, pointing sideways.", "Dedos índice y medio extendidos en paralelo, apuntando hacia un lado."),
    ("i", "Pinky finger extended up, other fingers curled into a fist.", "Dedo meñique extendido hacia arriba, los otros dedos curvados en un puño."),
    ("j", "Pinky finger extended, draw a \"J\" shape in the air.", "Dedo meñique extendido, dibuja una forma de \"J\" en el aire."),
    ("k", "Index and middle fingers up in a \"V\", thumb touches middle finger.", "Dedos índice y medio hacia arriba en una \"V\", el pulgar toca el dedo medio."),
    ("l", "Extend thumb and index finger to form an \"L\" shape.", "Extiende el pulgar y el dedo índice para formar una \"L\"."),
    ("m", "Thumb tucked under index, middle, and ring fingers.", "Pulgar metido debajo de los dedos índice, medio y anular."),
    ("n", "Thumb tucked under index and middle fingers.", "Pulgar metido debajo de los dedos índice y medio."),
    ("o", "All fingers curved to touch the thumb, forming an \"O\".", "Todos los dedos curvados para tocar el pulgar, formando una \"O\"."),
    ("p", "Similar to \"K\" but pointing downwards.", "Similar a la \"K\" pero apuntando hacia abajo."),
    ("q", "Similar to \"G\" but pointing downwards.", "Similar a la \"G\" pero apuntando hacia abajo."),
    ("r", "Index and middle fingers crossed.", "Dedos índice y medio cruzados."),
    ("s", "Make a fist with the thumb tucked across the fingers.", "Haz un puño con el pulgar metido a través de los dedos."),
    ("t", "Make a fist with the thumb tucked under the index finger.", "Haz un puño con el pulgar metido debajo del dedo índice."),
    ("u", "Index and middle fingers extended up and together.", "Dedos índice y medio extendidos hacia arriba y juntos."),
    ("v", "Index and middle fingers extended up and spread apart.", "Dedos índice y medio extendidos hacia arriba y separados."),
    ("w", "Index, middle, and ring fingers extended up and spread apart.", "Dedos índice, medio y anular extendidos hacia arriba y separados."),
    ("x", "Index finger curled into a hook, other fingers curled into a fist.", "Dedo índice curvado en forma de gancho, otros dedos curvados en un puño."),
    ("y", "Thumb and pinky fingers extended, other fingers curled in.", "Dedos pulgar y meñique extendidos, otros dedos curvados hacia adentro."),
    ("z", "Index finger extended, draw a \"Z\" shape in the air.", "Dedo índice extendido, dibuja una forma de \"Z\" en el aire."),
];

/// Number of alphabet letters used as the introductory lessons
const INTRO_LETTERS: usize = 5;

fn alphabet_lessons() -> Vec<Lesson> {
    ALPHABET_TABLE
        .iter()
        .map(|(id, en, es)| {
            let upper = id.to_ascii_uppercase();
            Lesson {
                id: id.to_string(),
                label: LocalizedText::new(format!("Letter {}", upper), format!("Letra {}", upper)),
                description: LocalizedText::new(*en, *es),
                image_url: Some(format!("/images/alphabet/{}.png", id)),
            }
        })
        .collect()
}

fn hello_lesson() -> Lesson {
    Lesson {
        id: "hello".to_string(),
        label: LocalizedText::new("Hello", "Hola"),
        description: LocalizedText::new(
            "Place hand at temple and move it away, like a salute.",
            "Coloca la mano en la sien y aléjala, como un saludo.",
        ),
        image_url: Some("/spainma.gif".to_string()),
    }
}

/// On-disk catalog layout (`[[lesson]]` tables)
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(rename = "lesson")]
    lessons: Vec<Lesson>,
}

/// Immutable ordered list of lessons.
///
/// Always non-empty with unique ids, so circular navigation is defined for
/// every index.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    lessons: Vec<Lesson>,
}

impl Catalog {
    /// Build a catalog, rejecting empty lists and duplicate ids
    pub fn new(lessons: Vec<Lesson>) -> crate::Result<Self> {
        if lessons.is_empty() {
            return Err(crate::Error::Catalog("catalog must contain at least one lesson".to_string()));
        }
        let mut seen = HashSet::new();
        for lesson in &lessons {
            if lesson.id.trim().is_empty() {
                return Err(crate::Error::Catalog("lesson id must not be empty".to_string()));
            }
            if !seen.insert(lesson.id.as_str()) {
                return Err(crate::Error::Catalog(format!("duplicate lesson id '{}'", lesson.id)));
            }
        }
        Ok(Self { lessons })
    }

    /// The full A-Z alphabet
    pub fn alphabet() -> Self {
        Self { lessons: alphabet_lessons() }
    }

    /// Introductory sequence: letters A-E, then "Hello"
    pub fn default_lessons() -> Self {
        let mut lessons: Vec<Lesson> = alphabet_lessons().into_iter().take(INTRO_LETTERS).collect();
        lessons.push(hello_lesson());
        Self { lessons }
    }

    /// Load a catalog from a TOML file of `[[lesson]]` tables
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&content).map_err(|e| crate::Error::Catalog(e.to_string()))?;
        Self::new(file.lessons)
    }

    /// Serialize into the on-disk TOML layout
    pub fn to_toml(&self) -> crate::Result<String> {
        let file = CatalogFile { lessons: self.lessons.clone() };
        toml::to_string_pretty(&file).map_err(|e| crate::Error::Catalog(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    /// Never true for a constructed catalog
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Lesson> {
        self.lessons.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter()
    }

    /// Find a lesson by id
    pub fn find(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    /// Lesson for a single spelled character.
    ///
    /// Characters without a matching lesson fall back to the first entry.
    pub fn lesson_for_char(&self, ch: char) -> &Lesson {
        let id: String = ch.to_lowercase().collect();
        self.find(&id).unwrap_or(&self.lessons[0])
    }

    /// Index after `index`, wrapping to the start
    pub fn next_index(&self, index: usize) -> usize {
        (index % self.len() + 1) % self.len()
    }

    /// Index before `index`, wrapping to the end
    pub fn prev_index(&self, index: usize) -> usize {
        let len = self.len();
        (index % len + len - 1) % len
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::default_lessons()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lessons_sequence() {
        let catalog = Catalog::default_lessons();
        let ids: Vec<&str> = catalog.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e", "hello"]);
        assert_eq!(catalog.get(5).unwrap().label.get(Language::Es), "Hola");
    }

    #[test]
    fn test_alphabet_has_every_letter() {
        let alphabet = Catalog::alphabet();
        assert_eq!(alphabet.len(), 26);
        assert_eq!(alphabet.find("z").unwrap().label.en, "Letter Z");
        assert_eq!(alphabet.find("m").unwrap().label.es, "Letra M");
    }

    #[test]
    fn test_lesson_for_char_is_case_insensitive() {
        let alphabet = Catalog::alphabet();
        assert_eq!(alphabet.lesson_for_char('Q').id, "q");
    }

    #[test]
    fn test_lesson_for_char_falls_back_to_first() {
        let alphabet = Catalog::alphabet();
        assert_eq!(alphabet.lesson_for_char(' ').id, "a");
        assert_eq!(alphabet.lesson_for_char('ñ').id, "a");
    }

    #[test]
    fn test_next_prev_round_trip_for_all_lengths() {
        for len in 1..=8 {
            let lessons: Vec<Lesson> = alphabet_lessons().into_iter().take(len).collect();
            let catalog = Catalog::new(lessons).unwrap();
            for i in 0..len {
                assert_eq!(catalog.prev_index(catalog.next_index(i)), i);
                assert_eq!(catalog.next_index(catalog.prev_index(i)), i);
            }
        }
    }

    #[test]
    fn test_navigation_wraps() {
        let catalog = Catalog::default_lessons();
        assert_eq!(catalog.next_index(5), 0);
        assert_eq!(catalog.prev_index(0), 5);
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(Catalog::new(Vec::new()).is_err());
    }

    #[test]
    fn test_new_rejects_duplicate_ids() {
        let mut lessons = alphabet_lessons();
        lessons.truncate(2);
        lessons.push(lessons[0].clone());
        let err = Catalog::new(lessons).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_toml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lessons.toml");
        let catalog = Catalog::default_lessons();
        std::fs::write(&path, catalog.to_toml().unwrap()).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_load_lesson_without_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lessons.toml");
        std::fs::write(
            &path,
            r#"
[[lesson]]
id = "thanks"
label = { en = "Thank you", es = "Gracias" }
description = { en = "Flat hand from chin outward.", es = "Mano plana desde la barbilla hacia afuera." }
"#,
        )
        .unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(0).unwrap().image_url.is_none());
    }
}
