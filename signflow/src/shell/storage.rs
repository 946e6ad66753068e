//! Session-scoped key/value storage

use crate::lesson::Language;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Storage key for the selected language
pub const LANGUAGE_KEY: &str = "signflow_lang";

/// Values kept for the lifetime of the process, never written to disk.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct SessionStorage {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.values.write().insert(key.to_string(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }

    /// Stored language; unknown codes are ignored
    pub fn language(&self) -> Option<Language> {
        self.get(LANGUAGE_KEY).as_deref().and_then(Language::from_code)
    }

    pub fn set_language(&self, language: Language) {
        self.set(LANGUAGE_KEY, language.code());
    }
}
