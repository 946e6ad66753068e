//! Configuration Management

use crate::lesson::Language;
use crate::pipeline::compositor::{BlurSettings, DEFAULT_BLUR_AMOUNT, MAX_BLUR_AMOUNT};
use crate::pipeline::PerceptionOptions;
use crate::validator::transport::DEFAULT_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote validator settings
    #[serde(default)]
    pub validator: ValidatorConfig,
    /// Validation session timing
    #[serde(default)]
    pub session: SessionConfig,
    /// Frame pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Presentation settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Remote validator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Model to use
    pub model: String,
    /// REST endpoint base URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
    /// Temperature for generation
    pub temperature: f32,
}

/// Validation session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Validate automatically while hands are visible
    pub auto_validate: bool,
    /// Minimum time after a completed validation before auto-validating again (ms)
    pub cooldown_ms: u64,
    /// Auto-validate poll period (ms)
    pub poll_interval_ms: u64,
    /// Delay before moving to the next target after a correct attempt (ms)
    pub advance_delay_ms: u64,
}

/// Frame pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub blur_enabled: bool,
    /// Background blur radius in pixels (0-30)
    pub blur_amount: u32,
    /// Seconds to wait for the first frame before warning
    pub first_frame_timeout_secs: u64,
    /// JPEG quality of validation snapshots (1-100)
    pub snapshot_quality: u8,
    /// Requested camera resolution; frames are delivered at this size (0 keeps the source size)
    pub camera_width: u32,
    pub camera_height: u32,
    #[serde(default)]
    pub perception: PerceptionOptions,
}

/// Presentation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Language used when none was selected this session
    pub default_language: Language,
    /// Lesson catalog file; the built-in lessons are used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            api_key_env: "API_KEY".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            max_output_tokens: 1024,
            temperature: 0.2,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_validate: true,
            cooldown_ms: 3000,
            poll_interval_ms: 1000,
            advance_delay_ms: 2000,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            blur_enabled: true,
            blur_amount: DEFAULT_BLUR_AMOUNT,
            first_frame_timeout_secs: 15,
            snapshot_quality: 60,
            camera_width: 640,
            camera_height: 480,
            perception: PerceptionOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn blur_settings(&self) -> BlurSettings {
        BlurSettings {
            enabled: self.blur_enabled,
            amount: self.blur_amount,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.validator.model.trim().is_empty() {
            return Err(crate::Error::Config("model must not be empty".to_string()));
        }
        if self.validator.api_key_env.trim().is_empty() {
            return Err(crate::Error::Config("api_key_env must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.validator.temperature) {
            return Err(crate::Error::Config(format!(
                "temperature must be in [0, 2], got {}", self.validator.temperature
            )));
        }
        if self.validator.timeout_secs == 0 {
            return Err(crate::Error::Config("timeout_secs must be > 0".to_string()));
        }
        if self.validator.max_output_tokens == 0 {
            return Err(crate::Error::Config("max_output_tokens must be > 0".to_string()));
        }
        if self.session.poll_interval_ms == 0 {
            return Err(crate::Error::Config("poll_interval_ms must be > 0".to_string()));
        }
        if self.pipeline.blur_amount > MAX_BLUR_AMOUNT {
            return Err(crate::Error::Config(format!(
                "blur_amount must be in [0, {}], got {}", MAX_BLUR_AMOUNT, self.pipeline.blur_amount
            )));
        }
        if !(1..=100).contains(&self.pipeline.snapshot_quality) {
            return Err(crate::Error::Config(format!(
                "snapshot_quality must be in [1, 100], got {}", self.pipeline.snapshot_quality
            )));
        }
        if self.pipeline.first_frame_timeout_secs == 0 {
            return Err(crate::Error::Config("first_frame_timeout_secs must be > 0".to_string()));
        }
        let perception = &self.pipeline.perception;
        if perception.max_hands == 0 {
            return Err(crate::Error::Config("max_hands must be > 0".to_string()));
        }
        for (name, value) in [
            ("min_detection_confidence", perception.min_detection_confidence),
            ("min_tracking_confidence", perception.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::Error::Config(format!("{} must be in [0, 1], got {}", name, value)));
            }
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".signflow").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    fn to_table(&self) -> Result<toml::Table, crate::Error> {
        match toml::Value::try_from(self) {
            Ok(toml::Value::Table(table)) => Ok(table),
            Ok(_) => Err(crate::Error::Config("config did not serialize to a table".to_string())),
            Err(e) => Err(crate::Error::Config(e.to_string())),
        }
    }

    /// Look up a dotted key such as `session.cooldown_ms`
    pub fn get_value(&self, key: &str) -> Result<String, crate::Error> {
        let table = self.to_table()?;
        let mut current: &toml::Value = table
            .get(key.split('.').next().unwrap_or_default())
            .ok_or_else(|| unknown_key(key))?;
        for part in key.split('.').skip(1) {
            current = current.get(part).ok_or_else(|| unknown_key(key))?;
        }
        Ok(match current {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a dotted key, keeping the type of the existing value
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), crate::Error> {
        let mut table = self.to_table()?;
        let parts: Vec<&str> = key.split('.').collect();
        let (last, sections) = parts.split_last().ok_or_else(|| unknown_key(key))?;

        let mut current = &mut table;
        for section in sections {
            current = current
                .get_mut(*section)
                .and_then(toml::Value::as_table_mut)
                .ok_or_else(|| unknown_key(key))?;
        }
        let slot = current.get_mut(*last).ok_or_else(|| unknown_key(key))?;
        let parsed = parse_like(slot, value).ok_or_else(|| {
            crate::Error::Config(format!("invalid value '{}' for {} ({})", value, key, slot.type_str()))
        })?;
        *slot = parsed;

        let updated: Config = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| crate::Error::Config(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn unknown_key(key: &str) -> crate::Error {
    crate::Error::Config(format!("unknown config key '{}'", key))
}

fn parse_like(existing: &toml::Value, raw: &str) -> Option<toml::Value> {
    let raw = raw.trim();
    match existing {
        toml::Value::String(_) => Some(toml::Value::String(raw.to_string())),
        toml::Value::Integer(_) => raw.parse().ok().map(toml::Value::Integer),
        toml::Value::Float(_) => raw.parse().ok().map(toml::Value::Float),
        toml::Value::Boolean(_) => raw.parse().ok().map(toml::Value::Boolean),
        _ => None,
    }
}
