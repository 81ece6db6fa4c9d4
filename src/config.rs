//! Engine configuration.
//!
//! Recognized construction options: resource paths, model token capacity,
//! worker count, and slot-type to parser-name bindings. A config can be
//! built programmatically or loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Engine construction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluConfig {
    /// Path to the inference model file
    #[serde(default)]
    pub model_path: String,

    /// Path to the metadata JSON document
    #[serde(default)]
    pub metadata_path: String,

    /// Path to the newline-delimited wordpiece vocabulary
    #[serde(default)]
    pub vocab_path: String,

    /// Maximum encoded tokens per utterance; utterances beyond this fail
    /// before inference
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Number of classification worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Slot-type name to parser-name bindings; unbound types resolve to the
    /// built-in parser of the same name
    #[serde(default)]
    pub slot_parsers: HashMap<String, String>,
}

fn default_max_tokens() -> usize {
    128
}

fn default_workers() -> usize {
    1
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            metadata_path: String::new(),
            vocab_path: String::new(),
            max_tokens: default_max_tokens(),
            workers: default_workers(),
            slot_parsers: HashMap::new(),
        }
    }
}

impl NluConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: NluConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
