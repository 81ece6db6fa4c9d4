//! Model metadata: intents, slot declarations, and BIO tag labels.
//!
//! Loaded once from a declarative JSON document and immutable afterwards.
//! The intent list and the tag-label list are ordered to match the model's
//! output tensors.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Length of the `b_`/`i_` prefix carried by non-`o` tag labels.
const TAG_PREFIX_LEN: usize = 2;

/// Metadata errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to read metadata file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid tag label: {0}")]
    InvalidTag(String),

    #[error("Metadata declares no intents")]
    NoIntents,
}

/// Static description of a classification model's outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Intents, ordered to match the intent posterior tensor
    pub intents: Vec<IntentMeta>,

    /// BIO tag labels, ordered to match the tag posterior tensor
    pub tags: Vec<String>,
}

impl Metadata {
    /// Load and validate metadata from a JSON file.
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate metadata from a JSON string.
    pub fn parse(content: &str) -> Result<Self, MetadataError> {
        let metadata: Metadata = serde_json::from_str(content)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Check the schema invariants: at least one intent, and every tag label
    /// either `o` or a `b_`/`i_`-prefixed slot name.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.intents.is_empty() {
            return Err(MetadataError::NoIntents);
        }
        for tag in &self.tags {
            if tag == "o" {
                continue;
            }
            if (!tag.starts_with("b_") && !tag.starts_with("i_")) || tag.len() <= TAG_PREFIX_LEN {
                return Err(MetadataError::InvalidTag(tag.clone()));
            }
        }
        Ok(())
    }
}

/// One intent with its declared slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentMeta {
    /// Intent name
    pub name: String,

    /// Slots this intent can capture
    #[serde(default)]
    pub slots: Vec<SlotMeta>,
}

impl IntentMeta {
    /// The declaration for a slot name, if this intent declares it.
    pub fn slot(&self, name: &str) -> Option<&SlotMeta> {
        self.slots.iter().find(|s| s.name == name)
    }
}

/// A slot declaration: name, value type, and optional parser facets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotMeta {
    /// Slot name as it appears in tag labels
    pub name: String,

    /// Value type resolved through the parser registry
    #[serde(rename = "type")]
    pub slot_type: String,

    /// Parser-specific constraints (e.g. `{"min": 1, "max": 10}`)
    #[serde(default)]
    pub facets: Option<serde_json::Value>,
}

/// The slot name encoded in a `b_`/`i_` tag label.
pub fn tag_slot_name(tag: &str) -> &str {
    tag.get(TAG_PREFIX_LEN..).unwrap_or("")
}
