//! Classification results and the error taxonomy.

use crate::slots::Slot;
use std::collections::HashMap;
use thiserror::Error;

/// Errors surfaced inside a [`ClassificationResult`].
///
/// Classification never raises: every failure reachable during a call is
/// captured as data in the result's error field, letting callers tell "no
/// match" apart from an operational failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NluError {
    /// A required resource (vocabulary, metadata, model) failed to load
    #[error("Resource loading failed: {0}")]
    Load(String),

    /// The encoder reported a failure while tokenizing the utterance
    #[error("Utterance encoding failed: {0}")]
    Encoding(String),

    /// The encoded utterance exceeds the model's token capacity
    #[error("Utterance produced {count} tokens; model capacity is {max}")]
    LengthLimit { count: usize, max: usize },

    /// The forward pass failed or produced malformed output
    #[error("Inference failed: {0}")]
    Inference(String),

    /// A named slot parser is unavailable or failed to construct
    #[error("Slot parser unavailable: {0}")]
    ParserResolution(String),

    /// A slot parser rejected a raw value outright
    #[error("Slot value rejected: {0}")]
    Parse(String),
}

/// The outcome of classifying a single utterance.
///
/// Constructed once per call and immutable afterwards. On error the intent
/// is absent, the confidence is zero, and the slot and context maps are
/// empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// The utterance exactly as submitted
    pub utterance: String,

    /// Chosen intent name; `None` on error
    pub intent: Option<String>,

    /// Raw arg-max posterior of the chosen intent; 0.0 on error
    pub confidence: f32,

    /// Decoded slots by name
    pub slots: HashMap<String, Slot>,

    /// Auxiliary values recorded by slot parsers
    pub context: HashMap<String, String>,

    /// Operational failure, if any
    pub error: Option<NluError>,
}

impl ClassificationResult {
    /// An error outcome: no intent, zero confidence, empty maps.
    pub fn error(utterance: impl Into<String>, error: NluError) -> Self {
        Self {
            utterance: utterance.into(),
            intent: None,
            confidence: 0.0,
            slots: HashMap::new(),
            context: HashMap::new(),
            error: Some(error),
        }
    }

    /// True when classification completed without an operational failure.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_result_is_empty() {
        let result = ClassificationResult::error(
            "turn it up",
            NluError::LengthLimit { count: 9, max: 4 },
        );
        assert_eq!(result.utterance, "turn it up");
        assert!(result.intent.is_none());
        assert_eq!(result.confidence, 0.0);
        assert!(result.slots.is_empty());
        assert!(result.context.is_empty());
        assert!(!result.is_ok());
    }

    #[test]
    fn test_error_messages() {
        let err = NluError::LengthLimit { count: 130, max: 128 };
        assert_eq!(
            err.to_string(),
            "Utterance produced 130 tokens; model capacity is 128"
        );
    }
}
