//! Slot values: typed extraction from tagged utterance spans.

pub mod parsers;
pub mod registry;

pub use parsers::{DigitsParser, EntityParser, IntegerParser};
pub use registry::{ParserFactory, ParserRegistry};

use crate::metadata::SlotMeta;
use std::collections::HashMap;
use thiserror::Error;

/// Parse failures for a single raw slot value.
///
/// These are genuine faults. A raw value that simply is not a value of the
/// parser's type is not an error; parsers return `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid facets for slot type {slot_type}: {reason}")]
    InvalidFacets { slot_type: String, reason: String },

    #[error("Failed to parse value for {slot}: {reason}")]
    Failed { slot: String, reason: String },
}

/// A typed value produced by a slot parser.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    /// Free-form text, kept as captured
    Text(String),

    /// A parsed integer
    Integer(i64),
}

/// A named, typed value extracted from a tagged span of the utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Slot name from the tag label
    pub name: String,

    /// Declared type from the intent metadata
    pub slot_type: String,

    /// Raw substring of the utterance covering the tagged span
    pub raw_value: String,

    /// Parsed value; `None` when the raw text is not a value of this type
    pub value: Option<SlotValue>,
}

/// Converts raw slot strings into typed values.
///
/// One parser instance exists per slot *type*, shared read-only by every
/// classification after construction. Parsers may record auxiliary
/// key/values into the call's context map.
pub trait SlotParser: Send + Sync {
    /// Parse `raw_value` under the slot's declared metadata. `Ok(None)`
    /// means the raw text does not represent a valid value of this type;
    /// the slot keeps its raw value with an empty parsed value.
    fn parse(
        &self,
        metadata: &SlotMeta,
        raw_value: &str,
        context: &mut HashMap<String, String>,
    ) -> Result<Option<SlotValue>, ParseError>;
}
