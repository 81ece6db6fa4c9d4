//! Slotwise - Intent and Slot Classification Engine
//!
//! Turns raw user utterances into a structured intent plus named slot
//! values, using a pre-trained numeric model with fixed input/output tensor
//! shapes as its only black box.
//!
//! # Architecture
//!
//! ```text
//! utterance ──► WordpieceEncoder ──► token ids + word alignment
//!                                            │
//!                                            ▼
//!                              InferenceModel (one forward pass)
//!                                            │
//!                         ┌──────────────────┴─────────────────┐
//!                         ▼                                    ▼
//!                 intent posteriors                     tag posteriors
//!                         │                                    │
//!                         ▼                                    ▼
//!                   decode_intent                    decode_slots (BIO)
//!                         │                                    │
//!                         └──────────────┬─────────────────────┘
//!                                        ▼
//!                        ParserRegistry (raw → typed values)
//!                                        ▼
//!                              ClassificationResult
//! ```
//!
//! # Behavior
//!
//! - **Background loading**: vocabulary, metadata, and model load on
//!   dedicated threads at construction. Classification calls issued before
//!   readiness block on a one-shot latch, never a polling loop.
//! - **Errors as data**: [`NluEngine::classify`] never raises; every
//!   failure is captured in the result's error field.
//! - **Degraded operation**: a failed resource load leaves the engine up
//!   and is reported per classification call.
//! - **Serialized inference**: model buffers admit one forward pass at a
//!   time; encoding and slot parsing run outside the critical section.
//!
//! # Example
//!
//! ```rust,no_run
//! use slotwise::{NluConfig, NluEngine};
//!
//! let config = NluConfig {
//!     model_path: "nlu.onnx".into(),
//!     metadata_path: "nlu.json".into(),
//!     vocab_path: "vocab.txt".into(),
//!     ..NluConfig::default()
//! };
//! let engine = NluEngine::builder().config(config).build();
//! let result = engine.classify("set a timer for ten minutes").wait();
//! if let Some(intent) = &result.intent {
//!     println!("{} ({:.2})", intent, result.confidence);
//! }
//! ```

pub mod config;
pub mod context;
pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod metadata;
pub mod model;
pub mod result;
pub mod slots;
pub mod sync;

pub use config::{ConfigError, NluConfig};
pub use context::{NluContext, TraceLevel, TraceListener};
pub use encoder::{EncodeError, EncodedTokens, TextEncoder, WordpieceEncoder};
pub use engine::{ClassificationHandle, NluEngine, NluEngineBuilder};
pub use metadata::{IntentMeta, Metadata, MetadataError, SlotMeta};
pub use model::{InferenceModel, ModelError, INTENT_OUTPUT, TAG_OUTPUT};
pub use result::{ClassificationResult, NluError};
pub use slots::{
    DigitsParser, EntityParser, IntegerParser, ParseError, ParserFactory, ParserRegistry, Slot,
    SlotParser, SlotValue,
};
