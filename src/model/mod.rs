//! Inference model abstraction.
//!
//! The model is an opaque function from fixed-shape numeric input to
//! fixed-shape numeric output: write token ids into an input buffer, run one
//! forward pass, read the output buffers immediately after. Implementations
//! are not required to tolerate concurrent forward passes; the engine
//! serializes `run` calls behind a mutex.
//!
//! Backends live behind cargo features, mirroring what is compiled in:
//!
//! - **ort** (ONNX Runtime): fastest, GPU support (`--features ort-backend`)
//! - **tract**: pure Rust, smallest binary, CPU-only (`--features tract`)

#[cfg(feature = "ort-backend")]
pub mod ort;

#[cfg(feature = "tract")]
pub mod tract;

use std::path::Path;
use thiserror::Error;

/// Index of the intent posterior output buffer.
pub const INTENT_OUTPUT: usize = 0;

/// Index of the flattened per-token tag posterior output buffer.
pub const TAG_OUTPUT: usize = 1;

/// Errors from inference backends.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Model execution failed: {0}")]
    Execution(String),

    #[error("No inference backend compiled in; rebuild with --features tract or --features ort-backend")]
    NoBackendAvailable,
}

/// One opaque pre-trained model with fixed-capacity numeric buffers.
pub trait InferenceModel: Send {
    /// Maximum number of token ids accepted per forward pass.
    fn max_tokens(&self) -> usize;

    /// Fixed-capacity input buffer `index`. The engine writes token ids at
    /// the front and zero-pads the remainder before each run.
    fn input(&mut self, index: usize) -> &mut [i64];

    /// Execute one synchronous forward pass over the current input buffers.
    fn run(&mut self) -> Result<(), ModelError>;

    /// Output buffer `index`, valid immediately after [`run`](Self::run).
    /// Unknown indices yield an empty slice.
    fn output(&self, index: usize) -> &[f32];
}

/// Load a model with the first compiled-in backend, preferring ort over
/// tract. With no backend compiled in this fails, degrading the engine
/// rather than aborting construction.
pub fn load_model(path: &Path, max_tokens: usize) -> Result<Box<dyn InferenceModel>, ModelError> {
    if !path.exists() {
        return Err(ModelError::NotFound(path.display().to_string()));
    }

    #[cfg(feature = "ort-backend")]
    return Ok(Box::new(ort::OrtModel::load(path, max_tokens)?));

    #[cfg(all(not(feature = "ort-backend"), feature = "tract"))]
    return Ok(Box::new(tract::TractModel::load(path, max_tokens)?));

    #[cfg(all(not(feature = "ort-backend"), not(feature = "tract")))]
    {
        let _ = max_tokens;
        Err(ModelError::NoBackendAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_path() {
        let err = match load_model(Path::new("/nonexistent/model.onnx"), 8) {
            Ok(_) => panic!("expected load_model to fail for a nonexistent path"),
            Err(e) => e,
        };
        assert!(matches!(err, ModelError::NotFound(_)));
    }
}
