//! Tract inference backend.
//!
//! Pure Rust ONNX execution. Produces the smallest binary and has no
//! external dependencies, but is CPU-only.

use super::{InferenceModel, ModelError};
use std::path::Path;
use tract_onnx::prelude::*;

type RunnableOnnx = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Fixed-shape ONNX model executed by tract.
pub struct TractModel {
    plan: RunnableOnnx,
    max_tokens: usize,
    input: Vec<i64>,
    outputs: Vec<Vec<f32>>,
}

impl TractModel {
    /// Load and optimize an ONNX model with input shape `[1, max_tokens]`.
    pub fn load(path: &Path, max_tokens: usize) -> Result<Self, ModelError> {
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| ModelError::Load(format!("Failed to load ONNX model: {}", e)))?
            .with_input_fact(0, i64::fact([1, max_tokens]).into())
            .map_err(|e| ModelError::Load(format!("Failed to set input shape: {}", e)))?
            .into_optimized()
            .map_err(|e| ModelError::Load(format!("Failed to optimize model: {}", e)))?
            .into_runnable()
            .map_err(|e| ModelError::Load(format!("Failed to create runnable: {}", e)))?;

        Ok(Self {
            plan,
            max_tokens,
            input: vec![0; max_tokens],
            outputs: Vec::new(),
        })
    }
}

impl InferenceModel for TractModel {
    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn input(&mut self, _index: usize) -> &mut [i64] {
        &mut self.input
    }

    fn run(&mut self) -> Result<(), ModelError> {
        let tensor: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, self.max_tokens), self.input.clone())
                .map_err(|e| ModelError::Execution(format!("Failed to create tensor: {}", e)))?
                .into();

        let results = self
            .plan
            .run(tvec![tensor.into()])
            .map_err(|e| ModelError::Execution(format!("Inference failed: {}", e)))?;

        self.outputs = results
            .iter()
            .map(|output| {
                output
                    .to_array_view::<f32>()
                    .map(|view| view.iter().cloned().collect())
            })
            .collect::<TractResult<Vec<Vec<f32>>>>()
            .map_err(|e| ModelError::Execution(format!("Failed to extract output: {}", e)))?;
        Ok(())
    }

    fn output(&self, index: usize) -> &[f32] {
        self.outputs.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}
