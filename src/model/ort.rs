//! ONNX Runtime inference backend.
//!
//! The fastest option, with GPU support via CUDA/TensorRT/CoreML execution
//! providers configured at the ort level.

use super::{InferenceModel, ModelError};
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// Fixed-shape ONNX model executed by ONNX Runtime.
pub struct OrtModel {
    session: Session,
    max_tokens: usize,
    input: Vec<i64>,
    outputs: Vec<Vec<f32>>,
}

impl OrtModel {
    /// Load an ONNX model expecting input shape `[1, max_tokens]`.
    pub fn load(path: &Path, max_tokens: usize) -> Result<Self, ModelError> {
        let session = Session::builder()
            .map_err(|e| ModelError::Load(format!("Session builder error: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| ModelError::Load(format!("Failed to load model: {}", e)))?;

        Ok(Self {
            session,
            max_tokens,
            input: vec![0; max_tokens],
            outputs: Vec::new(),
        })
    }
}

impl InferenceModel for OrtModel {
    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn input(&mut self, _index: usize) -> &mut [i64] {
        &mut self.input
    }

    fn run(&mut self) -> Result<(), ModelError> {
        let shape = [1_usize, self.max_tokens];
        let tensor = Tensor::from_array((&shape[..], self.input.clone()))
            .map_err(|e| ModelError::Execution(format!("Tensor creation error: {}", e)))?;

        let results = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| ModelError::Execution(format!("Run error: {}", e)))?;

        let mut outputs = Vec::with_capacity(results.len());
        for index in 0..results.len() {
            let value = &results[index];
            let tensor = value
                .downcast_ref::<ort::value::DynTensorValueType>()
                .map_err(|e| ModelError::Execution(format!("Downcast error: {}", e)))?;
            let (_, data) = tensor
                .try_extract_tensor::<f32>()
                .map_err(|e| ModelError::Execution(format!("Extract error: {}", e)))?;
            outputs.push(data.to_vec());
        }
        self.outputs = outputs;
        Ok(())
    }

    fn output(&self, index: usize) -> &[f32] {
        self.outputs.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}
