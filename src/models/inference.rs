//! Inference engine wrapping the boosted-tree classifier.

use crate::config::AppConfig;
use crate::features::FEATURE_SCHEMA;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::report::CONDITIONS;
use anyhow::{Context, Result};
use std::sync::RwLock;
use tracing::{debug, info};

/// Seam between the request pipeline and the model runtime.
///
/// Tests substitute a stub implementation to drive the endpoint without a
/// model file on disk.
pub trait Predictor: Send + Sync {
    /// Map a feature vector to one probability per condition class.
    fn predict(&self, features: &[f32]) -> Result<Vec<f32>>;
}

/// ONNX-backed classifier handle, loaded once and shared across requests.
pub struct InferenceEngine {
    /// Loaded model (session.run needs &mut, so calls serialize on the lock)
    model: RwLock<LoadedModel>,
}

impl InferenceEngine {
    /// Load the model named in the configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::from_model_file(&config.model.path, config.model.onnx_threads)
    }

    /// Load a model from a specific file and verify its output arity.
    pub fn from_model_file(path: &str, onnx_threads: usize) -> Result<Self> {
        let loader = ModelLoader::with_threads(onnx_threads)?;
        let model = loader.load_model(path)?;
        let engine = Self {
            model: RwLock::new(model),
        };

        // Probe with an all-zero panel so a model trained for a different
        // class count fails at startup instead of on the first live request.
        let probe = engine
            .run_model(&[0.0; FEATURE_SCHEMA.len()])
            .context("model failed startup probe")?;
        anyhow::ensure!(
            probe.len() == CONDITIONS.len(),
            "model produces {} classes, condition table has {}",
            probe.len(),
            CONDITIONS.len()
        );
        info!(classes = probe.len(), "Model output cardinality verified");

        Ok(engine)
    }

    /// Run the session on a single feature vector.
    fn run_model(&self, features: &[f32]) -> Result<Vec<f32>> {
        use ort::value::Tensor;

        let mut model = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let input_name = model.input_name.clone();
        let output_name = model.output_name.clone();

        let outputs = model.session.run(ort::inputs![&input_name => input_tensor])?;

        extract_probability_row(&outputs, &output_name)
    }
}

impl Predictor for InferenceEngine {
    fn predict(&self, features: &[f32]) -> Result<Vec<f32>> {
        let probabilities = self.run_model(features)?;
        debug!(raw = ?probabilities, "Raw prediction");
        Ok(probabilities)
    }
}

/// Pull the probability row out of the session outputs.
///
/// Handles the tensor layouts boosted-tree exports produce: a [1, n] batch
/// or a flat [n] vector.
fn extract_probability_row(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
) -> Result<Vec<f32>> {
    if let Some(output) = outputs.get(output_name) {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Ok(row_from_tensor(&dims, data));
        }
    }

    // Fallback: first float tensor that is not the class label output
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            debug!(output = %name, "Extracted probabilities from fallback output");
            return Ok(row_from_tensor(&dims, data));
        }
    }

    anyhow::bail!("no float tensor output named {:?} in model outputs", output_name)
}

/// Recover the single-row probability vector from tensor data.
fn row_from_tensor(dims: &[i64], data: &[f32]) -> Vec<f32> {
    match dims {
        [1, n] => data[..*n as usize].to_vec(),
        _ => data.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_from_batched_tensor() {
        let data = [0.1, 0.2, 0.3, 0.1, 0.2, 0.1];
        let row = row_from_tensor(&[1, 6], &data);
        assert_eq!(row, data.to_vec());
    }

    #[test]
    fn test_row_from_flat_tensor() {
        let data = [0.4, 0.6];
        let row = row_from_tensor(&[2], &data);
        assert_eq!(row, vec![0.4, 0.6]);
    }
}
