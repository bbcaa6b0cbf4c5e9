//! ONNX inference for the surge model using tract
//!
//! Loads the serialized model artifact and runs it against feature windows.
//! There is no heuristic fallback: a predictor without a model reports
//! `NotLoaded` so callers never act on a guessed prediction.

use super::{FeatureWindow, PredictorOutput, SurgePredictor, FEATURE_DIM, WINDOW_LEN};
use crate::error::PredictorError;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tract_onnx::prelude::*;
use tracing::{debug, info, warn};

/// Inference latency above which a warning is logged
const SLOW_INFERENCE: Duration = Duration::from_millis(50);

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Input layout expected by the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Recurrent/sequence models, input (1, W, D)
    #[default]
    Sequence,
    /// Tabular regressors, input flattened to (1, W * D)
    Tabular,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Sequence => "sequence",
            ModelFamily::Tabular => "tabular",
        }
    }

    fn input_shape(&self) -> Vec<usize> {
        match self {
            ModelFamily::Sequence => vec![1, WINDOW_LEN, FEATURE_DIM],
            ModelFamily::Tabular => vec![1, WINDOW_LEN * FEATURE_DIM],
        }
    }
}

/// Surge predictor backed by an ONNX artifact
pub struct OnnxSurgePredictor {
    model: Option<TractModel>,
    family: ModelFamily,
    model_version: RwLock<String>,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl OnnxSurgePredictor {
    /// A predictor with no artifact; every prediction fails with `NotLoaded`
    pub fn new_without_model() -> Self {
        Self {
            model: None,
            family: ModelFamily::default(),
            model_version: RwLock::new("unloaded".to_string()),
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        }
    }

    pub fn from_bytes(
        model_bytes: &[u8],
        family: ModelFamily,
        version: impl Into<String>,
    ) -> Result<Self, PredictorError> {
        let model = Self::load_model(model_bytes, family)?;
        Ok(Self {
            model: Some(model),
            family,
            model_version: RwLock::new(version.into()),
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        })
    }

    /// Load an artifact from disk, verifying its SHA-256 when one is given
    pub fn from_path(
        path: &Path,
        expected_sha256: Option<&str>,
        family: ModelFamily,
        version: impl Into<String>,
    ) -> Result<Self, PredictorError> {
        let bytes = std::fs::read(path)
            .map_err(|e| PredictorError::Load(format!("{}: {}", path.display(), e)))?;

        if let Some(expected) = expected_sha256 {
            let actual = compute_checksum(&bytes);
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                return Err(PredictorError::Checksum {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        let predictor = Self::from_bytes(&bytes, family, version)?;
        info!(
            path = %path.display(),
            family = ?family,
            size_bytes = bytes.len(),
            "Surge model loaded"
        );
        Ok(predictor)
    }

    fn load_model(model_bytes: &[u8], family: ModelFamily) -> Result<TractModel, PredictorError> {
        tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .and_then(|model| {
                model.with_input_fact(0, f32::fact(family.input_shape()).into())
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| PredictorError::Load(format!("{:#}", e)))
    }

    fn window_to_tensor(&self, window: &FeatureWindow) -> Result<Tensor, PredictorError> {
        let data = window.to_flat();
        let tensor = match self.family {
            ModelFamily::Sequence => {
                tract_ndarray::Array3::from_shape_vec((1, WINDOW_LEN, FEATURE_DIM), data)
                    .map(Tensor::from)
            }
            ModelFamily::Tabular => {
                tract_ndarray::Array2::from_shape_vec((1, WINDOW_LEN * FEATURE_DIM), data)
                    .map(Tensor::from)
            }
        };
        tensor.map_err(|e| PredictorError::Inference(e.to_string()))
    }

    fn tensor_values(tensor: &Tensor) -> Result<Vec<f64>, PredictorError> {
        let view = tensor
            .to_array_view::<f32>()
            .map_err(|e| PredictorError::MalformedOutput(format!("{:#}", e)))?;
        Ok(view.iter().map(|v| *v as f64).collect())
    }
}

impl SurgePredictor for OnnxSurgePredictor {
    fn predict(&self, window: &FeatureWindow) -> Result<PredictorOutput, PredictorError> {
        let model = self.model.as_ref().ok_or(PredictorError::NotLoaded)?;
        let start = Instant::now();

        let input = self.window_to_tensor(window)?;
        let outputs = model
            .run(tvec!(input.into()))
            .map_err(|e| PredictorError::Inference(format!("{:#}", e)))?;

        let predictions = outputs
            .first()
            .ok_or_else(|| PredictorError::MalformedOutput("model produced no outputs".to_string()))
            .and_then(|t| Self::tensor_values(t))?;
        let confidence = match outputs.get(1) {
            Some(t) => Some(Self::tensor_values(t)?),
            None => None,
        };

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed > SLOW_INFERENCE {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Inference exceeded {}ms target",
                SLOW_INFERENCE.as_millis()
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros() as u64, "Inference completed");
        }

        Ok(PredictorOutput {
            predictions,
            confidence,
        })
    }

    fn model_version(&self) -> String {
        self.model_version
            .read()
            .map(|v| v.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    fn stats(&self) -> Option<InferenceStats> {
        Some(InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        })
    }
}

/// Inference statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

/// Deterministic predictor returning a configured value.
///
/// Useful for dry runs and tests; an optional delay simulates a slow model.
#[derive(Debug, Clone)]
pub struct FixedPredictor {
    predicted_arrivals: f64,
    confidence: Option<f64>,
    version: String,
    delay: Option<Duration>,
}

impl FixedPredictor {
    pub fn new(predicted_arrivals: f64, confidence: f64) -> Self {
        Self {
            predicted_arrivals,
            confidence: Some(confidence),
            version: "fixed".to_string(),
            delay: None,
        }
    }

    /// Report no confidence, leaving the default to the call site
    pub fn without_confidence(predicted_arrivals: f64) -> Self {
        Self {
            confidence: None,
            ..Self::new(predicted_arrivals, 0.0)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl SurgePredictor for FixedPredictor {
    fn predict(&self, _window: &FeatureWindow) -> Result<PredictorOutput, PredictorError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(PredictorOutput {
            predictions: vec![self.predicted_arrivals],
            confidence: self.confidence.map(|c| vec![c]),
        })
    }

    fn model_version(&self) -> String {
        self.version.clone()
    }
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
