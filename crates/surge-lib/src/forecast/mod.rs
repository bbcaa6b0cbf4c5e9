//! Surge forecasting pipeline
//!
//! Feature windowing, the predictor boundary, risk classification and
//! the resource ratios applied to a prediction.

mod inference;
mod resources;
mod risk;
mod window;

pub use inference::{FixedPredictor, InferenceStats, ModelFamily, OnnxSurgePredictor};
pub use resources::{recommend_resources, ResourceRatios};
pub use risk::{classify_risk, RiskCategory, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD};
pub use window::{
    FeatureRow, FeatureWindow, FeatureWindower, DEFAULT_AQI, DEFAULT_AVG_AGE,
    DEFAULT_HUMIDITY_PCT, DEFAULT_TEMPERATURE_C, FEATURE_DIM, WINDOW_LEN,
};

use crate::error::PredictorError;
use serde::{Deserialize, Serialize};

/// Confidence assumed when the predictor does not report one
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Opaque surge model: consumes a (1, W, D) block, reports arrivals.
pub trait SurgePredictor: Send + Sync {
    fn predict(&self, window: &FeatureWindow) -> Result<PredictorOutput, PredictorError>;

    fn model_version(&self) -> String;

    fn is_loaded(&self) -> bool {
        true
    }

    /// Inference counters, for predictors that keep them
    fn stats(&self) -> Option<InferenceStats> {
        None
    }
}

/// Raw predictor response, one value per batch item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorOutput {
    pub predictions: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Vec<f64>>,
}

/// Validated prediction for the single batch item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub predicted_arrivals: f64,
    pub confidence: f64,
}

impl PredictorOutput {
    /// Extract batch item 0.
    ///
    /// Negative arrivals are clamped to zero and confidence to [0, 1];
    /// missing or non-finite values are malformed output.
    pub fn first(&self) -> Result<Prediction, PredictorError> {
        let raw = *self
            .predictions
            .first()
            .ok_or_else(|| PredictorError::MalformedOutput("empty predictions".to_string()))?;
        if !raw.is_finite() {
            return Err(PredictorError::MalformedOutput(format!(
                "non-finite prediction {}",
                raw
            )));
        }

        let confidence = match &self.confidence {
            None => DEFAULT_CONFIDENCE,
            Some(values) => {
                let c = *values.first().ok_or_else(|| {
                    PredictorError::MalformedOutput("empty confidence".to_string())
                })?;
                if !c.is_finite() {
                    return Err(PredictorError::MalformedOutput(format!(
                        "non-finite confidence {}",
                        c
                    )));
                }
                c.clamp(0.0, 1.0)
            }
        };

        Ok(Prediction {
            predicted_arrivals: raw.max(0.0),
            confidence,
        })
    }
}
