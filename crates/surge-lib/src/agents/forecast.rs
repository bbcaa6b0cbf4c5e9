//! Forecast agent: window, predict, classify, recommend

use super::object;
use crate::error::{PredictorError, Result, SurgeError};
use crate::forecast::{
    classify_risk, FeatureWindow, FeatureWindower, Prediction, ResourceRatios, SurgePredictor,
    WINDOW_LEN,
};
use crate::models::{
    AgentAction, AgentKind, ForecastResult, HospitalProfile, Observation, StaffingRecommendation,
    SupplyRecommendation,
};
use crate::observability::SurgeMetrics;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Forecast horizon used when the caller does not pick one
pub const DEFAULT_HORIZON_HOURS: u32 = 24;

/// Upper bound on a single predictor call
pub const DEFAULT_PREDICTOR_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything the forecast agent produced for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutcome {
    pub result: ForecastResult,
    pub staffing: StaffingRecommendation,
    pub supplies: SupplyRecommendation,
    pub action: AgentAction,
}

/// Wraps the windower, the injected predictor and the risk classifier
#[derive(Clone)]
pub struct ForecastAgent {
    predictor: Arc<dyn SurgePredictor>,
    windower: FeatureWindower,
    ratios: ResourceRatios,
    timeout: Duration,
    metrics: Option<SurgeMetrics>,
}

impl ForecastAgent {
    pub fn new(predictor: Arc<dyn SurgePredictor>) -> Self {
        Self {
            predictor,
            windower: FeatureWindower::new(),
            ratios: ResourceRatios::default(),
            timeout: DEFAULT_PREDICTOR_TIMEOUT,
            metrics: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_ratios(mut self, ratios: ResourceRatios) -> Self {
        self.ratios = ratios;
        self
    }

    /// Report predictor latency to the process metrics
    pub fn with_metrics(mut self, metrics: SurgeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn predictor(&self) -> &Arc<dyn SurgePredictor> {
        &self.predictor
    }

    /// Direct forecast request
    pub async fn forecast(
        &self,
        profile: &HospitalProfile,
        observations: &[Observation],
        horizon_hours: u32,
    ) -> Result<ForecastResult> {
        Ok(self.run(profile, observations, horizon_hours).await?.result)
    }

    pub async fn process(
        &self,
        profile: &HospitalProfile,
        observations: &[Observation],
        horizon_hours: u32,
    ) -> Result<AgentAction> {
        Ok(self.run(profile, observations, horizon_hours).await?.action)
    }

    pub async fn run(
        &self,
        profile: &HospitalProfile,
        observations: &[Observation],
        horizon_hours: u32,
    ) -> Result<ForecastOutcome> {
        if horizon_hours == 0 {
            return Err(SurgeError::InvalidRequest(
                "horizon_hours must be positive".to_string(),
            ));
        }

        let window = self.windower.build(profile, observations);
        let real_rows = window.real_rows();
        let prediction = self.predict(window).await?;

        let risk_category = classify_risk(prediction.predicted_arrivals);
        let (staffing, supplies) = self.ratios.recommend(prediction.predicted_arrivals);

        let result = ForecastResult {
            predicted_arrivals: prediction.predicted_arrivals,
            confidence: prediction.confidence,
            risk_category,
            horizon_hours,
            model_version: self.predictor.model_version(),
        };

        let mut reasoning_trace = vec![
            format!(
                "Predicted {:.1} arrivals in next {}h",
                result.predicted_arrivals, horizon_hours
            ),
            format!("Risk category: {}", risk_category),
            "Based on historical patterns and current capacity".to_string(),
        ];
        if real_rows < WINDOW_LEN {
            reasoning_trace.push(format!(
                "Only {} of {} history slots had observations; the rest were zero-padded",
                real_rows, WINDOW_LEN
            ));
        }

        let action = AgentAction {
            agent_type: AgentKind::Forecast,
            action: object(json!({
                "predicted_arrivals": result.predicted_arrivals,
                "risk_category": risk_category,
                "recommended_staffing": staffing,
                "recommended_supplies": supplies,
            })),
            reasoning_trace,
            confidence: result.confidence,
        };

        Ok(ForecastOutcome {
            result,
            staffing,
            supplies,
            action,
        })
    }

    /// Run the predictor off the async runtime, bounded by the timeout.
    /// Fails fast; there is no retry.
    ///
    /// A blocking task cannot be cancelled. On timeout the caller is
    /// released immediately, but a predictor that never returns keeps its
    /// blocking-pool thread until it does.
    async fn predict(&self, window: FeatureWindow) -> Result<Prediction> {
        let predictor = Arc::clone(&self.predictor);
        let start = Instant::now();
        let task = tokio::task::spawn_blocking(move || predictor.predict(&window));

        let output = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => Err(PredictorError::Timeout(self.timeout)),
            Ok(Err(join_error)) => Err(PredictorError::Inference(format!(
                "predictor task failed: {}",
                join_error
            ))),
            Ok(Ok(output)) => output,
        }?;

        let elapsed = start.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.observe_predictor_latency(elapsed.as_secs_f64());
        }
        debug!(elapsed_us = elapsed.as_micros() as u64, "Surge predictor returned");
        Ok(output.first()?)
    }
}
