//! Observability for the surge planner
//!
//! Prometheus metrics registered once per process, plus a structured
//! logger that emits one JSON event per forecast and action plan.

use crate::error::SurgeError;
use crate::forecast::InferenceStats;
use crate::models::{ActionPlan, ForecastResult};
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Latency buckets in seconds
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

static GLOBAL_METRICS: OnceLock<SurgeMetricsInner> = OnceLock::new();

struct SurgeMetricsInner {
    forecast_latency_seconds: Histogram,
    predictor_latency_seconds: Histogram,
    orchestration_latency_seconds: Histogram,
    forecasts_generated: IntCounter,
    action_plans_generated: IntCounter,
    errors: IntCounterVec,
    risk_category: GaugeVec,
    model_version_info: GaugeVec,
    predictor_inferences: IntGauge,
    predictor_slow_inferences: IntGauge,
}

impl SurgeMetricsInner {
    // metric names are constants, so registration can only fail on a
    // duplicate name, which OnceLock rules out
    fn new() -> Self {
        Self {
            forecast_latency_seconds: register_histogram!(
                "surge_forecast_latency_seconds",
                "Time spent producing a standalone surge forecast",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register forecast_latency_seconds"),

            predictor_latency_seconds: register_histogram!(
                "surge_predictor_latency_seconds",
                "Time spent inside the surge predictor",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register predictor_latency_seconds"),

            orchestration_latency_seconds: register_histogram!(
                "surge_orchestration_latency_seconds",
                "Time spent assembling an action plan",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register orchestration_latency_seconds"),

            forecasts_generated: register_int_counter!(
                "surge_forecasts_generated_total",
                "Total number of surge forecasts generated"
            )
            .expect("Failed to register forecasts_generated_total"),

            action_plans_generated: register_int_counter!(
                "surge_action_plans_generated_total",
                "Total number of action plans generated"
            )
            .expect("Failed to register action_plans_generated_total"),

            errors: register_int_counter_vec!(
                "surge_errors_total",
                "Total number of failed requests by component",
                &["component"]
            )
            .expect("Failed to register errors_total"),

            risk_category: register_gauge_vec!(
                "surge_risk_category",
                "Latest forecast risk category per hospital (0 low, 1 medium, 2 high)",
                &["hospital_id"]
            )
            .expect("Failed to register risk_category"),

            model_version_info: register_gauge_vec!(
                "surge_model_version_info",
                "Information about the currently loaded surge model",
                &["version", "family"]
            )
            .expect("Failed to register model_version_info"),

            predictor_inferences: register_int_gauge!(
                "surge_predictor_inferences",
                "Inferences run by the loaded surge model"
            )
            .expect("Failed to register predictor_inferences"),

            predictor_slow_inferences: register_int_gauge!(
                "surge_predictor_slow_inferences",
                "Inferences that exceeded the latency target"
            )
            .expect("Failed to register predictor_slow_inferences"),
        }
    }
}

/// Handle to the process-wide surge metrics.
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct SurgeMetrics {
    inner: &'static SurgeMetricsInner,
}

impl Default for SurgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SurgeMetrics {
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(SurgeMetricsInner::new),
        }
    }

    pub fn observe_forecast_latency(&self, duration_secs: f64) {
        self.inner.forecast_latency_seconds.observe(duration_secs);
    }

    pub fn observe_predictor_latency(&self, duration_secs: f64) {
        self.inner.predictor_latency_seconds.observe(duration_secs);
    }

    pub fn observe_orchestration_latency(&self, duration_secs: f64) {
        self.inner.orchestration_latency_seconds.observe(duration_secs);
    }

    /// Count a forecast and publish its risk category for the hospital
    pub fn record_forecast(&self, hospital_id: &str, result: &ForecastResult) {
        self.inner.forecasts_generated.inc();
        self.inner
            .risk_category
            .with_label_values(&[hospital_id])
            .set(result.risk_category.level() as f64);
    }

    pub fn inc_action_plans(&self) {
        self.inner.action_plans_generated.inc();
    }

    pub fn inc_errors(&self, component: &str) {
        self.inner.errors.with_label_values(&[component]).inc();
    }

    pub fn set_model_version(&self, version: &str, family: &str) {
        self.inner.model_version_info.reset();
        self.inner
            .model_version_info
            .with_label_values(&[version, family])
            .set(1.0);
    }

    /// Publish the predictor's own counters, read at scrape time
    pub fn set_inference_stats(&self, stats: &InferenceStats) {
        self.inner
            .predictor_inferences
            .set(stats.total_inferences as i64);
        self.inner
            .predictor_slow_inferences
            .set(stats.slow_inferences as i64);
    }

    pub fn predictor_inferences(&self) -> u64 {
        self.inner.predictor_inferences.get() as u64
    }

    pub fn forecasts_generated(&self) -> u64 {
        self.inner.forecasts_generated.get()
    }

    pub fn action_plans_generated(&self) -> u64 {
        self.inner.action_plans_generated.get()
    }

    pub fn errors(&self, component: &str) -> u64 {
        self.inner.errors.with_label_values(&[component]).get()
    }
}

/// Structured logger for planner events
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn log_forecast(&self, hospital_id: &str, event_id: Option<&str>, result: &ForecastResult) {
        info!(
            event = "forecast_generated",
            node = %self.node_name,
            hospital_id = %hospital_id,
            event_id = ?event_id,
            predicted_arrivals = result.predicted_arrivals,
            confidence = result.confidence,
            risk_category = %result.risk_category,
            horizon_hours = result.horizon_hours,
            model_version = %result.model_version,
            "Generated surge forecast"
        );
    }

    pub fn log_action_plan(&self, hospital_id: &str, plan: &ActionPlan, elapsed_ms: u64) {
        info!(
            event = "action_plan_generated",
            node = %self.node_name,
            hospital_id = %hospital_id,
            doctors = plan.recommended_staffing.doctors,
            nurses = plan.recommended_staffing.nurses,
            beds = plan.recommended_supplies.beds,
            oxygen_liters = plan.recommended_supplies.oxygen_liters,
            public_messages = plan.messages_for_public.len(),
            triage_templates = plan.suggested_triage_templates.len(),
            confidence = plan.confidence,
            elapsed_ms = elapsed_ms,
            "Generated action plan"
        );
    }

    pub fn log_failure(&self, hospital_id: &str, error: &SurgeError) {
        warn!(
            event = "agent_failed",
            node = %self.node_name,
            hospital_id = %hospital_id,
            component = %error.component(),
            error = %error,
            "Surge request failed"
        );
    }

    pub fn log_model_loaded(&self, version: &str, family: &str, loaded: bool) {
        if loaded {
            info!(
                event = "model_loaded",
                node = %self.node_name,
                model_version = %version,
                model_family = %family,
                "Surge model loaded"
            );
        } else {
            warn!(
                event = "model_loaded",
                node = %self.node_name,
                model_version = %version,
                model_family = %family,
                "No surge model loaded, forecasts will fail until one is configured"
            );
        }
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "service_started",
            node = %self.node_name,
            service_version = %version,
            port = port,
            "Surge planner started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Surge planner shutting down"
        );
    }
}
