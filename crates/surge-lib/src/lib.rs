//! Hospital surge forecasting and action planning
//!
//! This crate provides:
//! - Feature windowing and the surge predictor boundary
//! - Forecast, triage and communication agents
//! - The orchestrator that merges agent output into an action plan
//! - Telemetry storage, health checks and observability

pub mod agents;
pub mod error;
pub mod forecast;
pub mod health;
pub mod models;
pub mod observability;
pub mod orchestrator;
pub mod store;

pub use agents::{CommunicationAgent, ForecastAgent, TriageAgent, TriageRules};
pub use error::{PredictorError, Result, SurgeError};
pub use forecast::{
    classify_risk, FeatureWindow, FeatureWindower, FixedPredictor, ModelFamily,
    OnnxSurgePredictor, RiskCategory, SurgePredictor,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{StructuredLogger, SurgeMetrics};
pub use orchestrator::Orchestrator;
pub use store::{InMemoryTelemetryStore, TelemetryStore};
