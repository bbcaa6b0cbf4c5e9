//! Reasoning units run by the orchestrator
//!
//! The set is closed: forecast, triage and communication. Each takes its
//! inputs and returns one `AgentAction`.

mod communication;
mod forecast;
mod triage;

pub use communication::{
    CommunicationAgent, AIR_QUALITY_ADVISORY, AQI_ADVISORY_THRESHOLD, CAPACITY_ADVISORY,
    COMMUNICATION_CONFIDENCE, DEFAULT_AQI_READING, EMERGENCY_ONLY_ADVISORY,
};
pub use forecast::{ForecastAgent, ForecastOutcome, DEFAULT_HORIZON_HOURS, DEFAULT_PREDICTOR_TIMEOUT};
pub use triage::{
    TriageAgent, TriageRules, COMPLAINT_CODES_KEY, TRIAGE_CONFIDENCE, TRIAGE_DISCLAIMER,
};

use serde_json::{Map, Value};

/// Unwrap a `json!` object literal into a payload map
fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
