//! Public advisories from risk category and environmental context

use super::object;
use crate::error::{Result, SurgeError};
use crate::forecast::RiskCategory;
use crate::models::{AgentAction, AgentKind, AgentObservation};
use serde_json::{json, Value};

/// AQI assumed when the observation carries none
pub const DEFAULT_AQI_READING: f64 = 50.0;

/// Readings strictly above this trigger the respiratory advisory
pub const AQI_ADVISORY_THRESHOLD: f64 = 100.0;

pub const COMMUNICATION_CONFIDENCE: f64 = 0.8;

pub const CAPACITY_ADVISORY: &str =
    "High patient volume expected. Consider alternative care options for non-emergencies.";

pub const AIR_QUALITY_ADVISORY: &str =
    "Air quality is poor. Those with respiratory conditions should limit outdoor exposure.";

pub const EMERGENCY_ONLY_ADVISORY: &str =
    "Hospital capacity may be limited. Please use emergency services for true emergencies only.";

#[derive(Debug, Clone, Copy, Default)]
pub struct CommunicationAgent;

impl CommunicationAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn process(
        &self,
        observation: &AgentObservation,
        risk_category: RiskCategory,
    ) -> Result<AgentAction> {
        let aqi = aqi_reading(observation)?;

        let mut messages = Vec::new();
        if risk_category == RiskCategory::High {
            messages.push(CAPACITY_ADVISORY.to_string());
        }
        if aqi > AQI_ADVISORY_THRESHOLD {
            messages.push(AIR_QUALITY_ADVISORY.to_string());
        }
        if risk_category.is_elevated() {
            messages.push(EMERGENCY_ONLY_ADVISORY.to_string());
        }

        Ok(AgentAction {
            agent_type: AgentKind::Communication,
            action: object(json!({
                "messages": messages,
                "target_audience": "public",
                "urgency": risk_category,
            })),
            reasoning_trace: vec![
                format!("Risk category: {}", risk_category),
                format!("Environmental factors considered (AQI: {})", aqi),
                "Messages tailored for public health communication".to_string(),
            ],
            confidence: COMMUNICATION_CONFIDENCE,
        })
    }
}

fn aqi_reading(observation: &AgentObservation) -> Result<f64> {
    match observation.environmental_context.get("aqi") {
        None | Some(Value::Null) => Ok(DEFAULT_AQI_READING),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            SurgeError::agent_input(AgentKind::Communication, format!("aqi {} out of range", n))
        }),
        Some(other) => Err(SurgeError::agent_input(
            AgentKind::Communication,
            format!("aqi must be numeric, got {}", other),
        )),
    }
}
