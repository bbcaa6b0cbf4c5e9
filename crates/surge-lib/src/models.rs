//! Core data models for the surge planner

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::forecast::RiskCategory;

/// Single telemetry sample recorded for a hospital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub hospital_id: String,
    pub timestamp: DateTime<Utc>,
    pub current_patients: u32,
    pub new_arrivals: u32,
    #[serde(default)]
    pub avg_age: Option<f64>,
    #[serde(default)]
    pub primary_complaint_codes: Vec<String>,
    #[serde(default)]
    pub aqi: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

/// Static capacity profile of a hospital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalProfile {
    /// May be omitted when the id is given by the request path
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub bed_count: u32,
    pub icu_count: u32,
    #[serde(default)]
    pub oxygen_capacity: Option<u32>,
    #[serde(default)]
    pub doctors_count: Option<u32>,
    #[serde(default)]
    pub nurses_count: Option<u32>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of a single forecast invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub predicted_arrivals: f64,
    pub confidence: f64,
    pub risk_category: RiskCategory,
    pub horizon_hours: u32,
    pub model_version: String,
}

/// A forecast as kept in the history of a hospital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub hospital_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub forecast_timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub result: ForecastResult,
}

/// Observation bundle handed to the agents by the API layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentObservation {
    pub hospital_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default)]
    pub current_metrics: Map<String, Value>,
    #[serde(default)]
    pub environmental_context: Map<String, Value>,
}

/// The closed set of reasoning units run by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Forecast,
    Triage,
    Communication,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Forecast => "forecast",
            AgentKind::Triage => "triage",
            AgentKind::Communication => "communication",
        }
    }

    /// Label used for the evidence entries of an action plan
    pub fn evidence_source(&self) -> &'static str {
        match self {
            AgentKind::Forecast => "forecast_agent",
            AgentKind::Triage => "triage_agent",
            AgentKind::Communication => "communication_agent",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one agent for one orchestration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    pub agent_type: AgentKind,
    pub action: Map<String, Value>,
    pub reasoning_trace: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingRecommendation {
    pub doctors: u32,
    pub nurses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyRecommendation {
    pub beds: u32,
    pub oxygen_liters: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriagePriority {
    Low,
    Medium,
    High,
}

/// Clinician-facing assessment suggestion for one complaint code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageTemplate {
    pub code: String,
    pub priority: TriagePriority,
    pub suggested_assessment: String,
    pub note: String,
}

/// One evidence entry: which agent contributed and its raw payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: String,
    pub data: Map<String, Value>,
}

/// Merged multi-agent output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub recommended_staffing: StaffingRecommendation,
    pub recommended_supplies: SupplyRecommendation,
    pub confidence: f64,
    pub messages_for_public: Vec<String>,
    pub suggested_triage_templates: Vec<TriageTemplate>,
    pub evidence: Vec<Evidence>,
    pub agent_actions: Vec<AgentAction>,
}
