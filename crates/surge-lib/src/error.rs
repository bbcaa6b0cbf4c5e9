//! Error types for the surge planner
//!
//! Every error carries enough context to tell which component failed.
//! Nothing in this crate retries; callers decide whether to try again.

use crate::models::AgentKind;
use std::time::Duration;
use thiserror::Error;

/// Failures at the surge predictor boundary
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("no model loaded")]
    NotLoaded,

    #[error("malformed predictor output: {0}")]
    MalformedOutput(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("inference timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("failed to load model: {0}")]
    Load(String),

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    Checksum { expected: String, actual: String },
}

#[derive(Error, Debug)]
pub enum SurgeError {
    /// Not raised by the windower, which zero-pads short histories.
    /// Callers that want to reject empty-history requests raise it themselves.
    #[error("insufficient observation data for hospital {hospital_id}")]
    InsufficientData { hospital_id: String },

    #[error("surge predictor unavailable: {0}")]
    PredictorUnavailable(#[from] PredictorError),

    #[error("{agent} agent rejected its input: {reason}")]
    UnknownAgentInput { agent: AgentKind, reason: String },

    #[error("{agent} agent failed: {source}")]
    AgentFailed {
        agent: AgentKind,
        #[source]
        source: Box<SurgeError>,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown hospital: {0}")]
    UnknownHospital(String),

    #[error("telemetry store error: {0}")]
    Store(String),
}

impl SurgeError {
    pub fn agent_input(agent: AgentKind, reason: impl Into<String>) -> Self {
        SurgeError::UnknownAgentInput {
            agent,
            reason: reason.into(),
        }
    }

    /// Wrap an error with the agent it came from
    pub fn in_agent(self, agent: AgentKind) -> Self {
        match self {
            already @ SurgeError::AgentFailed { .. } => already,
            other => SurgeError::AgentFailed {
                agent,
                source: Box::new(other),
            },
        }
    }

    /// Name of the component that failed, for logs and alerts
    pub fn component(&self) -> &'static str {
        match self {
            SurgeError::InsufficientData { .. } => "feature_windower",
            SurgeError::PredictorUnavailable(_) => "surge_predictor",
            SurgeError::UnknownAgentInput { agent, .. } | SurgeError::AgentFailed { agent, .. } => {
                agent.evidence_source()
            }
            SurgeError::InvalidRequest(_) => "request",
            SurgeError::UnknownHospital(_) | SurgeError::Store(_) => "telemetry_store",
        }
    }

    /// The innermost error, looking through agent wrappers
    pub fn root(&self) -> &SurgeError {
        match self {
            SurgeError::AgentFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SurgeError>;
