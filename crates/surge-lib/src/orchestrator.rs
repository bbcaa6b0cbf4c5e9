//! Multi-agent orchestration
//!
//! Runs forecast and triage concurrently, then communication once the
//! forecast risk category is known, and merges the three actions into an
//! `ActionPlan`. Any agent failure fails the whole plan.

use crate::agents::{
    CommunicationAgent, ForecastAgent, ForecastOutcome, TriageAgent, DEFAULT_HORIZON_HOURS,
};
use crate::error::{Result, SurgeError};
use crate::forecast::WINDOW_LEN;
use crate::models::{
    ActionPlan, AgentAction, AgentKind, AgentObservation, Evidence, HospitalProfile, Observation,
    TriageTemplate,
};
use crate::store::TelemetryStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct Orchestrator {
    forecast_agent: ForecastAgent,
    triage_agent: TriageAgent,
    communication_agent: CommunicationAgent,
    store: Arc<dyn TelemetryStore>,
    horizon_hours: u32,
}

impl Orchestrator {
    pub fn new(forecast_agent: ForecastAgent, store: Arc<dyn TelemetryStore>) -> Self {
        Self {
            forecast_agent,
            triage_agent: TriageAgent::new(),
            communication_agent: CommunicationAgent::new(),
            store,
            horizon_hours: DEFAULT_HORIZON_HOURS,
        }
    }

    pub fn with_triage_agent(mut self, triage_agent: TriageAgent) -> Self {
        self.triage_agent = triage_agent;
        self
    }

    pub fn with_horizon_hours(mut self, horizon_hours: u32) -> Self {
        self.horizon_hours = horizon_hours;
        self
    }

    pub fn forecast_agent(&self) -> &ForecastAgent {
        &self.forecast_agent
    }

    /// Build an action plan for one observation.
    ///
    /// The forecast reads the most recent observation window of the
    /// hospital from the store.
    pub async fn orchestrate(
        &self,
        observation: &AgentObservation,
        profile: &HospitalProfile,
    ) -> Result<ActionPlan> {
        if observation.hospital_id != profile.id {
            return Err(SurgeError::agent_input(
                AgentKind::Forecast,
                format!(
                    "observation is for hospital {} but profile is {}",
                    observation.hospital_id, profile.id
                ),
            )
            .in_agent(AgentKind::Forecast));
        }

        let start = Instant::now();
        let history = self
            .store
            .recent_observations(&profile.id, WINDOW_LEN)
            .await
            .map_err(|e| e.in_agent(AgentKind::Forecast))?;

        let (forecast, triage) = tokio::try_join!(
            self.dispatch_forecast(profile, &history),
            async { self.dispatch_triage(observation) }
        )?;
        let communication = self.dispatch_communication(observation, &forecast)?;

        let plan = merge(forecast, triage, communication)?;
        debug!(
            hospital_id = %profile.id,
            history_len = history.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Action plan assembled"
        );
        Ok(plan)
    }

    async fn dispatch_forecast(
        &self,
        profile: &HospitalProfile,
        history: &[Observation],
    ) -> Result<ForecastOutcome> {
        self.forecast_agent
            .run(profile, history, self.horizon_hours)
            .await
            .map_err(|e| failed(AgentKind::Forecast, e))
    }

    fn dispatch_triage(&self, observation: &AgentObservation) -> Result<AgentAction> {
        self.triage_agent
            .process(observation)
            .map_err(|e| failed(AgentKind::Triage, e))
    }

    fn dispatch_communication(
        &self,
        observation: &AgentObservation,
        forecast: &ForecastOutcome,
    ) -> Result<AgentAction> {
        self.communication_agent
            .process(observation, forecast.result.risk_category)
            .map_err(|e| failed(AgentKind::Communication, e))
    }
}

fn failed(agent: AgentKind, error: SurgeError) -> SurgeError {
    warn!(agent = %agent, error = %error, "Agent failed, abandoning action plan");
    error.in_agent(agent)
}

fn merge(
    forecast: ForecastOutcome,
    triage: AgentAction,
    communication: AgentAction,
) -> Result<ActionPlan> {
    let messages_for_public: Vec<String> = payload_field(&communication, "messages")?;
    let suggested_triage_templates: Vec<TriageTemplate> =
        payload_field(&triage, "triage_templates")?;

    let agent_actions = vec![forecast.action, triage, communication];
    let evidence = agent_actions
        .iter()
        .map(|action| Evidence {
            source: action.agent_type.evidence_source().to_string(),
            data: action.action.clone(),
        })
        .collect();

    Ok(ActionPlan {
        recommended_staffing: forecast.staffing,
        recommended_supplies: forecast.supplies,
        confidence: forecast.result.confidence,
        messages_for_public,
        suggested_triage_templates,
        evidence,
        agent_actions,
    })
}

fn payload_field<T: serde::de::DeserializeOwned>(action: &AgentAction, key: &str) -> Result<T> {
    let value = action.action.get(key).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        SurgeError::agent_input(action.agent_type, format!("payload field {}: {}", key, e))
            .in_agent(action.agent_type)
    })
}
