//! Rule-based triage suggestions from complaint codes
//!
//! Stateless and model-free. Every output carries the clinician-review
//! disclaimer and the sign-off flag, whatever the input.

use super::object;
use crate::error::{Result, SurgeError};
use crate::models::{AgentAction, AgentKind, AgentObservation, TriagePriority, TriageTemplate};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Key in `current_metrics` holding the complaint codes
pub const COMPLAINT_CODES_KEY: &str = "primary_complaint_codes";

pub const TRIAGE_DISCLAIMER: &str =
    "These are suggestions only. All decisions require clinician review.";

/// Heuristic rules, not a learned model
pub const TRIAGE_CONFIDENCE: f64 = 0.7;

/// Complaint code → template table
#[derive(Debug, Clone)]
pub struct TriageRules {
    rules: HashMap<String, TriageTemplate>,
}

impl Default for TriageRules {
    fn default() -> Self {
        Self::empty()
            .with_rule(TriageTemplate {
                code: "R50.9".to_string(),
                priority: TriagePriority::Medium,
                suggested_assessment: "Temperature, vital signs, symptom duration".to_string(),
                note: "Monitor for dehydration".to_string(),
            })
            .with_rule(TriageTemplate {
                code: "R06.02".to_string(),
                priority: TriagePriority::High,
                suggested_assessment: "Oxygen saturation, respiratory rate, chest exam"
                    .to_string(),
                note: "Consider environmental factors (AQI)".to_string(),
            })
    }
}

impl TriageRules {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Add or replace the rule for `rule.code`
    pub fn with_rule(mut self, rule: TriageTemplate) -> Self {
        self.rules.insert(rule.code.clone(), rule);
        self
    }

    pub fn get(&self, code: &str) -> Option<&TriageTemplate> {
        self.rules.get(code)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TriageAgent {
    rules: TriageRules,
}

impl TriageAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: TriageRules) -> Self {
        Self { rules }
    }

    pub fn process(&self, observation: &AgentObservation) -> Result<AgentAction> {
        let codes = complaint_codes(observation)?;

        let mut templates = Vec::new();
        let mut unmatched = Vec::new();
        for code in &codes {
            match self.rules.get(code) {
                Some(template) => templates.push(template.clone()),
                None => unmatched.push(code.as_str()),
            }
        }

        let mut reasoning_trace = vec![
            format!("Analyzed {} complaint codes", codes.len()),
            format!("Matched {} triage templates", templates.len()),
        ];
        if !unmatched.is_empty() {
            reasoning_trace.push(format!("No template for: {}", unmatched.join(", ")));
        }
        reasoning_trace.push("All suggestions require clinician approval".to_string());

        Ok(AgentAction {
            agent_type: AgentKind::Triage,
            action: object(json!({
                "triage_templates": templates,
                "disclaimer": TRIAGE_DISCLAIMER,
                "refer_to_clinician": true,
            })),
            reasoning_trace,
            confidence: TRIAGE_CONFIDENCE,
        })
    }
}

/// Distinct complaint codes in first-seen order
fn complaint_codes(observation: &AgentObservation) -> Result<Vec<String>> {
    let items = match observation.current_metrics.get(COMPLAINT_CODES_KEY) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(SurgeError::agent_input(
                AgentKind::Triage,
                format!("{} must be a list of codes, got {}", COMPLAINT_CODES_KEY, other),
            ))
        }
    };

    let mut seen = HashSet::new();
    let mut codes = Vec::with_capacity(items.len());
    for item in items {
        let code = item.as_str().ok_or_else(|| {
            SurgeError::agent_input(
                AgentKind::Triage,
                format!("complaint code {} is not a string", item),
            )
        })?;
        if seen.insert(code) {
            codes.push(code.to_string());
        }
    }
    Ok(codes)
}
