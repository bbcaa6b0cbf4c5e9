//! Risk classification of predicted arrivals

use serde::{Deserialize, Serialize};
use std::fmt;

/// Predictions below this are low risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 5.0;

/// Predictions at or above this are high risk
pub const HIGH_RISK_THRESHOLD: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }

    /// Ordinal used for gauges: 0 low, 1 medium, 2 high
    pub fn level(&self) -> u8 {
        match self {
            RiskCategory::Low => 0,
            RiskCategory::Medium => 1,
            RiskCategory::High => 2,
        }
    }

    /// Medium or high
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskCategory::Medium | RiskCategory::High)
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary values belong to the higher bucket.
pub fn classify_risk(predicted_arrivals: f64) -> RiskCategory {
    if predicted_arrivals < MEDIUM_RISK_THRESHOLD {
        RiskCategory::Low
    } else if predicted_arrivals < HIGH_RISK_THRESHOLD {
        RiskCategory::Medium
    } else {
        RiskCategory::High
    }
}
