//! Service configuration

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use surge_lib::{forecast::ResourceRatios, ModelFamily, TriageRules, TriageTemplate};

/// Environment variable naming an optional configuration file
pub const CONFIG_FILE_ENV: &str = "SURGE_CONFIG_FILE";

#[derive(Debug, Clone, Deserialize)]
pub struct SurgeConfig {
    /// Instance name attached to structured log events
    #[serde(default = "default_node_name")]
    pub node_name: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Path to the ONNX surge model; the service runs unloaded without one
    #[serde(default)]
    pub model_path: Option<String>,

    /// Expected hex SHA-256 of the model artifact
    #[serde(default)]
    pub model_sha256: Option<String>,

    #[serde(default)]
    pub model_family: ModelFamily,

    #[serde(default = "default_model_version")]
    pub model_version: String,

    #[serde(default = "default_predictor_timeout_ms")]
    pub predictor_timeout_ms: u64,

    #[serde(default = "default_horizon_hours")]
    pub default_horizon_hours: u32,

    /// Observations retained per hospital
    #[serde(default = "default_max_observations")]
    pub max_observations: usize,

    /// Forecast records retained per hospital
    #[serde(default = "default_max_forecasts")]
    pub max_forecasts: usize,

    /// Extra triage templates, added to or replacing the built-in ones
    #[serde(default)]
    pub triage_rules: Vec<TriageTemplate>,

    /// Per-arrival staffing and supply ratios
    #[serde(default)]
    pub resource_ratios: ResourceRatios,
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_version() -> String {
    "unversioned".to_string()
}

fn default_predictor_timeout_ms() -> u64 {
    2000
}

fn default_horizon_hours() -> u32 {
    24
}

fn default_max_observations() -> usize {
    24 * 7
}

fn default_max_forecasts() -> usize {
    100
}

impl Default for SurgeConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            api_port: default_api_port(),
            model_path: None,
            model_sha256: None,
            model_family: ModelFamily::default(),
            model_version: default_model_version(),
            predictor_timeout_ms: default_predictor_timeout_ms(),
            default_horizon_hours: default_horizon_hours(),
            max_observations: default_max_observations(),
            max_forecasts: default_max_forecasts(),
            triage_rules: Vec::new(),
            resource_ratios: ResourceRatios::default(),
        }
    }
}

impl SurgeConfig {
    /// Load configuration from the optional file and `SURGE_*` environment
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::load_from(file.as_deref())
    }

    /// Environment variables override values from the file
    pub fn load_from(file: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path));
        }
        let config = builder
            .add_source(config::Environment::with_prefix("SURGE"))
            .build()?;

        let config: SurgeConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_horizon_hours == 0 {
            anyhow::bail!("default_horizon_hours must be positive");
        }
        if self.predictor_timeout_ms == 0 {
            anyhow::bail!("predictor_timeout_ms must be positive");
        }
        let ratios = &self.resource_ratios;
        let all_positive = [
            ratios.doctors_per_arrival,
            ratios.nurses_per_arrival,
            ratios.beds_per_arrival,
            ratios.oxygen_liters_per_arrival,
        ]
        .iter()
        .all(|r| r.is_finite() && *r > 0.0);
        if !all_positive {
            anyhow::bail!("resource_ratios must be positive");
        }
        Ok(())
    }

    pub fn predictor_timeout(&self) -> Duration {
        Duration::from_millis(self.predictor_timeout_ms)
    }

    /// Built-in rules plus any configured templates
    pub fn triage_rules(&self) -> TriageRules {
        self.triage_rules
            .iter()
            .cloned()
            .fold(TriageRules::default(), TriageRules::with_rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use surge_lib::TriagePriority;

    #[test]
    fn test_defaults() {
        let config = SurgeConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.default_horizon_hours, 24);
        assert_eq!(config.predictor_timeout(), Duration::from_secs(2));
        assert_eq!(config.model_family, ModelFamily::Sequence);
        assert_eq!(config.triage_rules().len(), 2);
    }

    #[test]
    fn test_file_adds_triage_rules() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "api_port": 9191,
                "model_family": "tabular",
                "triage_rules": [
                    {{
                        "code": "T67.0",
                        "priority": "high",
                        "suggested_assessment": "Core temperature, mental status",
                        "note": "Start active cooling"
                    }}
                ]
            }}"#
        )
        .unwrap();

        let config = SurgeConfig::load_from(file.path().to_str()).unwrap();
        assert_eq!(config.api_port, 9191);
        assert_eq!(config.model_family, ModelFamily::Tabular);

        let rules = config.triage_rules();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.get("T67.0").unwrap().priority, TriagePriority::High);
        assert!(rules.get("R50.9").is_some());
    }

    #[test]
    fn test_partial_resource_ratios() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"resource_ratios": {{"nurses_per_arrival": 0.5}}}}"#).unwrap();

        let config = SurgeConfig::load_from(file.path().to_str()).unwrap();
        assert_eq!(config.resource_ratios.nurses_per_arrival, 0.5);
        assert_eq!(config.resource_ratios.doctors_per_arrival, 0.1);
        assert_eq!(config.resource_ratios.oxygen_liters_per_arrival, 50.0);
    }

    #[test]
    fn test_negative_ratio_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"resource_ratios": {{"beds_per_arrival": -1.0}}}}"#).unwrap();
        assert!(SurgeConfig::load_from(file.path().to_str()).is_err());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"default_horizon_hours": 0}}"#).unwrap();
        assert!(SurgeConfig::load_from(file.path().to_str()).is_err());
    }
}
