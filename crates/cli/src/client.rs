//! API client for the surge planning service

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

/// Non-success response from the service
#[derive(Error, Debug)]
#[error("API error ({status}): {message}{}", component_suffix(.component))]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub component: Option<String>,
}

fn component_suffix(component: &Option<String>) -> String {
    component
        .as_ref()
        .map(|c| format!(" [{}]", c))
        .unwrap_or_default()
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// GET that also accepts 503, for health probes that report status in the body
    pub async fn get_status<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return response.json().await.context("Failed to parse response");
        }
        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// POST without a body; parameters travel in the query string
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => ApiError {
                    status: status.as_u16(),
                    message: parsed.error,
                    component: parsed.component,
                },
                Err(_) => ApiError {
                    status: status.as_u16(),
                    message: body,
                    component: None,
                },
            };
            return Err(error.into());
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub hospital_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub forecast_timestamp: DateTime<Utc>,
    pub predicted_arrivals: f64,
    pub confidence: f64,
    pub risk_category: String,
    pub horizon_hours: u32,
    pub model_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffingRecommendation {
    pub doctors: u32,
    pub nurses: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyRecommendation {
    pub beds: u32,
    pub oxygen_liters: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageTemplate {
    pub code: String,
    pub priority: String,
    pub suggested_assessment: String,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub source: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAction {
    pub agent_type: String,
    pub action: Map<String, Value>,
    pub reasoning_trace: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    pub recommended_staffing: StaffingRecommendation,
    pub recommended_supplies: SupplyRecommendation,
    pub confidence: f64,
    pub messages_for_public: Vec<String>,
    pub suggested_triage_templates: Vec<TriageTemplate>,
    pub evidence: Vec<Evidence>,
    pub agent_actions: Vec<AgentAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub observation: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub action_plan: ActionPlan,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_parsed() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/v1/hospitals/missing/forecasts")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "unknown hospital: missing", "component": "telemetry_store"}"#)
            .create();

        let client = ApiClient::new(&server.url()).unwrap();
        let err = tokio_test::block_on(
            client.get::<Vec<ForecastRecord>>("api/v1/hospitals/missing/forecasts"),
        )
        .unwrap_err();
        mock.assert();

        let api_error = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_error.status, 404);
        assert_eq!(api_error.component.as_deref(), Some("telemetry_store"));
        assert_eq!(
            err.to_string(),
            "API error (404): unknown hospital: missing [telemetry_store]"
        );
    }

    #[test]
    fn test_unavailable_health_still_parsed() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/healthz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status": "unhealthy", "components": {"predictor": {"status": "unhealthy", "message": "No surge model loaded", "last_check_timestamp": 0}}}"#,
            )
            .create();

        let client = ApiClient::new(&server.url()).unwrap();
        let health: HealthResponse = tokio_test::block_on(client.get_status("healthz")).unwrap();
        assert_eq!(health.status, "unhealthy");
        assert_eq!(health.components["predictor"].status, "unhealthy");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
