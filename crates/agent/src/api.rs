//! HTTP API: planning endpoints, health checks and Prometheus metrics

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use surge_lib::{
    forecast::WINDOW_LEN,
    health::{ComponentStatus, HealthRegistry},
    observability::{StructuredLogger, SurgeMetrics},
    ActionPlan, AgentObservation, ForecastRecord, HospitalProfile, Observation, Orchestrator,
    SurgeError, TelemetryStore,
};
use tracing::info;

/// Forecast history entries returned when no limit is given
const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Shared application state
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: SurgeMetrics,
    pub logger: StructuredLogger,
    pub store: Arc<dyn TelemetryStore>,
    pub orchestrator: Orchestrator,
    pub default_horizon_hours: u32,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: SurgeMetrics,
        logger: StructuredLogger,
        store: Arc<dyn TelemetryStore>,
        orchestrator: Orchestrator,
        default_horizon_hours: u32,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            logger,
            store,
            orchestrator,
            default_horizon_hours,
        }
    }

    /// Record a failed request and turn it into a response
    fn reject(&self, hospital_id: &str, error: SurgeError) -> ApiError {
        self.metrics.inc_errors(error.component());
        self.logger.log_failure(hospital_id, &error);
        ApiError(error)
    }

    async fn profile(&self, hospital_id: &str) -> Result<HospitalProfile, ApiError> {
        match self.store.hospital(hospital_id).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(self.reject(
                hospital_id,
                SurgeError::UnknownHospital(hospital_id.to_string()),
            )),
            Err(e) => Err(self.reject(hospital_id, e)),
        }
    }
}

/// A `SurgeError` rendered as `{error, component}` with a mapped status
#[derive(Debug)]
pub struct ApiError(pub SurgeError);

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub component: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.root() {
            SurgeError::UnknownHospital(_) => StatusCode::NOT_FOUND,
            SurgeError::InvalidRequest(_) | SurgeError::InsufficientData { .. } => {
                StatusCode::BAD_REQUEST
            }
            SurgeError::UnknownAgentInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SurgeError::PredictorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SurgeError::AgentFailed { .. } | SurgeError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.to_string(),
            component: self.0.component().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    pub horizon_hours: Option<u32>,
    pub event_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub observation: AgentObservation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub action_plan: ActionPlan,
    pub created_at: DateTime<Utc>,
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Some(stats) = state.orchestrator.forecast_agent().predictor().stats() {
        state.metrics.set_inference_stats(&stats);
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            e.to_string().into_bytes(),
        ),
    }
}

async fn upsert_hospital(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
    Json(mut profile): Json<HospitalProfile>,
) -> Result<Json<HospitalProfile>, ApiError> {
    if profile.id.is_empty() {
        profile.id = hospital_id.clone();
    }
    if profile.id != hospital_id {
        return Err(state.reject(
            &hospital_id,
            SurgeError::InvalidRequest(format!(
                "profile id {} does not match path {}",
                profile.id, hospital_id
            )),
        ));
    }

    state
        .store
        .upsert_hospital(profile.clone())
        .await
        .map_err(|e| state.reject(&hospital_id, e))?;
    info!(hospital_id = %hospital_id, bed_count = profile.bed_count, "Hospital profile stored");
    Ok(Json(profile))
}

async fn record_observation(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
    Json(observation): Json<Observation>,
) -> Result<(StatusCode, Json<Observation>), ApiError> {
    if observation.hospital_id != hospital_id {
        return Err(state.reject(
            &hospital_id,
            SurgeError::InvalidRequest(format!(
                "observation is for hospital {} but path is {}",
                observation.hospital_id, hospital_id
            )),
        ));
    }

    state
        .store
        .record_observation(observation.clone())
        .await
        .map_err(|e| state.reject(&hospital_id, e))?;
    Ok((StatusCode::CREATED, Json(observation)))
}

async fn create_forecast(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> Result<(StatusCode, Json<ForecastRecord>), ApiError> {
    let start = Instant::now();
    let profile = state.profile(&hospital_id).await?;

    let history = state
        .store
        .recent_observations(&hospital_id, WINDOW_LEN)
        .await
        .map_err(|e| state.reject(&hospital_id, e))?;
    if history.is_empty() {
        return Err(state.reject(
            &hospital_id,
            SurgeError::InsufficientData {
                hospital_id: hospital_id.clone(),
            },
        ));
    }

    let horizon_hours = query.horizon_hours.unwrap_or(state.default_horizon_hours);
    let result = state
        .orchestrator
        .forecast_agent()
        .forecast(&profile, &history, horizon_hours)
        .await
        .map_err(|e| state.reject(&hospital_id, e))?;

    let record = ForecastRecord {
        hospital_id: hospital_id.clone(),
        event_id: query.event_id,
        forecast_timestamp: Utc::now(),
        result,
    };
    state
        .store
        .record_forecast(record.clone())
        .await
        .map_err(|e| state.reject(&hospital_id, e))?;

    state
        .metrics
        .observe_forecast_latency(start.elapsed().as_secs_f64());
    state.metrics.record_forecast(&hospital_id, &record.result);
    state
        .logger
        .log_forecast(&hospital_id, record.event_id.as_deref(), &record.result);

    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_forecasts(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ForecastRecord>>, ApiError> {
    state.profile(&hospital_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let records = state
        .store
        .recent_forecasts(&hospital_id, limit)
        .await
        .map_err(|e| state.reject(&hospital_id, e))?;
    Ok(Json(records))
}

async fn ask_agents(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let start = Instant::now();
    let observation = request.observation;
    let hospital_id = observation.hospital_id.clone();
    let profile = state.profile(&hospital_id).await?;

    let action_plan = state
        .orchestrator
        .orchestrate(&observation, &profile)
        .await
        .map_err(|e| state.reject(&hospital_id, e))?;

    let elapsed = start.elapsed();
    state
        .metrics
        .observe_orchestration_latency(elapsed.as_secs_f64());
    state.metrics.inc_action_plans();
    state
        .logger
        .log_action_plan(&hospital_id, &action_plan, elapsed.as_millis() as u64);

    Ok(Json(AskResponse {
        action_plan,
        created_at: Utc::now(),
    }))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/hospitals/:id", put(upsert_hospital))
        .route("/api/v1/hospitals/:id/observations", post(record_observation))
        .route(
            "/api/v1/hospitals/:id/forecasts",
            post(create_forecast).get(list_forecasts),
        )
        .route("/api/v1/agents/ask", post(ask_agents))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
