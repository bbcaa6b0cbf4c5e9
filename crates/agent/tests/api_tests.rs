//! Integration tests for the surge planning API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use surge_agent::api::{create_router, AppState};
use surge_lib::{
    health::{components, ComponentHealth, HealthRegistry},
    observability::{StructuredLogger, SurgeMetrics},
    FixedPredictor, ForecastAgent, InMemoryTelemetryStore, OnnxSurgePredictor, Orchestrator,
    SurgePredictor, TelemetryStore,
};
use tower::ServiceExt;

async fn setup_app(predictor: Arc<dyn SurgePredictor>) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry
        .update(
            components::PREDICTOR,
            ComponentHealth::for_predictor(predictor.as_ref()),
        )
        .await;
    health_registry.register(components::STORE).await;
    health_registry.register(components::ORCHESTRATOR).await;

    let metrics = SurgeMetrics::new();
    let store: Arc<dyn TelemetryStore> = Arc::new(InMemoryTelemetryStore::new());
    let orchestrator = Orchestrator::new(
        ForecastAgent::new(predictor).with_metrics(metrics.clone()),
        Arc::clone(&store),
    );
    let state = Arc::new(AppState::new(
        health_registry,
        metrics,
        StructuredLogger::new("test-node"),
        store,
        orchestrator,
        24,
    ));
    (create_router(state.clone()), state)
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    setup_app(Arc::new(FixedPredictor::new(12.0, 0.8))).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register_hospital(app: &Router) {
    let (status, _) = send(
        app,
        "PUT",
        "/api/v1/hospitals/general",
        Some(json!({
            "name": "General Hospital",
            "bed_count": 100,
            "icu_count": 10,
            "latitude": 40.7128,
            "longitude": -74.0060
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn seed_observations(app: &Router, count: u32) {
    for hour in 0..count {
        let (status, _) = send(
            app,
            "POST",
            "/api/v1/hospitals/general/observations",
            Some(json!({
                "hospital_id": "general",
                "timestamp": format!("2024-08-01T{:02}:00:00Z", hour),
                "current_patients": 50,
                "new_arrivals": 5,
                "aqi": 50.0,
                "temperature": 20.0,
                "humidity": 60.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

fn ask_body(aqi: Value) -> Value {
    json!({
        "observation": {
            "hospital_id": "general",
            "current_metrics": {"primary_complaint_codes": ["R06.02"]},
            "environmental_context": {"aqi": aqi}
        }
    })
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app().await;

    let (status, health) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["components"]["predictor"]["status"], "healthy");
}

#[tokio::test]
async fn test_healthz_unavailable_without_model() {
    let (app, state) = setup_app(Arc::new(OnnxSurgePredictor::new_without_model())).await;
    state.health_registry.set_ready(true).await;

    let (status, health) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["components"]["predictor"]["status"], "unhealthy");

    let (status, readiness) = send(&app, "GET", "/readyz", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_after_initialization() {
    let (app, state) = setup_test_app().await;

    let (status, _) = send(&app, "GET", "/readyz", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.set_ready(true).await;
    let (status, readiness) = send(&app, "GET", "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, state) = setup_test_app().await;
    state.metrics.inc_action_plans();

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("surge_action_plans_generated_total"));
}

#[tokio::test]
async fn test_metrics_include_predictor_stats() {
    let (app, _state) = setup_app(Arc::new(OnnxSurgePredictor::new_without_model())).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("surge_predictor_inferences 0"));
    assert!(text.contains("surge_predictor_slow_inferences 0"));
}

#[tokio::test]
async fn test_forecast_round_trip() {
    let (app, _state) = setup_test_app().await;
    register_hospital(&app).await;
    seed_observations(&app, 24).await;

    let (status, record) = send(
        &app,
        "POST",
        "/api/v1/hospitals/general/forecasts?horizon_hours=12&event_id=marathon",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["hospital_id"], "general");
    assert_eq!(record["event_id"], "marathon");
    assert_eq!(record["predicted_arrivals"], 12.0);
    assert_eq!(record["confidence"], 0.8);
    assert_eq!(record["risk_category"], "medium");
    assert_eq!(record["horizon_hours"], 12);
    assert_eq!(record["model_version"], "fixed");

    let (status, history) = send(&app, "GET", "/api/v1/hospitals/general/forecasts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["event_id"], "marathon");
}

#[tokio::test]
async fn test_forecast_without_history_is_bad_request() {
    let (app, _state) = setup_test_app().await;
    register_hospital(&app).await;

    let (status, body) = send(&app, "POST", "/api/v1/hospitals/general/forecasts", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["component"], "feature_windower");
}

#[tokio::test]
async fn test_unknown_hospital_not_found() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = send(&app, "GET", "/api/v1/hospitals/missing/forecasts", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["component"], "telemetry_store");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/hospitals/missing/observations",
        Some(json!({
            "hospital_id": "missing",
            "timestamp": "2024-08-01T00:00:00Z",
            "current_patients": 1,
            "new_arrivals": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_observation_path_mismatch_rejected() {
    let (app, _state) = setup_test_app().await;
    register_hospital(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/hospitals/general/observations",
        Some(json!({
            "hospital_id": "other",
            "timestamp": "2024-08-01T00:00:00Z",
            "current_patients": 1,
            "new_arrivals": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ask_returns_action_plan() {
    let (app, _state) = setup_test_app().await;
    register_hospital(&app).await;
    seed_observations(&app, 24).await;

    let (status, body) = send(&app, "POST", "/api/v1/agents/ask", Some(ask_body(json!(150)))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["created_at"].is_string());

    let plan = &body["action_plan"];
    assert_eq!(plan["recommended_staffing"], json!({"doctors": 2, "nurses": 4}));
    assert_eq!(
        plan["recommended_supplies"],
        json!({"beds": 10, "oxygen_liters": 600})
    );
    assert_eq!(plan["confidence"], 0.8);
    assert_eq!(plan["suggested_triage_templates"][0]["code"], "R06.02");
    assert_eq!(plan["messages_for_public"].as_array().unwrap().len(), 2);

    let sources: Vec<&str> = plan["evidence"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["source"].as_str().unwrap())
        .collect();
    assert_eq!(
        sources,
        vec!["forecast_agent", "triage_agent", "communication_agent"]
    );
}

#[tokio::test]
async fn test_ask_with_malformed_context_is_unprocessable() {
    let (app, _state) = setup_test_app().await;
    register_hospital(&app).await;

    let (status, body) =
        send(&app, "POST", "/api/v1/agents/ask", Some(ask_body(json!("smoky")))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["component"], "communication_agent");
}

#[tokio::test]
async fn test_ask_without_model_is_unavailable() {
    let (app, _state) = setup_app(Arc::new(OnnxSurgePredictor::new_without_model())).await;
    register_hospital(&app).await;

    let (status, body) = send(&app, "POST", "/api/v1/agents/ask", Some(ask_body(json!(40)))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["component"], "forecast_agent");
}
