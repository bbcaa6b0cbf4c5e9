//! Surge Agent - hospital surge forecasting and action planning service
//!
//! Serves forecasts and multi-agent action plans over HTTP, together with
//! health, readiness and Prometheus endpoints.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use surge_agent::{api, config::SurgeConfig};
use surge_lib::{
    health::{components, ComponentHealth, HealthRegistry},
    observability::{StructuredLogger, SurgeMetrics},
    ForecastAgent, InMemoryTelemetryStore, OnnxSurgePredictor, Orchestrator, SurgePredictor,
    TelemetryStore, TriageAgent,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn load_predictor(config: &SurgeConfig) -> Result<OnnxSurgePredictor> {
    match &config.model_path {
        Some(path) => OnnxSurgePredictor::from_path(
            Path::new(path),
            config.model_sha256.as_deref(),
            config.model_family,
            config.model_version.clone(),
        )
        .with_context(|| format!("loading surge model from {}", path)),
        None => Ok(OnnxSurgePredictor::new_without_model()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting surge-agent");

    let config = SurgeConfig::load()?;
    info!(
        node_name = %config.node_name,
        api_port = config.api_port,
        default_horizon_hours = config.default_horizon_hours,
        "Service configured"
    );

    let metrics = SurgeMetrics::new();
    let logger = StructuredLogger::new(&config.node_name);

    let predictor = load_predictor(&config)?;
    let model_version = predictor.model_version();
    logger.log_model_loaded(
        &model_version,
        config.model_family.as_str(),
        predictor.is_loaded(),
    );
    metrics.set_model_version(&model_version, config.model_family.as_str());
    let predictor: Arc<dyn SurgePredictor> = Arc::new(predictor);

    let health_registry = HealthRegistry::new();
    health_registry
        .update(
            components::PREDICTOR,
            ComponentHealth::for_predictor(predictor.as_ref()),
        )
        .await;
    health_registry.register(components::STORE).await;
    health_registry.register(components::ORCHESTRATOR).await;

    let store: Arc<dyn TelemetryStore> = Arc::new(InMemoryTelemetryStore::with_capacity(
        config.max_observations,
        config.max_forecasts,
    ));

    let forecast_agent = ForecastAgent::new(predictor)
        .with_timeout(config.predictor_timeout())
        .with_ratios(config.resource_ratios)
        .with_metrics(metrics.clone());
    let orchestrator = Orchestrator::new(forecast_agent, Arc::clone(&store))
        .with_triage_agent(TriageAgent::with_rules(config.triage_rules()))
        .with_horizon_hours(config.default_horizon_hours);

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        logger.clone(),
        store,
        orchestrator,
        config.default_horizon_hours,
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(SERVICE_VERSION, config.api_port);

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    info!("Shutting down");
    Ok(())
}
