//! Forecast CLI commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, ForecastRecord};
use crate::output::{
    color_confidence, color_risk, format_timestamp, print_json, print_success, print_table,
    OutputFormat,
};

#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Arrivals")]
    predicted_arrivals: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Horizon")]
    horizon: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Model")]
    model: String,
}

impl From<&ForecastRecord> for ForecastRow {
    fn from(record: &ForecastRecord) -> Self {
        Self {
            timestamp: format_timestamp(&record.forecast_timestamp),
            event: record.event_id.clone().unwrap_or_else(|| "-".to_string()),
            predicted_arrivals: format!("{:.1}", record.predicted_arrivals),
            risk: color_risk(&record.risk_category),
            horizon: format!("{}h", record.horizon_hours),
            confidence: color_confidence(record.confidence),
            model: record.model_version.clone(),
        }
    }
}

/// Build the forecast request path, query parameters included
pub fn forecast_path(hospital: &str, horizon: Option<u32>, event: Option<&str>) -> Result<String> {
    let mut url = url::Url::parse("http://localhost/")?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("cannot build forecast path"))?
        .extend(["api", "v1", "hospitals", hospital, "forecasts"]);
    {
        let mut query = url.query_pairs_mut();
        if let Some(horizon) = horizon {
            query.append_pair("horizon_hours", &horizon.to_string());
        }
        if let Some(event) = event {
            query.append_pair("event_id", event);
        }
    }
    let path = url.path().trim_start_matches('/').to_string();
    Ok(match url.query().filter(|q| !q.is_empty()) {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    })
}

/// Request a fresh forecast for a hospital
pub async fn run_forecast(
    client: &ApiClient,
    hospital: &str,
    horizon: Option<u32>,
    event: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let path = forecast_path(hospital, horizon, event.as_deref())?;
    let record: ForecastRecord = client.post_empty(&path).await?;

    match format {
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Table => {
            print_success(&format!("Forecast generated for {}", record.hospital_id.cyan()));
            println!();
            println!(
                "Predicted arrivals: {:.1} in the next {}h",
                record.predicted_arrivals, record.horizon_hours
            );
            println!("Risk category:      {}", color_risk(&record.risk_category));
            println!("Confidence:         {}", color_confidence(record.confidence));
            println!("Model version:      {}", record.model_version);
            if let Some(event) = &record.event_id {
                println!("Event:              {}", event);
            }
        }
    }

    Ok(())
}

/// Show recorded forecasts for a hospital, newest first
pub async fn list_forecasts(
    client: &ApiClient,
    hospital: &str,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let path = format!("{}?limit={}", forecast_path(hospital, None, None)?, limit);
    let records: Vec<ForecastRecord> = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Table => {
            println!("{}", format!("Forecast History: {}", hospital).bold());
            println!("{}", "=".repeat(60));
            print_table(records.iter().map(ForecastRow::from).collect());
            println!("\nTotal: {} forecasts", records.len());
        }
    }

    Ok(())
}
