//! Telemetry storage
//!
//! The planner only needs simple keyed reads and writes: hospital
//! profiles, per-hospital observation histories and recorded forecasts.
//! `InMemoryTelemetryStore` implements that contract for a single process.

use crate::error::{Result, SurgeError};
use crate::models::{ForecastRecord, HospitalProfile, Observation};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;

/// One week of hourly observations
pub const DEFAULT_MAX_OBSERVATIONS: usize = 24 * 7;

/// Forecasts kept per hospital
pub const DEFAULT_MAX_FORECASTS: usize = 100;

#[async_trait]
pub trait TelemetryStore: Send + Sync {
    async fn upsert_hospital(&self, profile: HospitalProfile) -> Result<()>;

    async fn hospital(&self, hospital_id: &str) -> Result<Option<HospitalProfile>>;

    /// Record an observation, keeping the history ordered by timestamp
    async fn record_observation(&self, observation: Observation) -> Result<()>;

    /// Up to `limit` most recent observations, most-recent-last
    async fn recent_observations(&self, hospital_id: &str, limit: usize)
        -> Result<Vec<Observation>>;

    async fn record_forecast(&self, record: ForecastRecord) -> Result<()>;

    /// Up to `limit` recorded forecasts, newest first
    async fn recent_forecasts(&self, hospital_id: &str, limit: usize)
        -> Result<Vec<ForecastRecord>>;
}

#[derive(Debug, Default)]
struct HospitalEntry {
    profile: Option<HospitalProfile>,
    observations: VecDeque<Observation>,
    forecasts: VecDeque<ForecastRecord>,
}

#[derive(Debug)]
pub struct InMemoryTelemetryStore {
    hospitals: DashMap<String, HospitalEntry>,
    max_observations: usize,
    max_forecasts: usize,
}

impl Default for InMemoryTelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTelemetryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_OBSERVATIONS, DEFAULT_MAX_FORECASTS)
    }

    pub fn with_capacity(max_observations: usize, max_forecasts: usize) -> Self {
        Self {
            hospitals: DashMap::new(),
            max_observations: max_observations.max(1),
            max_forecasts: max_forecasts.max(1),
        }
    }

}

#[async_trait]
impl TelemetryStore for InMemoryTelemetryStore {
    async fn upsert_hospital(&self, profile: HospitalProfile) -> Result<()> {
        if profile.id.trim().is_empty() {
            return Err(SurgeError::InvalidRequest("hospital id is empty".to_string()));
        }
        let id = profile.id.clone();
        self.hospitals.entry(id).or_default().profile = Some(profile);
        Ok(())
    }

    async fn hospital(&self, hospital_id: &str) -> Result<Option<HospitalProfile>> {
        Ok(self
            .hospitals
            .get(hospital_id)
            .and_then(|entry| entry.profile.clone()))
    }

    async fn record_observation(&self, observation: Observation) -> Result<()> {
        let mut entry = self
            .hospitals
            .get_mut(&observation.hospital_id)
            .filter(|entry| entry.profile.is_some())
            .ok_or_else(|| SurgeError::UnknownHospital(observation.hospital_id.clone()))?;

        // late arrivals are inserted after any sample with the same timestamp
        let position = entry
            .observations
            .partition_point(|existing| existing.timestamp <= observation.timestamp);
        entry.observations.insert(position, observation);

        while entry.observations.len() > self.max_observations {
            entry.observations.pop_front();
        }
        Ok(())
    }

    async fn recent_observations(
        &self,
        hospital_id: &str,
        limit: usize,
    ) -> Result<Vec<Observation>> {
        Ok(self
            .hospitals
            .get(hospital_id)
            .map(|entry| {
                let skip = entry.observations.len().saturating_sub(limit);
                entry.observations.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default())
    }

    async fn record_forecast(&self, record: ForecastRecord) -> Result<()> {
        let mut entry = self
            .hospitals
            .get_mut(&record.hospital_id)
            .filter(|entry| entry.profile.is_some())
            .ok_or_else(|| SurgeError::UnknownHospital(record.hospital_id.clone()))?;

        entry.forecasts.push_front(record);
        entry.forecasts.truncate(self.max_forecasts);
        Ok(())
    }

    async fn recent_forecasts(
        &self,
        hospital_id: &str,
        limit: usize,
    ) -> Result<Vec<ForecastRecord>> {
        Ok(self
            .hospitals
            .get(hospital_id)
            .map(|entry| entry.forecasts.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
