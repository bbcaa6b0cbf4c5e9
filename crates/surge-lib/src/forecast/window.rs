//! Feature windowing for surge inference
//!
//! Turns an irregular observation history into a fixed (W, D) block.
//! Short histories are zero-padded at the oldest end so the predictor
//! never sees a variable-length input.

use crate::models::{HospitalProfile, Observation};

/// Number of rows in a feature window
pub const WINDOW_LEN: usize = 24;

/// Number of features per row
pub const FEATURE_DIM: usize = 12;

/// Substitutes for optional observation fields
pub const DEFAULT_AVG_AGE: f32 = 50.0;
pub const DEFAULT_AQI: f32 = 50.0;
pub const DEFAULT_TEMPERATURE_C: f32 = 20.0;
pub const DEFAULT_HUMIDITY_PCT: f32 = 50.0;

/// One row of the window.
///
/// Column order: new_arrivals, current_patients, avg_age, aqi, temperature,
/// humidity, bed_count, icu_count, oxygen_capacity, doctors_count,
/// nurses_count, event_attendance.
pub type FeatureRow = [f32; FEATURE_DIM];

/// Fixed-shape feature block, oldest row first
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWindow {
    rows: [FeatureRow; WINDOW_LEN],
    real_rows: usize,
}

impl FeatureWindow {
    pub fn rows(&self) -> &[FeatureRow; WINDOW_LEN] {
        &self.rows
    }

    /// Number of rows backed by real observations (the rest is padding)
    pub fn real_rows(&self) -> usize {
        self.real_rows
    }

    pub fn padded_rows(&self) -> usize {
        WINDOW_LEN - self.real_rows
    }

    /// Row-major copy of the block, length `WINDOW_LEN * FEATURE_DIM`
    pub fn to_flat(&self) -> Vec<f32> {
        self.rows.iter().flat_map(|row| row.iter().copied()).collect()
    }
}

/// Builds feature windows from observation histories
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureWindower;

impl FeatureWindower {
    pub fn new() -> Self {
        Self
    }

    /// Build a window from observations ordered most-recent-last.
    ///
    /// An empty history yields an all-zero window. That is accepted here;
    /// callers that consider it degenerate must reject the request first.
    pub fn build(&self, profile: &HospitalProfile, observations: &[Observation]) -> FeatureWindow {
        let recent = &observations[observations.len().saturating_sub(WINDOW_LEN)..];
        let padding = WINDOW_LEN - recent.len();

        let mut rows = [[0.0; FEATURE_DIM]; WINDOW_LEN];
        for (slot, obs) in rows[padding..].iter_mut().zip(recent) {
            *slot = observation_row(profile, obs);
        }

        FeatureWindow {
            rows,
            real_rows: recent.len(),
        }
    }
}

fn observation_row(profile: &HospitalProfile, obs: &Observation) -> FeatureRow {
    [
        obs.new_arrivals as f32,
        obs.current_patients as f32,
        obs.avg_age.map(|v| v as f32).unwrap_or(DEFAULT_AVG_AGE),
        obs.aqi.map(|v| v as f32).unwrap_or(DEFAULT_AQI),
        obs.temperature.map(|v| v as f32).unwrap_or(DEFAULT_TEMPERATURE_C),
        obs.humidity.map(|v| v as f32).unwrap_or(DEFAULT_HUMIDITY_PCT),
        profile.bed_count as f32,
        profile.icu_count as f32,
        profile.oxygen_capacity.unwrap_or(0) as f32,
        profile.doctors_count.unwrap_or(0) as f32,
        profile.nurses_count.unwrap_or(0) as f32,
        // event attendance is not wired to live event data
        0.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn profile() -> HospitalProfile {
        HospitalProfile {
            id: "h1".to_string(),
            name: "General".to_string(),
            bed_count: 100,
            icu_count: 10,
            oxygen_capacity: Some(500),
            doctors_count: Some(20),
            nurses_count: Some(50),
            latitude: 37.77,
            longitude: -122.42,
        }
    }

    fn observations(count: usize) -> Vec<Observation> {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| Observation {
                hospital_id: "h1".to_string(),
                timestamp: start + Duration::hours(i as i64),
                current_patients: 50 + i as u32,
                new_arrivals: i as u32,
                avg_age: Some(45.0),
                primary_complaint_codes: vec![],
                aqi: Some(60.0),
                temperature: Some(25.0),
                humidity: Some(70.0),
            })
            .collect()
    }

    #[test]
    fn test_short_history_is_left_padded() {
        let history = observations(5);
        let window = FeatureWindower::new().build(&profile(), &history);

        assert_eq!(window.rows().len(), WINDOW_LEN);
        assert_eq!(window.real_rows(), 5);
        assert_eq!(window.padded_rows(), 19);
        for row in &window.rows()[..19] {
            assert!(row.iter().all(|v| *v == 0.0));
        }
        for (row, obs) in window.rows()[19..].iter().zip(&history) {
            assert_eq!(row[0], obs.new_arrivals as f32);
            assert_eq!(row[1], obs.current_patients as f32);
            assert_eq!(row[6], 100.0);
        }
    }

    #[test]
    fn test_every_short_length_yields_full_window() {
        for n in 0..WINDOW_LEN {
            let window = FeatureWindower::new().build(&profile(), &observations(n));
            assert_eq!(window.rows().len(), WINDOW_LEN);
            assert_eq!(window.real_rows(), n);
            let zero_rows = window
                .rows()
                .iter()
                .take_while(|row| row.iter().all(|v| *v == 0.0))
                .count();
            assert_eq!(zero_rows, WINDOW_LEN - n, "history of {}", n);
        }
    }

    #[test]
    fn test_long_history_keeps_most_recent() {
        let history = observations(30);
        let window = FeatureWindower::new().build(&profile(), &history);

        assert_eq!(window.real_rows(), WINDOW_LEN);
        assert_eq!(window.rows()[0][0], 6.0);
        assert_eq!(window.rows()[WINDOW_LEN - 1][0], 29.0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let mut history = observations(1);
        history[0].avg_age = None;
        history[0].aqi = None;
        history[0].temperature = None;
        history[0].humidity = None;

        let mut sparse = profile();
        sparse.oxygen_capacity = None;
        sparse.doctors_count = None;
        sparse.nurses_count = None;

        let window = FeatureWindower::new().build(&sparse, &history);
        let row = window.rows()[WINDOW_LEN - 1];
        assert_eq!(row[2], DEFAULT_AVG_AGE);
        assert_eq!(row[3], DEFAULT_AQI);
        assert_eq!(row[4], DEFAULT_TEMPERATURE_C);
        assert_eq!(row[5], DEFAULT_HUMIDITY_PCT);
        assert_eq!(&row[8..11], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_event_attendance_is_zero() {
        let window = FeatureWindower::new().build(&profile(), &observations(24));
        assert!(window.rows().iter().all(|row| row[FEATURE_DIM - 1] == 0.0));
    }

    #[test]
    fn test_empty_history_is_all_zero() {
        let window = FeatureWindower::new().build(&profile(), &[]);
        assert_eq!(window.real_rows(), 0);
        assert!(window.to_flat().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_flat_layout_is_row_major() {
        let window = FeatureWindower::new().build(&profile(), &observations(24));
        let flat = window.to_flat();
        assert_eq!(flat.len(), WINDOW_LEN * FEATURE_DIM);
        assert_eq!(flat[FEATURE_DIM], window.rows()[1][0]);
    }
}
