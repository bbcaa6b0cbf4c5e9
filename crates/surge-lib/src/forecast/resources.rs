//! Staffing and supply recommendations derived from a prediction
//!
//! Each resource scales linearly with predicted arrivals and is floored
//! at a safety minimum.

use crate::models::{StaffingRecommendation, SupplyRecommendation};
use serde::{Deserialize, Serialize};

/// Minimum doctors recommended regardless of prediction
pub const MIN_DOCTORS: u32 = 1;

/// Minimum nurses recommended regardless of prediction
pub const MIN_NURSES: u32 = 2;

/// Minimum beds recommended regardless of prediction
pub const MIN_BEDS: u32 = 5;

/// Minimum oxygen in liters recommended regardless of prediction
pub const MIN_OXYGEN_LITERS: u32 = 100;

/// Tolerance for float noise before rounding up (0.3 * 10.0 is 3.0000000000000004)
const ROUNDING_EPSILON: f64 = 1e-9;

/// Per-arrival resource ratios; missing fields take the defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRatios {
    pub doctors_per_arrival: f64,
    pub nurses_per_arrival: f64,
    pub beds_per_arrival: f64,
    pub oxygen_liters_per_arrival: f64,
}

impl Default for ResourceRatios {
    fn default() -> Self {
        Self {
            doctors_per_arrival: 0.1,
            nurses_per_arrival: 0.3,
            beds_per_arrival: 0.8,
            oxygen_liters_per_arrival: 50.0,
        }
    }
}

/// Derive staffing and supplies for `predicted_arrivals` with default ratios
pub fn recommend_resources(predicted_arrivals: f64) -> (StaffingRecommendation, SupplyRecommendation) {
    ResourceRatios::default().recommend(predicted_arrivals)
}

impl ResourceRatios {
    pub fn recommend(&self, predicted_arrivals: f64) -> (StaffingRecommendation, SupplyRecommendation) {
        let arrivals = predicted_arrivals.max(0.0);
        let staffing = StaffingRecommendation {
            doctors: round_up(arrivals * self.doctors_per_arrival).max(MIN_DOCTORS),
            nurses: round_up(arrivals * self.nurses_per_arrival).max(MIN_NURSES),
        };
        let supplies = SupplyRecommendation {
            beds: round_up(arrivals * self.beds_per_arrival).max(MIN_BEDS),
            oxygen_liters: round_up(arrivals * self.oxygen_liters_per_arrival)
                .max(MIN_OXYGEN_LITERS),
        };
        (staffing, supplies)
    }
}

fn round_up(value: f64) -> u32 {
    let rounded = (value - ROUNDING_EPSILON).ceil();
    if rounded <= 0.0 {
        0
    } else if rounded >= u32::MAX as f64 {
        u32::MAX
    } else {
        rounded as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floors_at_zero_arrivals() {
        let (staffing, supplies) = recommend_resources(0.0);
        assert_eq!(staffing.doctors, MIN_DOCTORS);
        assert_eq!(staffing.nurses, MIN_NURSES);
        assert_eq!(supplies.beds, MIN_BEDS);
        assert_eq!(supplies.oxygen_liters, MIN_OXYGEN_LITERS);
    }

    #[test]
    fn test_twelve_arrivals() {
        let (staffing, supplies) = recommend_resources(12.0);
        assert_eq!(staffing, StaffingRecommendation { doctors: 2, nurses: 4 });
        assert_eq!(supplies, SupplyRecommendation { beds: 10, oxygen_liters: 600 });
    }

    #[test]
    fn test_exact_products_are_not_bumped() {
        let (staffing, supplies) = recommend_resources(10.0);
        assert_eq!(staffing.doctors, 1);
        assert_eq!(staffing.nurses, 3);
        assert_eq!(supplies.beds, 8);
        assert_eq!(supplies.oxygen_liters, 500);
    }

    #[test]
    fn test_monotonic_and_floored() {
        let mut previous = recommend_resources(0.0);
        for step in 1..=2000 {
            let arrivals = step as f64 * 0.05;
            let current = recommend_resources(arrivals);
            assert!(current.0.doctors >= previous.0.doctors, "doctors at {}", arrivals);
            assert!(current.0.nurses >= previous.0.nurses, "nurses at {}", arrivals);
            assert!(current.1.beds >= previous.1.beds, "beds at {}", arrivals);
            assert!(current.1.oxygen_liters >= previous.1.oxygen_liters, "oxygen at {}", arrivals);
            assert!(current.0.doctors >= MIN_DOCTORS);
            assert!(current.0.nurses >= MIN_NURSES);
            assert!(current.1.beds >= MIN_BEDS);
            assert!(current.1.oxygen_liters >= MIN_OXYGEN_LITERS);
            previous = current;
        }
    }

    #[test]
    fn test_negative_treated_as_zero() {
        assert_eq!(recommend_resources(-4.0), recommend_resources(0.0));
    }
}
