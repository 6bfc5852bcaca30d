// Computed dashboard summary (never persisted)

use std::collections::BTreeMap;

use serde::Serialize;

use super::feedback::Feedback;
use super::ride::Ride;

/// A ride enriched with passenger count and its own average rating
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideView {
    pub ride: Ride,
    pub passenger_count: usize,
    /// Two-decimal string, `None` when the ride has no ratings
    pub average_rating: Option<String>,
}

/// Aggregate for one driver over one month window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverMonthlySummary {
    pub total_rides: usize,
    pub total_earnings: f64,
    /// Two-decimal string, "0.00" when there are no rides
    pub average_earnings: String,
    /// Two-decimal string, `None` when there are no ratings
    pub average_rating: Option<String>,
    pub rating_count: usize,
    /// Star value (1..=5) to count; every bucket is always present
    pub rating_distribution: BTreeMap<u8, usize>,
    pub recent_feedback: Vec<Feedback>,
    pub rides: Vec<RideView>,
}

impl DriverMonthlySummary {
    /// Zeroed summary shown for empty months and failed fetches
    pub fn empty() -> Self {
        Self {
            total_rides: 0,
            total_earnings: 0.0,
            average_earnings: "0.00".to_string(),
            average_rating: None,
            rating_count: 0,
            rating_distribution: empty_distribution(),
            recent_feedback: Vec::new(),
            rides: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_rides == 0
    }
}

impl Default for DriverMonthlySummary {
    fn default() -> Self {
        Self::empty()
    }
}

pub fn empty_distribution() -> BTreeMap<u8, usize> {
    (1..=5).map(|star| (star, 0)).collect()
}
