// Feedback data model
// Matches Firestore feedback_information collection structure

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::ride::string_field;
use crate::utils::time::parse_instant;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Passenger-submitted rating and comment for a ride
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub ride_id: String,
    pub passenger_id: Option<String>,
    /// Raw numeric rating; `None` if the stored value was not a number
    pub rating: Option<f64>,
    pub comment: Option<String>,
    pub submitted_on: Option<DateTime<Utc>>,
}

impl Feedback {
    /// Parse a decoded Firestore document. Requires `ride_id`.
    pub fn from_document(data: &Value) -> Option<Self> {
        Some(Self {
            ride_id: string_field(data, "ride_id")?,
            passenger_id: string_field(data, "passenger_id"),
            rating: data.get("feedback_rating").and_then(|v| v.as_f64()),
            comment: string_field(data, "feedback_comment"),
            submitted_on: data.get("feedback_submitted_on").and_then(parse_instant),
        })
    }

    /// Rating if it is usable for aggregation (finite and within 1..=5)
    pub fn valid_rating(&self) -> Option<f64> {
        self.rating
            .filter(|r| r.is_finite() && (MIN_RATING..=MAX_RATING).contains(r))
    }
}
