// Ride history data model
// One document per passenger dropped off on a ride

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::ride::string_field;
use crate::utils::time::parse_instant;

/// Per-passenger completion record linked to a ride
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideHistoryEvent {
    pub ride_id: String,
    pub passenger_id: Option<String>,
    /// `None` when the stored timestamp was missing or unreadable;
    /// such events never fall inside a month window
    pub completed_on: Option<DateTime<Utc>>,
}

impl RideHistoryEvent {
    /// Parse a decoded Firestore document. Requires `ride_id`.
    pub fn from_document(data: &Value) -> Option<Self> {
        Some(Self {
            ride_id: string_field(data, "ride_id")?,
            passenger_id: string_field(data, "passenger_id"),
            completed_on: data.get("ride_completed_on").and_then(parse_instant),
        })
    }
}
