// Ride data model
// Matches Firestore ride_information collection structure

use serde::Serialize;
use serde_json::Value;

/// Lifecycle state of a ride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Pending,
    Ongoing,
    Completed,
    Cancelled,
}

impl RideStatus {
    /// Value stored in the `status` field
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::Ongoing => "ongoing",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RideStatus::Pending => "Pending",
            RideStatus::Ongoing => "Ongoing",
            RideStatus::Completed => "Completed",
            RideStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::str::FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RideStatus::Pending),
            "ongoing" => Ok(RideStatus::Ongoing),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" | "canceled" => Ok(RideStatus::Cancelled),
            _ => Err(format!("Unknown ride status: {}", s)),
        }
    }
}

/// A single trip attributable to one driver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ride {
    pub id: String,
    pub driver_id: String,
    pub driver_name: Option<String>,
    pub status: RideStatus,
    pub title: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// Absent earnings count as zero
    pub earnings: Option<f64>,
    pub ride_type: Option<String>,
}

impl Ride {
    /// Parse a decoded Firestore document.
    /// Returns `None` when the driver or status field is missing or unreadable.
    pub fn from_document(id: &str, data: &Value) -> Option<Self> {
        let driver_id = data.get("driver_id").and_then(|v| v.as_str())?;
        let status = data
            .get("status")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())?;

        Some(Self {
            id: id.to_string(),
            driver_id: driver_id.to_string(),
            driver_name: string_field(data, "driver_name"),
            status,
            title: string_field(data, "ride_title"),
            origin: string_field(data, "ride_source_location_name"),
            destination: string_field(data, "ride_destination_name"),
            earnings: data
                .get("ride_earnings")
                .and_then(|v| v.as_f64())
                .filter(|e| e.is_finite() && *e >= 0.0),
            ride_type: string_field(data, "ride_type"),
        })
    }

    pub fn earnings_or_zero(&self) -> f64 {
        self.earnings.unwrap_or(0.0)
    }
}

/// Non-empty string field, if present
pub(crate) fn string_field(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_document() {
        let doc = json!({
            "driver_id": "drv-1",
            "driver_name": "Juan Dela Cruz",
            "status": "completed",
            "ride_title": "Airport run",
            "ride_source_location_name": "Makati",
            "ride_destination_name": "NAIA T3",
            "ride_earnings": 350,
            "ride_type": "sedan"
        });
        let ride = Ride::from_document("r1", &doc).unwrap();
        assert_eq!(ride.id, "r1");
        assert_eq!(ride.status, RideStatus::Completed);
        assert_eq!(ride.earnings, Some(350.0));
        assert_eq!(ride.origin.as_deref(), Some("Makati"));
    }

    #[test]
    fn test_missing_earnings_is_zero() {
        let doc = json!({ "driver_id": "drv-1", "status": "pending" });
        let ride = Ride::from_document("r2", &doc).unwrap();
        assert_eq!(ride.earnings_or_zero(), 0.0);
        assert!(ride.title.is_none());
    }

    #[test]
    fn test_malformed_documents_rejected() {
        assert!(Ride::from_document("r3", &json!({ "status": "completed" })).is_none());
        assert!(Ride::from_document("r4", &json!({ "driver_id": "d", "status": "lost" })).is_none());
    }

    #[test]
    fn test_status_round_trip_names() {
        assert_eq!("Cancelled".parse::<RideStatus>(), Ok(RideStatus::Cancelled));
        assert_eq!(RideStatus::Ongoing.as_str(), "ongoing");
        assert!("done".parse::<RideStatus>().is_err());
    }
}
