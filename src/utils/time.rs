// Timestamp normalization
// Firestore hands timestamps back in a few shapes depending on the client

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Normalize a stored timestamp into a single instant type.
///
/// Accepted shapes:
/// * RFC 3339 string (Firestore REST `timestampValue`)
/// * `{ "seconds": .., "nanoseconds": .. }` wrapper (web SDK `Timestamp`)
/// * `{ "_seconds": .., "_nanoseconds": .. }` wrapper (admin SDK JSON export)
/// * bare integer, milliseconds since the epoch
///
/// Anything else is treated as malformed and yields `None`.
pub fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::Object(obj) => {
            let seconds = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(as_i64_lenient)?;
            let nanos = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(as_i64_lenient)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok()?;
            Utc.timestamp_opt(seconds, nanos).single()
        }
        _ => None,
    }
}

/// Integer fields sometimes come back as strings (Firestore `integerValue`)
fn as_i64_lenient(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
