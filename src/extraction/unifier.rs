//! Unification of raw readings into [`TelemetryRecord`]s.

use uuid::Uuid;

use crate::extraction::fields::{value_to_float, value_to_string};
use crate::extraction::instant::Timestamp;
use crate::storage::models::TelemetryRecord;
use crate::validation::shape::{FlatReading, NestedReading, RawReading};

/// Length of generated record ids.
const RECORD_ID_LEN: usize = 9;

/// Generate a short random record id.
///
/// Uniqueness is best-effort; collisions are not checked.
pub fn generate_record_id() -> String {
    Uuid::new_v4().simple().to_string()[..RECORD_ID_LEN].to_string()
}

/// Whole minutes between two instants, rounded half up.
///
/// Negative when `end` precedes `start`; `None` if either is invalid.
pub fn duration_minutes(start: Timestamp, end: Timestamp) -> Option<i64> {
    let (start, end) = (start.millis()?, end.millis()?);
    let minutes = (end - start) as f64 / 1000.0 / 60.0;
    Some((minutes + 0.5).floor() as i64)
}

/// Join the nested layout's location hierarchy as `country/state/plant/block`.
pub fn join_location(parts: [&str; 4]) -> String {
    parts.join("/")
}

/// Unify a detected reading into the canonical record.
pub fn unify(reading: &RawReading) -> TelemetryRecord {
    match reading {
        RawReading::Flat(flat) => unify_flat(flat),
        RawReading::Nested(nested) => unify_nested(nested),
    }
}

fn unify_flat(raw: &FlatReading) -> TelemetryRecord {
    let start_time = Timestamp::from_json(&raw.start_time);
    let end_time = Timestamp::from_json(&raw.end_time);

    TelemetryRecord {
        id: generate_record_id(),
        device_id: raw.device_id.clone(),
        location: raw.location.clone(),
        timestamp: Timestamp::from_millis(raw.timestamp),
        start_time,
        end_time,
        status: raw.operation_status.clone(),
        temperature: value_to_float(&raw.temp),
        duration: duration_minutes(start_time, end_time),
        vibration: value_to_float(&raw.vibration),
        device_type: value_to_string(&raw.device_type),
    }
}

fn unify_nested(raw: &NestedReading) -> TelemetryRecord {
    let start_time = Timestamp::parse(&raw.start_time);
    let end_time = Timestamp::from_json(&raw.end_time);

    let country = value_to_string(&raw.country);
    let state = value_to_string(&raw.state);
    let plant = value_to_string(&raw.plant);
    let block = value_to_string(&raw.block);

    TelemetryRecord {
        id: generate_record_id(),
        device_id: raw.device.id.clone(),
        location: join_location([&country, &state, &plant, &block]),
        timestamp: Timestamp::from_json(&raw.timestamp),
        start_time,
        end_time,
        status: raw.data.status.clone(),
        temperature: value_to_float(&raw.data.temperature),
        duration: duration_minutes(start_time, end_time),
        vibration: value_to_float(&raw.data.vibration),
        device_type: value_to_string(&raw.device.kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::shape::detect_shape;
    use serde_json::{json, Value};

    fn reading(value: Value) -> RawReading {
        detect_shape(&value).into_reading().unwrap()
    }

    #[test]
    fn test_unify_flat() {
        let record = unify(&reading(json!({
            "deviceID": "D1",
            "location": "L1",
            "timestamp": 1000,
            "startTime": 0,
            "endTime": 600000,
            "operationStatus": "Healthy",
            "temp": 50,
            "vibration": 0.1,
            "deviceType": "pump"
        })));

        assert_eq!(record.device_id, "D1");
        assert_eq!(record.location, "L1");
        assert_eq!(record.status, "Healthy");
        assert_eq!(record.duration, Some(10));
        assert_eq!(record.temperature, Some(50.0));
        assert_eq!(record.vibration, Some(0.1));
        assert_eq!(record.device_type, "pump");
        assert_eq!(record.timestamp.millis(), Some(1000));
        assert_eq!(record.id.len(), RECORD_ID_LEN);
    }

    #[test]
    fn test_unify_nested() {
        let record = unify(&reading(json!({
            "device": {"id": "N1", "type": "press"},
            "startTime": "2024-01-01T00:00:00Z",
            "endTime": "2024-01-01T01:30:00Z",
            "timestamp": "2024-01-01T00:45:00Z",
            "country": "US",
            "state": "CA",
            "plant": "P1",
            "block": "B1",
            "data": {"status": "Warning", "temperature": 71.5, "vibration": 0.4}
        })));

        assert_eq!(record.device_id, "N1");
        assert_eq!(record.location, "US/CA/P1/B1");
        assert_eq!(record.status, "Warning");
        assert_eq!(record.duration, Some(90));
        assert_eq!(record.device_type, "press");
        assert_eq!(
            record.timestamp.to_iso().as_deref(),
            Some("2024-01-01T00:45:00.000Z")
        );
    }

    #[test]
    fn test_location_keeps_empty_components() {
        let record = unify(&reading(json!({
            "device": {"id": "N2"},
            "startTime": "2024-01-01T00:00:00Z",
            "country": "US",
            "state": "",
            "block": "B7",
            "data": {"status": "Healthy"}
        })));
        assert_eq!(record.location, "US///B7");
        assert_eq!(record.duration, None);
        assert!(!record.end_time.is_valid());
    }

    #[test]
    fn test_duration_rounding() {
        let at = |ms: f64| Timestamp::from_millis(ms);
        assert_eq!(duration_minutes(at(0.0), at(89_999.0)), Some(1));
        assert_eq!(duration_minutes(at(0.0), at(90_000.0)), Some(2));
        assert_eq!(duration_minutes(at(0.0), at(29_999.0)), Some(0));
        assert_eq!(duration_minutes(at(600_000.0), at(0.0)), Some(-10));
        // Half rounds toward positive infinity.
        assert_eq!(duration_minutes(at(30_000.0), at(0.0)), Some(0));
        assert_eq!(duration_minutes(at(90_000.0), at(0.0)), Some(-1));
        assert_eq!(duration_minutes(Timestamp::INVALID, at(0.0)), None);
    }

    #[test]
    fn test_unify_is_deterministic_except_id() {
        let raw = reading(json!({
            "deviceID": "D1",
            "location": "L1",
            "timestamp": 1000,
            "startTime": 0,
            "endTime": 600000,
            "operationStatus": "Healthy",
            "temp": 50,
            "vibration": 0.1
        }));
        let a = unify(&raw);
        let b = unify(&raw);
        assert!(a.same_reading(&b));
    }
}
