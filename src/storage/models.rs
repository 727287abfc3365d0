//! Canonical telemetry record.
//!
//! Every export layout is unified into [`TelemetryRecord`]; this is also
//! the persisted representation (instants as ISO-8601 strings).

use serde::{Deserialize, Serialize};

use crate::extraction::instant::Timestamp;

/// A unified telemetry reading.
///
/// `duration` is derived from `start_time`/`end_time` at unification time
/// and is `None` when either bound is the invalid instant. Missing or
/// non-numeric `temperature`/`vibration` values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: String,
    pub device_id: String,
    pub location: String,
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub start_time: Timestamp,
    #[serde(default)]
    pub end_time: Timestamp,
    pub status: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub vibration: Option<f64>,
    #[serde(default)]
    pub device_type: String,
}

impl TelemetryRecord {
    /// True when every field other than `id` matches.
    pub fn same_reading(&self, other: &TelemetryRecord) -> bool {
        self.device_id == other.device_id
            && self.location == other.location
            && self.timestamp == other.timestamp
            && self.start_time == other.start_time
            && self.end_time == other.end_time
            && self.status == other.status
            && self.temperature == other.temperature
            && self.duration == other.duration
            && self.vibration == other.vibration
            && self.device_type == other.device_type
    }
}
