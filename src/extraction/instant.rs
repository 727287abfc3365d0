//! Instant parsing.
//!
//! Telemetry exports carry instants either as epoch milliseconds (flat
//! exports) or ISO-8601 strings (nested exports). Parsing is lax: anything
//! that cannot be read becomes the invalid instant instead of an error, and
//! the invalid instant survives persistence as `null`.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Offset-less layouts, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A point in time, or the invalid instant.
///
/// Invalid instants order before every valid one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(Option<DateTime<Utc>>);

impl Timestamp {
    pub const INVALID: Timestamp = Timestamp(None);

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp(Some(dt))
    }

    /// Epoch milliseconds; fractional milliseconds are truncated.
    pub fn from_millis(ms: f64) -> Self {
        if !ms.is_finite() {
            return Self::INVALID;
        }
        Timestamp(DateTime::<Utc>::from_timestamp_millis(ms.trunc() as i64))
    }

    /// Parse an ISO-8601 date, date-time, or RFC 3339 string.
    pub fn parse(text: &str) -> Self {
        Timestamp(parse_iso(text))
    }

    /// Read an instant from any JSON value: numbers are epoch milliseconds,
    /// strings are ISO-8601, everything else is invalid.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(Self::from_millis).unwrap_or(Self::INVALID),
            Value::String(s) => Self::parse(s),
            _ => Self::INVALID,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn millis(&self) -> Option<i64> {
        self.0.map(|dt| dt.timestamp_millis())
    }

    /// `2024-01-01T00:00:00.000Z`
    pub fn to_iso(&self) -> Option<String> {
        self.0
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn format(&self, pattern: &str) -> Option<String> {
        self.0.map(|dt| dt.format(pattern).to_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::from_datetime(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_iso() {
            Some(iso) => f.write_str(&iso),
            None => f.write_str("Invalid Date"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_iso() {
            Some(iso) => serializer.serialize_str(&iso),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Timestamp::from_json(&value))
    }
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, pattern) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for pattern in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
