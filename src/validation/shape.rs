//! Telemetry export shape detection.
//!
//! Two export layouts are recognized. Detection decodes the value against
//! each layout in priority order (flat first) and yields a tagged
//! [`RawReading`]; only the fields that identify a layout are type-checked,
//! the rest are kept as raw JSON and coerced during unification.

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::logging::structured::LogContext;

/// Flat export: one object per reading, epoch-millisecond instants.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatReading {
    #[serde(rename = "deviceID")]
    pub device_id: String,
    pub location: String,
    pub timestamp: f64,
    #[serde(rename = "operationStatus")]
    pub operation_status: String,

    #[serde(rename = "deviceType", default)]
    pub device_type: Value,
    #[serde(rename = "startTime", default)]
    pub start_time: Value,
    #[serde(rename = "endTime", default)]
    pub end_time: Value,
    #[serde(default)]
    pub temp: Value,
    #[serde(default)]
    pub vibration: Value,
}

/// Nested export: device and data sub-objects, ISO-8601 instants and a
/// four-part location hierarchy.
#[derive(Debug, Clone, Deserialize)]
pub struct NestedReading {
    #[serde(deserialize_with = "sub_object")]
    pub device: DeviceRef,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(deserialize_with = "sub_object")]
    pub data: ReadingData,

    #[serde(rename = "endTime", default)]
    pub end_time: Value,
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub country: Value,
    #[serde(default)]
    pub state: Value,
    #[serde(default)]
    pub plant: Value,
    #[serde(default)]
    pub block: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRef {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadingData {
    pub status: String,
    #[serde(default)]
    pub temperature: Value,
    #[serde(default)]
    pub vibration: Value,
}

/// Decode a sub-record only from a JSON object. Serde would otherwise
/// accept a positional array for a struct.
fn sub_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Err(D::Error::custom("expected a JSON object"));
    }
    T::deserialize(value).map_err(D::Error::custom)
}

/// A raw value tagged with the layout it matched.
#[derive(Debug, Clone)]
pub enum RawReading {
    Flat(FlatReading),
    Nested(NestedReading),
}

impl RawReading {
    pub fn kind(&self) -> ShapeKind {
        match self {
            RawReading::Flat(_) => ShapeKind::Flat,
            RawReading::Nested(_) => ShapeKind::Nested,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Flat,
    Nested,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Flat => "flat",
            ShapeKind::Nested => "nested",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of shape detection.
#[derive(Debug, Clone)]
pub enum Detection {
    Recognized(RawReading),
    Unrecognized,
}

impl Detection {
    pub fn shape(&self) -> Option<ShapeKind> {
        match self {
            Detection::Recognized(reading) => Some(reading.kind()),
            Detection::Unrecognized => None,
        }
    }

    pub fn into_reading(self) -> Option<RawReading> {
        match self {
            Detection::Recognized(reading) => Some(reading),
            Detection::Unrecognized => None,
        }
    }
}

/// Detect the layout of a decoded JSON value.
///
/// First match wins: a value satisfying both layouts is flat.
pub fn detect_shape(value: &Value) -> Detection {
    if !value.is_object() {
        return Detection::Unrecognized;
    }

    if let Ok(flat) = FlatReading::deserialize(value) {
        return Detection::Recognized(RawReading::Flat(flat));
    }

    if let Ok(nested) = NestedReading::deserialize(value) {
        return Detection::Recognized(RawReading::Nested(nested));
    }

    Detection::Unrecognized
}

/// [`detect_shape`] with decision logging, scoped to reading `index` of
/// the file in `ctx`.
pub fn detect_shape_logged(value: &Value, index: usize, ctx: &LogContext) -> Detection {
    let ctx = ctx.at_reading(index);
    let detection = detect_shape(value);
    match detection.shape() {
        Some(shape) => log::debug!("{} SHAPE_MATCHED shape={}", ctx, shape),
        None => log::warn!(
            "{} SHAPE_UNKNOWN keys={:?}",
            ctx,
            value
                .as_object()
                .map(|obj| obj.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default()
        ),
    }
    detection
}
