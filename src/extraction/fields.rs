//! Lax JSON scalar conversions.
//!
//! Optional fields in telemetry exports are not type-checked by shape
//! detection, so they are read here with best-effort coercion.

use serde_json::Value;

/// Convert a JSON value to text for passthrough fields.
///
/// Missing values become the empty string.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(), // Arrays and objects as JSON strings
    }
}

/// Convert a JSON value to a float if possible.
pub fn value_to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
        _ => None,
    }
}

/// Format a float the way the export and table views print numbers.
///
/// Whole values drop the fractional part (`50`, not `50.0`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoid printing "-0".
        return "0".to_string();
    }
    format!("{}", value)
}
