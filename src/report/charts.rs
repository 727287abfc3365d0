//! Chart series: temperature over time and status distribution.

use crate::storage::models::TelemetryRecord;

/// Axis label pattern for the temperature series (`Jan 15 10:05`).
pub const CHART_TIME_FORMAT: &str = "%b %d %H:%M";

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: Option<f64>,
}

/// Temperature readings ordered by timestamp (invalid instants first,
/// ties keep input order).
pub fn temperature_series(records: &[TelemetryRecord]) -> Vec<SeriesPoint> {
    let mut ordered: Vec<&TelemetryRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.timestamp);

    ordered
        .into_iter()
        .map(|record| SeriesPoint {
            label: record
                .timestamp
                .format(CHART_TIME_FORMAT)
                .unwrap_or_else(|| "Invalid Date".to_string()),
            value: record.temperature,
        })
        .collect()
}

/// Record count per status, in first-seen order.
pub fn status_counts(records: &[TelemetryRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in records {
        match counts.iter_mut().find(|(status, _)| *status == record.status) {
            Some((_, count)) => *count += 1,
            None => counts.push((record.status.clone(), 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::instant::Timestamp;

    fn record(at: &str, status: &str, temp: f64) -> TelemetryRecord {
        TelemetryRecord {
            id: at.to_string(),
            device_id: "D1".to_string(),
            location: "L1".to_string(),
            timestamp: Timestamp::parse(at),
            start_time: Timestamp::INVALID,
            end_time: Timestamp::INVALID,
            status: status.to_string(),
            temperature: Some(temp),
            duration: None,
            vibration: None,
            device_type: String::new(),
        }
    }

    #[test]
    fn test_temperature_series_sorted_by_time() {
        let records = vec![
            record("2024-01-15T12:00:00Z", "Healthy", 30.0),
            record("2024-01-15T08:30:00Z", "Healthy", 20.0),
            record("garbage", "Healthy", 10.0),
        ];
        let series = temperature_series(&records);
        let values: Vec<_> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(10.0), Some(20.0), Some(30.0)]);
        assert_eq!(series[0].label, "Invalid Date");
        assert_eq!(series[1].label, "Jan 15 08:30");
    }

    #[test]
    fn test_status_counts_first_seen_order() {
        let records = vec![
            record("2024-01-15T12:00:00Z", "Warning", 1.0),
            record("2024-01-15T12:00:00Z", "Healthy", 1.0),
            record("2024-01-15T12:00:00Z", "Warning", 1.0),
        ];
        assert_eq!(
            status_counts(&records),
            vec![("Warning".to_string(), 2), ("Healthy".to_string(), 1)]
        );
    }
}
