//! CSV export.
//!
//! Nine fixed columns, every field double-quoted, one row per record in
//! view order. Lines are joined with `\n` and there is no trailing newline.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Result, TelemetryError};
use crate::extraction::fields::format_number;
use crate::extraction::instant::Timestamp;
use crate::storage::models::TelemetryRecord;

pub type Accessor = fn(&TelemetryRecord) -> String;

/// Export columns as (header, accessor), in output order.
pub const EXPORT_COLUMNS: [(&str, Accessor); 9] = [
    ("Device ID", |r| r.device_id.clone()),
    ("Location", |r| r.location.clone()),
    ("Timestamp", |r| iso_or_empty(r.timestamp)),
    ("Start Time", |r| iso_or_empty(r.start_time)),
    ("End Time", |r| iso_or_empty(r.end_time)),
    ("Status", |r| r.status.clone()),
    ("Temperature", |r| number_or_empty(r.temperature)),
    ("Duration (min)", |r| r.duration.map(|d| d.to_string()).unwrap_or_default()),
    ("Vibration", |r| number_or_empty(r.vibration)),
];

fn iso_or_empty(ts: Timestamp) -> String {
    ts.to_iso().unwrap_or_default()
}

fn number_or_empty(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

/// Wrap a field in double quotes, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render records as CSV text (header plus one line per record).
pub fn to_csv<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a TelemetryRecord>,
{
    let mut lines = vec![csv_line(EXPORT_COLUMNS.iter().map(|(header, _)| *header))];
    lines.extend(
        records
            .into_iter()
            .map(|record| csv_line(EXPORT_COLUMNS.iter().map(|(_, get)| get(record)))),
    );
    lines.join("\n")
}

/// `telemetry_data_<YYYY-MM-DD>.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("telemetry_data_{}.csv", date.format("%Y-%m-%d"))
}

/// Write the export for `records` into `dir`, named after the UTC date of
/// `now`. Returns the written path.
pub fn write_export(
    dir: &Path,
    records: &[TelemetryRecord],
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    if records.is_empty() {
        return Err(TelemetryError::NothingToExport);
    }

    let path = dir.join(export_file_name(now.date_naive()));
    fs::write(&path, to_csv(records)).map_err(|source| TelemetryError::Storage {
        path: path.clone(),
        source,
    })?;

    log::info!(
        "EXPORT_WRITTEN path={} rows={}",
        path.display(),
        records.len()
    );
    Ok(path)
}
