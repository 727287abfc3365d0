//! Filtered dashboard view and table rendering.

use std::fmt;

use crate::error::Result;
use crate::extraction::fields::format_number;
use crate::routing::filter::{apply_filters, unique_statuses, FilterSpec};
use crate::storage::models::TelemetryRecord;
use crate::storage::store::TelemetryStore;

/// Display pattern for table timestamps (`Jan 15, 2024 10:00`).
pub const TABLE_TIME_FORMAT: &str = "%b %d, %Y %H:%M";

/// The stored collection seen through one filter.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub total: usize,
    pub filtered: Vec<TelemetryRecord>,
    /// Distinct statuses across the unfiltered collection.
    pub statuses: Vec<String>,
}

impl DashboardView {
    pub fn build(all: &[TelemetryRecord], spec: &FilterSpec) -> Self {
        Self {
            total: all.len(),
            filtered: apply_filters(all, spec),
            statuses: unique_statuses(all),
        }
    }

    pub fn load<S>(store: &S, spec: &FilterSpec) -> Result<Self>
    where
        S: TelemetryStore + ?Sized,
    {
        let all = store.load_all()?;
        Ok(Self::build(&all, spec))
    }

    /// `Showing X of Y records`
    pub fn summary_line(&self) -> String {
        format!("Showing {} of {} records", self.filtered.len(), self.total)
    }
}

/// Badge category for a status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSeverity {
    Healthy,
    Warning,
    Error,
    Unknown,
}

impl StatusSeverity {
    /// Keyword match on the lowercased status; earlier categories win.
    pub fn classify(status: &str) -> Self {
        let status = status.to_lowercase();
        if status.contains("healthy") || status.contains("success") {
            StatusSeverity::Healthy
        } else if status.contains("warning") || status.contains("overheat") {
            StatusSeverity::Warning
        } else if status.contains("error") || status.contains("fail") {
            StatusSeverity::Error
        } else {
            StatusSeverity::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusSeverity::Healthy => "healthy",
            StatusSeverity::Warning => "warning",
            StatusSeverity::Error => "error",
            StatusSeverity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const TABLE_HEADERS: [&str; 8] = [
    "Device ID",
    "Location",
    "Status",
    "Severity",
    "Temperature",
    "Vibration",
    "Duration",
    "Timestamp",
];

fn table_cells(record: &TelemetryRecord) -> [String; 8] {
    [
        record.device_id.clone(),
        record.location.clone(),
        record.status.clone(),
        StatusSeverity::classify(&record.status).to_string(),
        record
            .temperature
            .map(|t| format!("{}°C", format_number(t)))
            .unwrap_or_default(),
        record.vibration.map(format_number).unwrap_or_default(),
        record
            .duration
            .map(|d| format!("{} min", d))
            .unwrap_or_default(),
        record
            .timestamp
            .format(TABLE_TIME_FORMAT)
            .unwrap_or_else(|| "Invalid Date".to_string()),
    ]
}

/// Render records as an aligned text table.
pub fn render_table(records: &[TelemetryRecord]) -> String {
    if records.is_empty() {
        return "No data matches the current filters".to_string();
    }

    let rows: Vec<[String; 8]> = records.iter().map(table_cells).collect();
    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let pad = |cells: &[&str]| {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![pad(&TABLE_HEADERS)];
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(pad(&cells));
    }
    lines.join("\n")
}
