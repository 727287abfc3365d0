//! Multi-criteria record filtering.
//!
//! Every constraint in a [`FilterSpec`] is optional and they compose with
//! logical AND. Records whose value for a dimension is undefined (invalid
//! instant, missing number) are never excluded by that dimension's bounds.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};
use crate::storage::models::TelemetryRecord;

/// Status value that selects every status.
pub const ALL_STATUSES: &str = "all";

/// Filter constraints over canonical records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Case-insensitive substring of device_id or location.
    pub search: Option<String>,
    /// Exact status; `"all"` is no constraint.
    pub status: Option<String>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub duration_min: Option<f64>,
    pub duration_max: Option<f64>,
    /// Compared from 00:00:00.000 UTC of this day.
    pub date_from: Option<NaiveDate>,
    /// Compared up to 23:59:59.999 UTC of this day.
    pub date_to: Option<NaiveDate>,
}

/// Text form of a filter, as entered in the filter panel.
///
/// Empty strings mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterForm {
    pub search: String,
    pub status: String,
    pub temperature_min: String,
    pub temperature_max: String,
    pub duration_min: String,
    pub duration_max: String,
    pub date_from: String,
    pub date_to: String,
}

impl FilterSpec {
    /// Parse the text form.
    ///
    /// Numeric bounds take the leading number of the text; a bound with no
    /// leading number is dropped. Dates must be `YYYY-MM-DD`.
    pub fn from_form(form: &FilterForm) -> Result<Self> {
        Ok(Self {
            search: non_empty(&form.search),
            status: non_empty(&form.status),
            temperature_min: parse_float_prefix(&form.temperature_min),
            temperature_max: parse_float_prefix(&form.temperature_max),
            duration_min: parse_float_prefix(&form.duration_min),
            duration_max: parse_float_prefix(&form.duration_max),
            date_from: parse_date(&form.date_from)?,
            date_to: parse_date(&form.date_to)?,
        })
    }

    /// True when no constraint is active.
    pub fn is_empty(&self) -> bool {
        self.search_needle().is_none()
            && self.status_constraint().is_none()
            && self.temperature_min.is_none()
            && self.temperature_max.is_none()
            && self.duration_min.is_none()
            && self.duration_max.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn status_constraint(&self) -> Option<&str> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty() && *s != ALL_STATUSES)
    }

    /// Evaluate every active constraint against one record.
    pub fn matches(&self, record: &TelemetryRecord) -> bool {
        self.matches_with(record, self.search_needle().as_deref())
    }

    fn matches_with(&self, record: &TelemetryRecord, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            let hit = record.device_id.to_lowercase().contains(needle)
                || record.location.to_lowercase().contains(needle);
            if !hit {
                return false;
            }
        }

        if let Some(status) = self.status_constraint() {
            if record.status != status {
                return false;
            }
        }

        if !within(record.temperature, self.temperature_min, self.temperature_max) {
            return false;
        }

        if !within(
            record.duration.map(|d| d as f64),
            self.duration_min,
            self.duration_max,
        ) {
            return false;
        }

        if let Some(at) = record.timestamp.as_datetime() {
            if let Some(from) = self.date_from.and_then(start_of_day) {
                if at < from {
                    return false;
                }
            }
            if let Some(to) = self.date_to.and_then(end_of_day) {
                if at > to {
                    return false;
                }
            }
        }

        true
    }
}

/// Inclusive range check; an undefined value passes.
fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    let Some(value) = value else {
        return true;
    };
    if let Some(min) = min {
        if value < min {
            return false;
        }
    }
    if let Some(max) = max {
        if value > max {
            return false;
        }
    }
    true
}

pub fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_milli_opt(0, 0, 0, 0).map(|naive| naive.and_utc())
}

pub fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .map(|naive| naive.and_utc())
}

/// Records satisfying `spec`, borrowed, in input order.
pub fn filter_records<'a>(
    records: &'a [TelemetryRecord],
    spec: &FilterSpec,
) -> Vec<&'a TelemetryRecord> {
    let needle = spec.search_needle();
    let selected: Vec<&TelemetryRecord> = records
        .iter()
        .filter(|record| spec.matches_with(record, needle.as_deref()))
        .collect();

    log::debug!(
        "FILTER_APPLIED total={} matched={} active={}",
        records.len(),
        selected.len(),
        !spec.is_empty()
    );
    selected
}

/// Records satisfying `spec`, cloned, in input order.
pub fn apply_filters(records: &[TelemetryRecord], spec: &FilterSpec) -> Vec<TelemetryRecord> {
    filter_records(records, spec).into_iter().cloned().collect()
}

/// Sorted distinct statuses across `records`.
pub fn unique_statuses(records: &[TelemetryRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.status.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn parse_date(text: &str) -> Result<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| TelemetryError::InvalidFilter(format!("date {:?}: {}", text, e)))
}

/// Leading decimal number of `text`, ignoring trailing garbage
/// (`"12.5abc"` is 12.5, `"abc"` is none).
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let mantissa_start = end;
    end = digits(end);
    let int_digits = end - mantissa_start;
    let mut frac_digits = 0;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_end = digits(end + 1);
        frac_digits = frac_end - (end + 1);
        end = frac_end;
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_end = digits(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}
