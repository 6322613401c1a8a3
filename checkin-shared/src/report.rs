//! Attendance report: a class's check-ins over a date range, grouped by day

use crate::error::ServiceError;
use crate::models::attendance::{Attendance, AttendanceRecord};
use crate::models::dance_class::DanceClass;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::debug;

/// Days covered by a report when no start date is given
pub const DEFAULT_RANGE_DAYS: i64 = 7;

/// Date format of the report's query parameters
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A query parameter that was not a `YYYY-MM-DD` date
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} '{value}', expected YYYY-MM-DD")]
pub struct InvalidDate {
    pub field: &'static str,
    pub value: String,
}

impl ReportRange {
    /// The last seven days through today
    pub fn default_for(today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(DEFAULT_RANGE_DAYS),
            end: today,
        }
    }

    /// Builds a range from optional query values
    ///
    /// Missing or blank values take their default. Malformed values also
    /// take their default and are returned alongside the range so the
    /// caller can tell the user.
    pub fn from_query(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> (Self, Vec<InvalidDate>) {
        let defaults = Self::default_for(today);
        let mut invalid = Vec::new();

        let mut parse = |field: &'static str, raw: Option<&str>, fallback: NaiveDate| {
            match raw.map(str::trim).filter(|value| !value.is_empty()) {
                None => fallback,
                Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT).unwrap_or_else(|_| {
                    invalid.push(InvalidDate {
                        field,
                        value: value.to_string(),
                    });
                    fallback
                }),
            }
        };

        let start = parse("start_date", start, defaults.start);
        let end = parse("end_date", end, defaults.end);

        (Self { start, end }, invalid)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Check-ins of one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup {
    pub date: NaiveDate,

    /// Always equal to `records.len()`
    pub count: usize,

    /// Ordered by check-in time
    pub records: Vec<AttendanceRecord>,
}

/// Report for one class
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReport {
    pub class: DanceClass,
    pub range: ReportRange,

    /// Newest day first
    pub groups: Vec<DateGroup>,
}

impl AttendanceReport {
    /// Check-ins across all days
    pub fn total(&self) -> usize {
        self.groups.iter().map(|group| group.count).sum()
    }
}

/// Groups check-ins by day, newest day first
pub fn group_by_date(records: Vec<AttendanceRecord>) -> Vec<DateGroup> {
    let mut by_date: BTreeMap<NaiveDate, Vec<AttendanceRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date).or_default().push(record);
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, mut records)| {
            records.sort_by(|a, b| a.time_in.cmp(&b.time_in).then(a.id.cmp(&b.id)));
            DateGroup {
                date,
                count: records.len(),
                records,
            }
        })
        .collect()
}

/// Builds the attendance report of a class
///
/// # Errors
///
/// [`ServiceError::ClassNotFound`] when the class id is unknown.
pub async fn attendance_report(
    pool: &SqlitePool,
    class_id: i64,
    range: ReportRange,
) -> Result<AttendanceReport, ServiceError> {
    let class = DanceClass::find_by_id(pool, class_id)
        .await?
        .ok_or(ServiceError::ClassNotFound(class_id))?;

    let records = Attendance::list_for_class_between(pool, class_id, range.start, range.end).await?;
    debug!(
        class_id,
        start = %range.start,
        end = %range.end,
        records = records.len(),
        "Building attendance report"
    );

    Ok(AttendanceReport {
        class,
        range,
        groups: group_by_date(records),
    })
}
