//! Date and time validation for events and tasks.
//!
//! Every function here is pure: it parses, checks, and either returns the typed
//! value or an `AppError::Validation`. Callers decide how to surface the failure.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::errors::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Offset-less timestamp layouts accepted for task times, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A validated event slot: one day with start strictly before end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Parse a `YYYY-MM-DD` calendar day.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

/// Parse an `HH:mm` time of day.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid time '{}', expected HH:mm", raw)))
}

/// Parse an ISO-8601 task timestamp into UTC.
pub fn parse_task_time(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(day) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Ok(day.and_time(NaiveTime::MIN).and_utc());
    }

    Err(AppError::Validation(format!(
        "Invalid task time '{}', expected an ISO-8601 timestamp",
        raw
    )))
}

/// Validate an event's date and time range.
pub fn validate_event_range(date: &str, start: &str, end: &str) -> Result<EventSlot, AppError> {
    let date = parse_date(date)?;
    let start_time = parse_time_of_day(start)?;
    let end_time = parse_time_of_day(end)?;

    if date.and_time(start_time) >= date.and_time(end_time) {
        return Err(AppError::Validation(
            "End time must be after start time".to_string(),
        ));
    }

    Ok(EventSlot {
        date,
        start_time,
        end_time,
    })
}

/// Validate that a task time lies strictly after `now`.
pub fn validate_task_time(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
    let time = parse_task_time(raw)?;
    if time <= now {
        return Err(AppError::Validation(
            "Task time must be in the future".to_string(),
        ));
    }
    Ok(time)
}

/// Reject blank titles.
pub fn require_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    Ok(())
}
