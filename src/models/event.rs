//! Event model matching the frontend Event interface.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A calendar entry bound to one day with a start and end time-of-day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub start_time: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end_time: NaiveTime,
}

/// Request body for creating (or wholesale replacing) an event.
///
/// Date and times stay textual here so malformed values surface as
/// validation errors rather than body rejections.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

/// Request body for partially updating an event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl From<CreateEventRequest> for UpdateEventRequest {
    fn from(request: CreateEventRequest) -> Self {
        Self {
            title: Some(request.title),
            description: Some(request.description.unwrap_or_default()),
            date: Some(request.date),
            start_time: Some(request.start_time),
            end_time: Some(request.end_time),
        }
    }
}

/// Serde adapter for `HH:mm` time-of-day strings.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_format() {
        let event = Event {
            id: "e1".to_string(),
            title: "Standup".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["date"], "2024-03-01");
        assert_eq!(value["startTime"], "09:00");
        assert_eq!(value["endTime"], "09:15");

        let back: Event = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_update_request_allows_missing_fields() {
        let request: UpdateEventRequest =
            serde_json::from_value(json!({ "title": "Renamed" })).unwrap();
        assert_eq!(request.title.as_deref(), Some("Renamed"));
        assert!(request.date.is_none());
        assert!(request.start_time.is_none());
    }
}
