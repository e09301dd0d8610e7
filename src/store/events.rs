//! Event book: events by id, an ordered date index, and the per-day count.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::errors::AppError;
use crate::models::{CreateEventRequest, Event, UpdateEventRequest};
use crate::validation::{parse_date, require_title, validate_event_range};

/// In-memory event collection.
///
/// `day_counts` is maintained incrementally; every path that inserts or
/// removes a record adjusts it in the same call.
#[derive(Debug, Default)]
pub struct EventBook {
    events: HashMap<String, Event>,
    by_date: BTreeMap<NaiveDate, BTreeSet<(NaiveTime, String)>>,
    day_counts: HashMap<NaiveDate, usize>,
}

impl EventBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a new event under a fresh id.
    pub fn create(&mut self, request: CreateEventRequest) -> Result<Event, AppError> {
        require_title(&request.title)?;
        let slot = validate_event_range(&request.date, &request.start_time, &request.end_time)?;

        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title,
            description: request.description.unwrap_or_default(),
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
        };

        self.insert_record(event.clone());
        tracing::debug!("Created event {} on {}", event.id, event.date);
        Ok(event)
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.get(id)
    }

    /// All events ordered by date, then start time.
    pub fn list(&self) -> Vec<Event> {
        self.by_date
            .values()
            .flat_map(|slots| slots.iter())
            .filter_map(|(_, id)| self.events.get(id).cloned())
            .collect()
    }

    /// Events on one day. An unparsable day yields nothing.
    pub fn list_for_day(&self, raw_date: &str) -> Vec<Event> {
        let Ok(date) = parse_date(raw_date) else {
            return Vec::new();
        };

        self.by_date
            .get(&date)
            .map(|slots| {
                slots
                    .iter()
                    .filter_map(|(_, id)| self.events.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Current aggregate count for one day.
    pub fn day_count(&self, date: NaiveDate) -> usize {
        self.day_counts.get(&date).copied().unwrap_or(0)
    }

    /// Per-day counts for every day of a month, keyed `YYYY-MM-DD`.
    pub fn count_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<String, usize>, AppError> {
        if !(1..=12).contains(&month) {
            return Err(AppError::InvalidArgument(format!(
                "Invalid month {}. Month must be between 1 and 12",
                month
            )));
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::InvalidArgument(format!("Invalid year {}", year)))?;

        Ok(first
            .iter_days()
            .take_while(|day| day.month() == month)
            .map(|day| (day.format("%Y-%m-%d").to_string(), self.day_count(day)))
            .collect())
    }

    /// Merge a partial update onto an existing event and re-validate it.
    pub fn update(&mut self, id: &str, patch: UpdateEventRequest) -> Result<Event, AppError> {
        let existing = self
            .events
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;

        let title = patch.title.unwrap_or_else(|| existing.title.clone());
        require_title(&title)?;

        let date = patch
            .date
            .unwrap_or_else(|| existing.date.format("%Y-%m-%d").to_string());
        let start = patch
            .start_time
            .unwrap_or_else(|| existing.start_time.format("%H:%M").to_string());
        let end = patch
            .end_time
            .unwrap_or_else(|| existing.end_time.format("%H:%M").to_string());
        let slot = validate_event_range(&date, &start, &end)?;

        let updated = Event {
            id: id.to_string(),
            title,
            description: patch
                .description
                .unwrap_or_else(|| existing.description.clone()),
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
        };

        self.remove_record(id);
        self.insert_record(updated.clone());
        tracing::debug!("Updated event {}", id);
        Ok(updated)
    }

    /// Remove an event. Returns false if it did not exist.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.remove_record(id).is_some();
        if removed {
            tracing::debug!("Deleted event {}", id);
        }
        removed
    }

    fn insert_record(&mut self, event: Event) {
        self.by_date
            .entry(event.date)
            .or_default()
            .insert((event.start_time, event.id.clone()));
        *self.day_counts.entry(event.date).or_insert(0) += 1;
        self.events.insert(event.id.clone(), event);
    }

    fn remove_record(&mut self, id: &str) -> Option<Event> {
        let event = self.events.remove(id)?;

        if let Some(slots) = self.by_date.get_mut(&event.date) {
            slots.remove(&(event.start_time, event.id.clone()));
            if slots.is_empty() {
                self.by_date.remove(&event.date);
            }
        }

        if let Some(count) = self.day_counts.get_mut(&event.date) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.day_counts.remove(&event.date);
            }
        }

        Some(event)
    }

    #[cfg(test)]
    fn tracked_days(&self) -> usize {
        self.day_counts.len()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.events.len()
    }
}
