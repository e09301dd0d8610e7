//! Task book: tasks by id plus an ordered due-time index.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::errors::AppError;
use crate::models::{CreateTaskRequest, Task, UpdateTaskRequest};
use crate::validation::{parse_date, require_title, validate_task_time};

/// In-memory task collection.
#[derive(Debug, Default)]
pub struct TaskBook {
    tasks: HashMap<String, Task>,
    by_time: BTreeSet<(DateTime<Utc>, String)>,
}

impl TaskBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a new task. `time` must lie after `now`.
    pub fn create(
        &mut self,
        request: CreateTaskRequest,
        now: DateTime<Utc>,
    ) -> Result<Task, AppError> {
        require_title(&request.title)?;
        let time = validate_task_time(&request.time, now)?;

        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title,
            description: request.description.unwrap_or_default(),
            time,
        };

        self.by_time.insert((task.time, task.id.clone()));
        self.tasks.insert(task.id.clone(), task.clone());
        tracing::debug!("Created task {} due {}", task.id, task.time);
        Ok(task)
    }

    pub fn get(&self, id: &str) -> Result<&Task, AppError> {
        self.tasks
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))
    }

    /// All tasks ordered by due time.
    pub fn list(&self) -> Vec<Task> {
        self.collect(self.by_time.iter())
    }

    /// Tasks whose due time falls on the given UTC day. An unparsable day yields nothing.
    pub fn list_for_day(&self, raw_date: &str) -> Vec<Task> {
        let Ok(date) = parse_date(raw_date) else {
            return Vec::new();
        };
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);

        self.collect(
            self.by_time
                .range((start, String::new())..)
                .take_while(|(time, _)| *time < end),
        )
    }

    /// Tasks due within `[from, to]`, both ends inclusive, ordered by due time.
    pub fn due_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Task> {
        if to < from {
            return Vec::new();
        }
        self.collect(
            self.by_time
                .range((from, String::new())..)
                .take_while(|(time, _)| *time <= to),
        )
    }

    /// Apply a partial update. A new `time` must lie after `now`.
    pub fn update(
        &mut self,
        id: &str,
        patch: UpdateTaskRequest,
        now: DateTime<Utc>,
    ) -> Result<Task, AppError> {
        let existing = self.get(id)?.clone();

        let title = patch.title.unwrap_or(existing.title);
        require_title(&title)?;
        let time = match patch.time {
            Some(raw) => validate_task_time(&raw, now)?,
            None => existing.time,
        };

        let updated = Task {
            id: existing.id,
            title,
            description: patch.description.unwrap_or(existing.description),
            time,
        };

        self.by_time.remove(&(existing.time, updated.id.clone()));
        self.by_time.insert((updated.time, updated.id.clone()));
        self.tasks.insert(updated.id.clone(), updated.clone());
        tracing::debug!("Updated task {}", id);
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), AppError> {
        let task = self
            .tasks
            .remove(id)
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))?;
        self.by_time.remove(&(task.time, task.id));
        tracing::debug!("Deleted task {}", id);
        Ok(())
    }

    fn collect<'a>(&self, keys: impl Iterator<Item = &'a (DateTime<Utc>, String)>) -> Vec<Task> {
        keys.filter_map(|(_, id)| self.tasks.get(id).cloned()).collect()
    }
}
