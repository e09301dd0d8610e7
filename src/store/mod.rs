//! In-memory store for events, tasks and push subscriptions.
//!
//! Nothing is persisted; the store lives exactly as long as the process.
//! Request handlers and the notification sweep share it through the same
//! lock-guarded methods.

mod events;
mod subscriptions;
mod tasks;

pub use events::*;
pub use subscriptions::*;
pub use tasks::*;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{
    CreateEventRequest, CreateTaskRequest, Event, PushSubscription, Task, UpdateEventRequest,
    UpdateTaskRequest,
};

/// Store facade for all data operations.
#[derive(Debug)]
pub struct Store {
    events: RwLock<EventBook>,
    tasks: RwLock<TaskBook>,
    subscriptions: RwLock<SubscriptionRegistry>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(EventBook::new()),
            tasks: RwLock::new(TaskBook::new()),
            subscriptions: RwLock::new(SubscriptionRegistry::new()),
        }
    }

    // ==================== EVENT OPERATIONS ====================

    /// List all events.
    pub async fn list_events(&self) -> Vec<Event> {
        self.events.read().await.list()
    }

    /// Get an event by ID.
    pub async fn get_event(&self, id: &str) -> Result<Event, AppError> {
        self.events
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
    }

    /// List events on one calendar day.
    pub async fn list_events_for_day(&self, date: &str) -> Vec<Event> {
        self.events.read().await.list_for_day(date)
    }

    /// Per-day event counts for a month.
    pub async fn event_counts_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<String, usize>, AppError> {
        self.events.read().await.count_for_month(year, month)
    }

    /// Create a new event.
    pub async fn create_event(&self, request: CreateEventRequest) -> Result<Event, AppError> {
        self.events.write().await.create(request)
    }

    /// Partially update an event.
    pub async fn update_event(
        &self,
        id: &str,
        request: UpdateEventRequest,
    ) -> Result<Event, AppError> {
        self.events.write().await.update(id, request)
    }

    /// Delete an event, reporting whether it existed.
    pub async fn delete_event(&self, id: &str) -> bool {
        self.events.write().await.delete(id)
    }

    // ==================== TASK OPERATIONS ====================

    /// List all tasks.
    pub async fn list_tasks(&self) -> Vec<Task> {
        self.tasks.read().await.list()
    }

    /// Get a task by ID.
    pub async fn get_task(&self, id: &str) -> Result<Task, AppError> {
        self.tasks.read().await.get(id).cloned()
    }

    /// List tasks due on one calendar day.
    pub async fn list_tasks_for_day(&self, date: &str) -> Vec<Task> {
        self.tasks.read().await.list_for_day(date)
    }

    /// Tasks due within an inclusive window.
    pub async fn tasks_due_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Task> {
        self.tasks.read().await.due_within(from, to)
    }

    /// Create a new task due after `now`.
    pub async fn create_task(
        &self,
        request: CreateTaskRequest,
        now: DateTime<Utc>,
    ) -> Result<Task, AppError> {
        self.tasks.write().await.create(request, now)
    }

    /// Update a task.
    pub async fn update_task(
        &self,
        id: &str,
        request: UpdateTaskRequest,
        now: DateTime<Utc>,
    ) -> Result<Task, AppError> {
        self.tasks.write().await.update(id, request, now)
    }

    /// Delete a task.
    pub async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        self.tasks.write().await.delete(id)
    }

    // ==================== SUBSCRIPTION OPERATIONS ====================

    /// Register a push subscription.
    pub async fn register_subscription(
        &self,
        subscription: PushSubscription,
    ) -> Result<bool, AppError> {
        self.subscriptions.write().await.register(subscription)
    }

    /// Snapshot of all push subscriptions.
    pub async fn list_subscriptions(&self) -> Vec<PushSubscription> {
        self.subscriptions.read().await.all()
    }
}
