//! Task API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use super::{success, ApiResult};
use crate::models::{CreateTaskRequest, Task, UpdateTaskRequest};
use crate::AppState;

/// GET /tasks - List all tasks.
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Vec<Task>> {
    success(state.store.list_tasks().await)
}

/// GET /tasks/{id} - Get a single task.
pub async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Task> {
    success(state.store.get_task(&id).await?)
}

/// GET /tasks/date/{date} - Tasks due on one day.
pub async fn list_tasks_for_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<Vec<Task>> {
    success(state.store.list_tasks_for_day(&date).await)
}

/// POST /tasks - Create a new task.
pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<Task> {
    let task = state.store.create_task(request, Utc::now()).await?;
    tracing::info!("Task {} created, due {}", task.id, task.time);
    success(task)
}

/// PATCH /tasks/{id} - Update a task.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTaskRequest>,
) -> ApiResult<Task> {
    success(state.store.update_task(&id, request, Utc::now()).await?)
}

/// DELETE /tasks/{id} - Delete a task.
pub async fn delete_task(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.store.delete_task(&id).await?;
    success(())
}
