//! Event API endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateEventRequest, Event, UpdateEventRequest};
use crate::AppState;

/// GET /events - List all events.
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Vec<Event>> {
    success(state.store.list_events().await)
}

/// GET /events/{id} - Get a single event.
pub async fn get_event(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Event> {
    success(state.store.get_event(&id).await?)
}

/// GET /events/date/{date} - Events on one day.
pub async fn list_events_for_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<Vec<Event>> {
    success(state.store.list_events_for_day(&date).await)
}

/// GET /events/count/{month}/{year} - Per-day event counts for a month.
pub async fn count_events_for_month(
    State(state): State<AppState>,
    Path((month, year)): Path<(String, String)>,
) -> ApiResult<BTreeMap<String, usize>> {
    let month: u32 = month
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidArgument(format!("Invalid month '{}'", month)))?;
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidArgument(format!("Invalid year '{}'", year)))?;

    success(state.store.event_counts_for_month(year, month).await?)
}

/// POST /events - Create a new event.
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<Event> {
    let event = state.store.create_event(request).await?;
    tracing::info!("Event {} created for {}", event.id, event.date);
    success(event)
}

/// PATCH /events/{id} - Partially update an event.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> ApiResult<Event> {
    success(state.store.update_event(&id, request).await?)
}

/// PUT /events/{id} - Replace an event wholesale.
pub async fn replace_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<Event> {
    success(state.store.update_event(&id, request.into()).await?)
}

/// DELETE /events/{id} - Delete an event; `data` reports whether it existed.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<bool> {
    let removed = state.store.delete_event(&id).await;
    if !removed {
        tracing::debug!("Delete of unknown event {}", id);
    }
    success(removed)
}
