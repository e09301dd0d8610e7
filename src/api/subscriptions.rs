//! Push subscription endpoint.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::models::{PushSubscription, RegisterResponse};
use crate::AppState;

/// POST /subscribe - Register a browser push subscription.
pub async fn register_subscription(
    State(state): State<AppState>,
    Json(subscription): Json<PushSubscription>,
) -> ApiResult<RegisterResponse> {
    let registered = state.store.register_subscription(subscription).await?;
    success(RegisterResponse { registered })
}
