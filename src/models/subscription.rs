//! Push subscription model matching the browser's `PushSubscription.toJSON()`.

use serde::{Deserialize, Serialize};

/// Keys a browser hands out with a push subscription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushKeys {
    pub p256dh: String,
    /// Authentication secret; also the registry's deduplication key.
    pub auth: String,
}

/// A browser-issued push subscription descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    pub keys: PushKeys,
}

/// Result of a subscription registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    /// False when a subscription with the same auth secret already existed.
    pub registered: bool,
}

/// Body delivered to each subscription when tasks are due soon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub task_ids: Vec<String>,
}
