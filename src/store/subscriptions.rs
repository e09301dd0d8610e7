//! Push-subscription registry, deduplicated by the subscription's auth secret.

use std::collections::HashMap;

use axum::http::Uri;

use crate::errors::AppError;
use crate::models::PushSubscription;

/// Registered push subscriptions. Entries live for the whole process.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    by_auth: HashMap<String, PushSubscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription. Returns false if its auth secret is already known.
    pub fn register(&mut self, subscription: PushSubscription) -> Result<bool, AppError> {
        validate_subscription(&subscription)?;

        if self.by_auth.contains_key(&subscription.keys.auth) {
            return Ok(false);
        }
        tracing::info!("Registered push subscription for {}", subscription.endpoint);
        self.by_auth
            .insert(subscription.keys.auth.clone(), subscription);
        Ok(true)
    }

    /// Snapshot of every registered subscription.
    pub fn all(&self) -> Vec<PushSubscription> {
        self.by_auth.values().cloned().collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_auth.len()
    }
}

fn validate_subscription(subscription: &PushSubscription) -> Result<(), AppError> {
    let endpoint: Uri = subscription.endpoint.parse().map_err(|e| {
        AppError::BadRequest(format!("Invalid subscription endpoint: {}", e))
    })?;
    if !matches!(endpoint.scheme_str(), Some("http" | "https")) || endpoint.host().is_none() {
        return Err(AppError::BadRequest(
            "Subscription endpoint must be an absolute http(s) URL".to_string(),
        ));
    }
    if subscription.keys.auth.trim().is_empty() || subscription.keys.p256dh.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Subscription keys are required".to_string(),
        ));
    }
    Ok(())
}
