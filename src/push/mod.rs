//! Push delivery to registered subscriptions.
//!
//! The sweep only sees the `PushSender` trait; `WebPushSender` is the
//! transport wired up in `main`.

use std::time::Duration;

use async_trait::async_trait;
use web_push::{
    ContentEncoding, HyperWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessage, WebPushMessageBuilder,
};

use crate::config::VapidConfig;
use crate::models::{NotificationPayload, PushSubscription};

/// Delivery failure for a single subscription.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("failed to encode notification payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("push to {endpoint} failed: {source}")]
    Push {
        endpoint: String,
        #[source]
        source: WebPushError,
    },
    #[error("push to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },
}

/// Capability to deliver one payload to one subscription.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError>;
}

/// Web Push transport: `aes128gcm` payload encryption, VAPID-signed when keys are configured.
pub struct WebPushSender {
    client: HyperWebPushClient,
    timeout: Duration,
    ttl: u32,
    vapid: Option<VapidConfig>,
}

impl WebPushSender {
    pub fn new(timeout: Duration, ttl: u32, vapid: Option<VapidConfig>) -> Self {
        Self {
            client: HyperWebPushClient::new(),
            timeout,
            ttl,
            vapid,
        }
    }

    /// Encrypt the payload for one subscription and sign the request.
    fn build_message(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<WebPushMessage, PushError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.as_str(),
            subscription.keys.p256dh.as_str(),
            subscription.keys.auth.as_str(),
        );
        let content = serde_json::to_vec(payload)?;
        let push_err = |source: WebPushError| PushError::Push {
            endpoint: subscription.endpoint.clone(),
            source,
        };

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_ttl(self.ttl);
        builder.set_payload(ContentEncoding::Aes128Gcm, &content);

        if let Some(vapid) = &self.vapid {
            let mut signature = VapidSignatureBuilder::from_pem(vapid.private_key.as_bytes(), &info)
                .map_err(push_err)?;
            signature.add_claim("sub", vapid.subject.as_str());
            builder.set_vapid_signature(signature.build().map_err(push_err)?);
        }

        builder.build().map_err(push_err)
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        let message = self.build_message(subscription, payload)?;

        match tokio::time::timeout(self.timeout, self.client.send(message)).await {
            Ok(Ok(())) => {
                tracing::debug!("Delivered push to {}", subscription.endpoint);
                Ok(())
            }
            Ok(Err(source)) => Err(PushError::Push {
                endpoint: subscription.endpoint.clone(),
                source,
            }),
            Err(_) => Err(PushError::Timeout {
                endpoint: subscription.endpoint.clone(),
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Bytes,
        http::{HeaderMap, StatusCode},
        routing::post,
        Router,
    };
    use tokio::sync::Mutex;

    use crate::models::PushKeys;

    // A valid P-256 public key and auth secret, as a browser would hand out.
    const P256DH: &str =
        "BLMbF9ffKBiWQLCKvTHb6LO8Nb6dcUh6TItC455vu2kElga6PQvUmaFyCdykxY2nOSSL3yKgfbmFLRTUaGv4yV8";
    const AUTH: &str = "xS03Fi5ErfTNH_l9WHE9Ew";

    type Received = Arc<Mutex<Vec<(HeaderMap, Bytes)>>>;

    async fn spawn_endpoint(status: StatusCode) -> (String, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let app = Router::new().route(
            "/push",
            post(move |headers: HeaderMap, body: Bytes| {
                let sink = sink.clone();
                async move {
                    sink.lock().await.push((headers, body));
                    status
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/push", addr), received)
    }

    fn subscription(endpoint: String) -> PushSubscription {
        PushSubscription {
            endpoint,
            expiration_time: None,
            keys: PushKeys {
                p256dh: P256DH.to_string(),
                auth: AUTH.to_string(),
            },
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            title: "Upcoming task".to_string(),
            body: "\"Standup\" is due in 5 minutes".to_string(),
            task_ids: vec!["t1".to_string()],
        }
    }

    fn sender(timeout: Duration) -> WebPushSender {
        WebPushSender::new(timeout, 60, None)
    }

    #[tokio::test]
    async fn test_delivers_encrypted_payload() {
        let (endpoint, received) = spawn_endpoint(StatusCode::CREATED).await;

        sender(Duration::from_secs(5))
            .deliver(&subscription(endpoint), &payload())
            .await
            .unwrap();

        let received = received.lock().await;
        assert_eq!(received.len(), 1);
        let (headers, body) = &received[0];
        assert_eq!(headers["content-encoding"], "aes128gcm");
        assert_eq!(headers["ttl"], "60");
        let plaintext = serde_json::to_vec(&payload()).unwrap();
        assert!(!body.is_empty());
        assert_ne!(body.as_ref(), plaintext.as_slice());
    }

    #[tokio::test]
    async fn test_reports_gone_subscription() {
        let (endpoint, _) = spawn_endpoint(StatusCode::GONE).await;

        let err = sender(Duration::from_secs(5))
            .deliver(&subscription(endpoint.clone()), &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, PushError::Push { endpoint: e, .. } if e == endpoint));
    }

    #[tokio::test]
    async fn test_rejects_malformed_keys_without_sending() {
        let (endpoint, received) = spawn_endpoint(StatusCode::CREATED).await;
        let mut bad = subscription(endpoint);
        bad.keys.p256dh = "not-a-key".to_string();

        let err = sender(Duration::from_secs(5))
            .deliver(&bad, &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, PushError::Push { .. }));
        assert!(received.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_times_out_on_silent_endpoint() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let err = sender(Duration::from_millis(200))
            .deliver(&subscription(format!("http://{}/push", addr)), &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, PushError::Timeout { .. }));
    }

    #[test]
    fn test_invalid_vapid_key_is_reported() {
        let sender = WebPushSender::new(
            Duration::from_secs(5),
            60,
            Some(VapidConfig {
                private_key: "not a pem".to_string(),
                subject: "mailto:ops@example.com".to_string(),
            }),
        );

        let result = sender.build_message(
            &subscription("https://push.example.com/a".to_string()),
            &payload(),
        );
        assert!(matches!(result, Err(PushError::Push { .. })));
    }
}
