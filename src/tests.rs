//! Integration tests for the calendar backend.

use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::Config;
use crate::store::Store;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(None).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let config = Config {
            api_psk: psk.clone(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            ..Config::default()
        };

        let state = AppState {
            store: Arc::new(Store::new()),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create_event(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/events"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_required_when_psk_configured() {
    let fixture = TestFixture::with_psk(Some("test-api-key".to_string())).await;

    let resp = fixture
        .client
        .get(fixture.url("/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Request without API key
    let resp = Client::new()
        .get(fixture.url("/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Health stays open
    let resp = Client::new()
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_event_crud_and_daily_counts() {
    let fixture = TestFixture::new().await;

    // Create event
    let create_resp = fixture
        .create_event(json!({
            "title": "Standup",
            "description": "Daily sync",
            "date": "2024-03-01",
            "startTime": "09:00",
            "endTime": "09:15"
        }))
        .await;
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    assert_eq!(create_body["success"], true);
    assert_eq!(create_body["data"]["startTime"], "09:00");
    let event_id = create_body["data"]["id"].as_str().unwrap().to_string();

    let (_, counts) = fixture.get_json("/events/count/3/2024").await;
    assert_eq!(counts["data"]["2024-03-01"], 1);
    assert_eq!(counts["data"]["2024-03-02"], 0);
    assert_eq!(counts["data"].as_object().unwrap().len(), 31);

    // Get event
    let (status, body) = fixture.get_json(&format!("/events/{}", event_id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["title"], "Standup");

    // Events for the day
    let (_, day) = fixture.get_json("/events/date/2024-03-01").await;
    assert_eq!(day["data"].as_array().unwrap().len(), 1);

    // Patch moves the event to another day
    let update_resp = fixture
        .client
        .patch(fixture.url(&format!("/events/{}", event_id)))
        .json(&json!({ "date": "2024-03-05" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["date"], "2024-03-05");
    assert_eq!(update_body["data"]["description"], "Daily sync");

    let (_, counts) = fixture.get_json("/events/count/3/2024").await;
    assert_eq!(counts["data"]["2024-03-01"], 0);
    assert_eq!(counts["data"]["2024-03-05"], 1);

    // Put replaces every field
    let put_resp = fixture
        .client
        .put(fixture.url(&format!("/events/{}", event_id)))
        .json(&json!({
            "title": "Retro",
            "date": "2024-03-05",
            "startTime": "16:00",
            "endTime": "17:00"
        }))
        .send()
        .await
        .unwrap();
    let put_body: Value = put_resp.json().await.unwrap();
    assert_eq!(put_body["data"]["title"], "Retro");
    assert_eq!(put_body["data"]["description"], "");

    // Delete event
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/events/{}", event_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);
    let delete_body: Value = delete_resp.json().await.unwrap();
    assert_eq!(delete_body["data"], true);

    let (_, counts) = fixture.get_json("/events/count/3/2024").await;
    assert_eq!(counts["data"]["2024-03-05"], 0);

    // Verify deleted
    let (status, _) = fixture.get_json(&format!("/events/{}", event_id)).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_delete_unknown_event_returns_false() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .delete(fixture.url("/events/non-existent-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], false);
}

#[tokio::test]
async fn test_event_validation_errors() {
    let fixture = TestFixture::new().await;

    // End before start
    let resp = fixture
        .create_event(json!({
            "title": "Backwards",
            "date": "2024-03-01",
            "startTime": "10:00",
            "endTime": "09:00"
        }))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Malformed date
    let resp = fixture
        .create_event(json!({
            "title": "Bad date",
            "date": "01/03/2024",
            "startTime": "09:00",
            "endTime": "10:00"
        }))
        .await;
    assert_eq!(resp.status(), 400);

    // Nothing was counted
    let (_, counts) = fixture.get_json("/events/count/3/2024").await;
    assert_eq!(counts["data"]["2024-03-01"], 0);

    // Patch of unknown event
    let resp = fixture
        .client
        .patch(fixture.url("/events/missing"))
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_month_count_arguments() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/events/count/2/2024").await;
    assert_eq!(status, 200);
    let days = body["data"].as_object().unwrap();
    assert_eq!(days.len(), 29);
    assert!(days.values().all(|count| count == 0));

    let (status, body) = fixture.get_json("/events/count/13/2024").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");

    let (status, _) = fixture.get_json("/events/count/feb/2024").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_events_for_unparsable_day_is_empty() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/events/date/not-a-date").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_task_crud() {
    let fixture = TestFixture::new().await;
    let due = Utc::now() + Duration::days(2);

    // Create task
    let create_resp = fixture
        .client
        .post(fixture.url("/tasks"))
        .json(&json!({
            "title": "Pay rent",
            "time": due.to_rfc3339()
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    let task_id = create_body["data"]["id"].as_str().unwrap().to_string();

    // Tasks for the day
    let (_, day) = fixture
        .get_json(&format!("/tasks/date/{}", due.format("%Y-%m-%d")))
        .await;
    assert_eq!(day["data"].as_array().unwrap().len(), 1);

    // Update title only
    let update_resp = fixture
        .client
        .patch(fixture.url(&format!("/tasks/{}", task_id)))
        .json(&json!({ "title": "Pay rent today" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["title"], "Pay rent today");

    // Update into the past is rejected
    let past_resp = fixture
        .client
        .patch(fixture.url(&format!("/tasks/{}", task_id)))
        .json(&json!({ "time": (Utc::now() - Duration::hours(1)).to_rfc3339() }))
        .send()
        .await
        .unwrap();
    assert_eq!(past_resp.status(), 400);

    // List and get
    let (_, list) = fixture.get_json("/tasks").await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
    let (status, _) = fixture.get_json(&format!("/tasks/{}", task_id)).await;
    assert_eq!(status, 200);

    // Delete task, then again
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/tasks/{}", task_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let again = fixture
        .client
        .delete(fixture.url(&format!("/tasks/{}", task_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);
    let body: Value = again.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_task_in_past_is_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/tasks"))
        .json(&json!({
            "title": "Yesterday",
            "time": (Utc::now() - Duration::days(1)).to_rfc3339()
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, list) = fixture.get_json("/tasks").await;
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn test_subscribe_deduplicates() {
    let fixture = TestFixture::new().await;
    let subscription = json!({
        "endpoint": "https://push.example.com/send/abc",
        "expirationTime": null,
        "keys": { "p256dh": "BPk3-key", "auth": "auth-secret" }
    });

    let first: Value = fixture
        .client
        .post(fixture.url("/subscribe"))
        .json(&subscription)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["data"]["registered"], true);

    let second: Value = fixture
        .client
        .post(fixture.url("/subscribe"))
        .json(&subscription)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["data"]["registered"], false);

    let bad = fixture
        .client
        .post(fixture.url("/subscribe"))
        .json(&json!({
            "endpoint": "nowhere",
            "keys": { "p256dh": "k", "auth": "other" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 400);
}
