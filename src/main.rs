//! Calendar Backend
//!
//! REST backend for calendar events and tasks, with push notifications for tasks that
//! are about to fall due. All data lives in memory for the lifetime of the process.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod push;
mod store;
mod sweep;
mod validation;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use push::{PushSender, WebPushSender};
use store::Store;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let (json_layer, text_layer) = if config.log_json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    for notice in &config.notices {
        tracing::warn!("{}", notice);
    }

    tracing::info!("Starting Calendar Backend");
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CALENDAR_API_PSK). Authentication is disabled!");
    }

    if config.vapid.is_none() {
        tracing::warn!(
            "No VAPID key configured (CALENDAR_VAPID_PRIVATE_KEY_FILE). Pushes go out unsigned"
        );
    }

    let store = Arc::new(Store::new());
    let sender: Arc<dyn PushSender> = Arc::new(WebPushSender::new(
        config.push_timeout,
        config.push_ttl,
        config.vapid.clone(),
    ));

    // Start the notification sweep
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = tokio::spawn(sweep::run_sweep_loop(
        store.clone(),
        sender,
        config.sweep_interval,
        config.lookahead,
        shutdown_rx,
    ));

    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send(true).ok();
    sweep.await?;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // The browser client is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Events
        .route("/events", get(api::list_events).post(api::create_event))
        .route("/events/date/{date}", get(api::list_events_for_day))
        .route(
            "/events/count/{month}/{year}",
            get(api::count_events_for_month),
        )
        .route(
            "/events/{id}",
            get(api::get_event)
                .patch(api::update_event)
                .put(api::replace_event)
                .delete(api::delete_event),
        )
        // Tasks
        .route("/tasks", get(api::list_tasks).post(api::create_task))
        .route("/tasks/date/{date}", get(api::list_tasks_for_day))
        .route(
            "/tasks/{id}",
            get(api::get_task)
                .patch(api::update_task)
                .delete(api::delete_task),
        )
        // Push subscriptions
        .route("/subscribe", post(api::register_subscription))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Resolve once Ctrl-C is received.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::warn!("Shutdown signal received, stopping server");
}

#[cfg(test)]
mod tests;
