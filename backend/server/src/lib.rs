//! Backend of an internal club and event membership app.
//!
//! Members browse clubs and events, apply to clubs and join events. Each of
//! those actions notifies the club or event representative by email.
//!
//!
//!
//! # General Infrastructure
//! - Records live in a keyed store, in memory for development or in Redis
//! - Primary keys are human readable and drawn from per-namespace counters
//! - Notifications go out through a relay endpoint (`/notify`) whose URL is
//!   published in the deployment outputs document
//! - The relay renders the message and hands one email to the mail API
//!
//!
//!
//! # Notifications
//!
//! Delivery never blocks or fails a membership action. The dispatcher walks a
//! chain of transports:
//! - Relay over HTTP to the deployed `/notify` endpoint
//! - Log the payload when the outputs document cannot be read, e.g. locally
//!
//! A relay that is configured but fails is reported as a failed delivery and
//! is not retried.
//!
//!
//!
//! # Notes
//!
//! ## Counters
//! With Redis, counters are a single hash incremented with `HINCRBY`, so two
//! concurrent callers never share a value. The record backed counter used in
//! memory mode reads then writes and can hand out a duplicate under
//! concurrency.
//!
//!
//!
//! # Setup
//!
//! Run the server against memory.
//! ```sh
//! RUST_LOG=info cargo run --bin clubhub
//! ```
//!
//! Against Redis, with the tag master seeded first.
//! ```sh
//! cargo run --bin seed -- --redis-url redis://127.0.0.1:6379
//! STORE_BACKEND=redis RUST_LOG=info cargo run --bin clubhub
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod counter;
pub mod database;
pub mod error;
pub mod ids;
pub mod mail;
pub mod notify;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
mod testing;

use config::Config;
use error::StartupError;
use routes::{
    apply_handler, cancel_application_handler, club_handler, club_members_handler,
    clubs_handler, create_event_handler, event_handler, event_participants_handler,
    events_handler, join_handler, leave_handler, notify_handler, profile_handler, tags_handler,
};
use state::AppState;

pub async fn start_server() -> Result<(), StartupError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    // The relay is called cross-origin by deployed clients.
    let relay_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([CONTENT_TYPE]);

    let api_cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let relay = Router::new()
        .route("/notify", post(notify_handler))
        .layer(relay_cors);

    let api = Router::new()
        .route("/clubs", get(clubs_handler))
        .route("/clubs/{club_id}", get(club_handler))
        .route("/clubs/{club_id}/members", get(club_members_handler))
        .route("/clubs/{club_id}/applications", post(apply_handler))
        .route(
            "/clubs/{club_id}/applications/{user_id}",
            delete(cancel_application_handler),
        )
        .route("/events", get(events_handler).post(create_event_handler))
        .route("/events/{event_id}", get(event_handler))
        .route(
            "/events/{event_id}/participants",
            get(event_participants_handler).post(join_handler),
        )
        .route(
            "/events/{event_id}/participants/{user_id}",
            delete(leave_handler),
        )
        .route("/users/{user_id}/profile", get(profile_handler))
        .route("/tags", get(tags_handler))
        .layer(api_cors);

    relay.merge(api).with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
