//! HTTP routes of the control panel.
//!
//! - `api`: state snapshot, run controls, log/event paging and credentials
//! - `sse`: the push channel
//! - `media`: generated output files

pub mod api;
pub mod media;
pub mod sse;

use axum::routing::{get, post};
use axum::Router;
use rp_core::state::manager::StateManager;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<StateManager>,

    /// Interval between keep-alive comments on the push channel.
    pub heartbeat: Duration,

    /// Cancelled on shutdown so long-lived streams end.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(manager: Arc<StateManager>, heartbeat: Duration) -> Self {
        Self {
            manager,
            heartbeat,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(api::get_state))
        .route("/api/run", post(api::run_pipeline))
        .route("/api/run-step/:id", post(api::run_step))
        .route("/api/pause", post(api::pause))
        .route("/api/resume", post(api::resume))
        .route("/api/abort", post(api::abort))
        .route("/api/logs", get(api::get_logs))
        .route("/api/events", get(api::get_events))
        .route("/api/env", get(api::get_env).post(api::update_env))
        .route("/sse/logs", get(sse::state_stream))
        .route("/media/*path", get(media::serve_media))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
