//! HTTP API module
//!
//! A headless control surface: every endpoint maps onto one controller
//! operation (start, pause, resume, stop) or reports status.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{services::ProcessSupervisor, state::AppState};
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router<S: ProcessSupervisor>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/timer/start", post(start_handler::<S>))
        .route("/timer/pause", post(pause_handler::<S>))
        .route("/timer/resume", post(resume_handler::<S>))
        .route("/timer/stop", post(stop_handler::<S>))
        .route("/status", get(status_handler::<S>))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
