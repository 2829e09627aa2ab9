//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{extract::State, response::Json};
use tracing::{info, warn};

use super::responses::{ApiError, ApiResponse, HealthResponse, StartRequest, StatusResponse};
use crate::{error::TimerError, services::ProcessSupervisor, state::AppState};

/// Handle POST /timer/start - Launch an application and start its countdown
pub async fn start_handler<S: ProcessSupervisor>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let duration_seconds = request.unit.to_seconds(request.duration)?;
    let timer = state
        .start_run(&request.app_name, duration_seconds, request.notify)
        .await
        .inspect_err(|e| warn!("Start rejected: {}", e))?;

    info!("Start endpoint called - {} limited to {}s", request.app_name.trim(), duration_seconds);
    Ok(Json(ApiResponse::ok(
        format!("Timer started for {}", request.app_name.trim()),
        timer,
    )))
}

/// Handle POST /timer/pause - Freeze the countdown
pub async fn pause_handler<S: ProcessSupervisor>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let timer = state.pause_run().await?;
    Ok(Json(ApiResponse::ok("Timer paused".to_string(), timer)))
}

/// Handle POST /timer/resume - Continue a paused countdown
pub async fn resume_handler<S: ProcessSupervisor>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let timer = state.resume_run().await?;
    Ok(Json(ApiResponse::ok("Timer resumed".to_string(), timer)))
}

/// Handle POST /timer/stop - End the run and kill the application
pub async fn stop_handler<S: ProcessSupervisor>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ApiResponse>, ApiError> {
    match state.stop_run().await {
        Ok(timer) => Ok(Json(ApiResponse::ok("Timer stopped".to_string(), timer))),
        // The timer has reset even though the process survived
        Err(e @ TimerError::TerminateFailed { .. }) => {
            warn!("Stop endpoint called - {}", e);
            Ok(Json(ApiResponse::error(e.to_string(), state.controller.snapshot())))
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle GET /status - Return current timer status
pub async fn status_handler<S: ProcessSupervisor>(State(state): State<Arc<AppState<S>>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.controller.snapshot().into(),
        notices: state.recent_notices(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
