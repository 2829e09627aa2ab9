//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::TimerError,
    state::{NoticeRecord, TimerState},
    timer::TimeUnit,
};

/// Body of `POST /timer/start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub app_name: String,
    pub duration: u64,
    #[serde(default)]
    pub unit: TimeUnit,
    /// Show notices as desktop notifications
    #[serde(default)]
    pub notify: bool,
}

/// Timer state as reported over the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerReport {
    #[serde(flatten)]
    pub state: TimerState,
    pub progress: f64,
}

impl From<TimerState> for TimerReport {
    fn from(state: TimerState) -> Self {
        Self {
            progress: state.progress(),
            state,
        }
    }
}

/// API response structure for timer control endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerReport,
}

impl ApiResponse {
    pub fn new(status: String, message: String, timer: TimerState) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer: timer.into(),
        }
    }

    pub fn ok(message: String, timer: TimerState) -> Self {
        Self::new("ok".to_string(), message, timer)
    }

    /// The action took effect but something went wrong along the way
    pub fn error(message: String, timer: TimerState) -> Self {
        Self::new("error".to_string(), message, timer)
    }
}

/// Status response with timer and notice information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerReport,
    pub notices: Vec<NoticeRecord>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body returned when a request is rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A rejected timer operation, rendered as an HTTP error
#[derive(Debug)]
pub struct ApiError(pub TimerError);

impl From<TimerError> for ApiError {
    fn from(err: TimerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, kind) = match &self.0 {
            TimerError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            TimerError::InvalidState { .. } => (StatusCode::CONFLICT, "invalid_state"),
            TimerError::LaunchFailed { .. } => (StatusCode::BAD_GATEWAY, "launch_failed"),
            TimerError::TerminateFailed { .. } => (StatusCode::BAD_GATEWAY, "terminate_failed"),
        };
        let body = ErrorResponse {
            status: "error".to_string(),
            error: kind.to_string(),
            message: self.0.to_string(),
            timestamp: Utc::now(),
        };
        (code, Json(body)).into_response()
    }
}
