//! Error taxonomy for the timer core

use thiserror::Error;

use crate::state::TimerStatus;

/// Errors surfaced by the countdown controller and the process supervisor.
///
/// None of these are fatal to the hosting process; every variant is
/// recoverable at the call site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Bad duration or application name, rejected before any process is touched
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The OS could not start the requested application
    #[error("Failed to launch {app_name}: {reason}")]
    LaunchFailed { app_name: String, reason: String },

    /// The OS could not terminate the supervised process
    #[error("Failed to kill process with PID {pid}: {reason}")]
    TerminateFailed { pid: u32, reason: String },

    /// The operation is not supported in the current timer state
    #[error("Cannot {operation} while the timer is {status}")]
    InvalidState {
        operation: &'static str,
        status: TimerStatus,
    },
}

impl TimerError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn launch_failed(app_name: &str, reason: impl ToString) -> Self {
        Self::LaunchFailed {
            app_name: app_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn terminate_failed(pid: u32, reason: impl ToString) -> Self {
        Self::TerminateFailed {
            pid,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TimerError>;
