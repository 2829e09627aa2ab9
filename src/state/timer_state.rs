//! Timer state structure and management

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::services::SupervisedProcess;

/// Lifecycle status of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    /// The application is being started; no countdown yet
    Launching,
    Running,
    Paused,
    /// The run has ended and the supervised process is being terminated
    Stopped,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Launching => "launching",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of the countdown for status reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub status: TimerStatus,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub process: Option<SupervisedProcess>,
}

impl TimerState {
    /// Create an idle timer state
    pub fn idle() -> Self {
        Self {
            status: TimerStatus::Idle,
            remaining_seconds: 0,
            total_seconds: 0,
            process: None,
        }
    }

    /// Check if a run is in progress (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self.status, TimerStatus::Running | TimerStatus::Paused)
    }

    /// Fraction of the run already consumed, in `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.total_seconds - self.remaining_seconds) as f64 / self.total_seconds as f64
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::idle()
    }
}
