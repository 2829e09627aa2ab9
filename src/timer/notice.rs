//! Notifications emitted by the countdown

use std::fmt;

use serde::{Deserialize, Serialize};

/// Something the front-end may want to tell the user about.
///
/// The controller only decides when a notice is due; delivery (desktop
/// popup, log line, HTTP status) is up to the `on_notify` callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The warning threshold was reached
    TimeRunningOut {
        app_name: String,
        remaining_seconds: u64,
    },
    /// The countdown reached zero
    Expired {
        app_name: String,
        pid: u32,
        terminate_error: Option<String>,
    },
    /// The run was stopped before reaching zero
    Stopped {
        app_name: String,
        pid: u32,
        terminate_error: Option<String>,
    },
}

impl Notice {
    /// Whether the supervised process could not be killed
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Notice::Expired { terminate_error: Some(_), .. } | Notice::Stopped { terminate_error: Some(_), .. }
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TimeRunningOut { remaining_seconds: 60, .. } => write!(f, "1 minute remaining!"),
            Notice::TimeRunningOut { remaining_seconds, .. } => {
                write!(f, "{} seconds remaining!", remaining_seconds)
            }
            Notice::Expired { app_name, terminate_error: None, .. } => {
                write!(f, "Time's up! {} has been closed.", app_name)
            }
            Notice::Expired { app_name, terminate_error: Some(e), .. } => {
                write!(f, "Time's up! Failed to kill {}: {}", app_name, e)
            }
            Notice::Stopped { app_name, terminate_error: None, .. } => {
                write!(f, "{} has been closed.", app_name)
            }
            Notice::Stopped { app_name, terminate_error: Some(e), .. } => {
                write!(f, "Timer stopped. Failed to kill {}: {}", app_name, e)
            }
        }
    }
}
