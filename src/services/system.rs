//! Host capability checks

use tokio::process::Command;
use tracing::{info, warn};

/// Check the desktop notification command; notifications are optional, so
/// this only reports whether it can be used
pub async fn check_notifier_available(command: &str) -> bool {
    match Command::new(command).arg("--version").output().await {
        Ok(_) => {
            info!("{} is available", command);
            true
        }
        Err(e) => {
            warn!("{} is not available, desktop notifications will fail: {}", command, e);
            false
        }
    }
}
