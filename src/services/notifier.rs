//! Desktop notification delivery

use tokio::process::Command;
use tracing::{debug, warn};

/// Title shown on every desktop notification
pub const NOTIFICATION_TITLE: &str = "AppTimer";

/// Sends desktop notifications through a `notify-send` compatible command
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    command: String,
}

impl DesktopNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Show `message` as a desktop notification
    pub async fn send(&self, message: &str) -> Result<(), String> {
        debug!("Sending desktop notification: {}", message);

        let output = Command::new(&self.command)
            .args([NOTIFICATION_TITLE, message])
            .output()
            .await
            .map_err(|e| format!("Failed to execute {}: {}", self.command, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} failed: {}", self.command, stderr.trim()));
        }

        Ok(())
    }

    /// Fire-and-forget delivery; failures are only logged
    pub fn spawn_send(&self, message: String) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&message).await {
                warn!("Desktop notification not delivered: {}", e);
            }
        });
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("notify-send")
    }
}
