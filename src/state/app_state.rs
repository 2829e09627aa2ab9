//! Main application state management

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::TimerState;
use crate::{
    error::TimerError,
    services::{DesktopNotifier, ProcessSupervisor},
    timer::{CountdownController, Notice},
};

/// How many notices the status endpoint keeps around
pub const NOTICE_HISTORY: usize = 50;

/// A notice together with when it was emitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeRecord {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub notice: Notice,
}

/// Server-wide state: the countdown controller plus bookkeeping for the API
pub struct AppState<S> {
    /// The countdown for the supervised application
    pub controller: CountdownController<S>,
    /// Desktop notification delivery
    pub notifier: DesktopNotifier,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Most recent notices, oldest first
    pub notices: Arc<Mutex<VecDeque<NoticeRecord>>>,
}

impl<S: ProcessSupervisor> AppState<S> {
    pub fn new(controller: CountdownController<S>, notifier: DesktopNotifier, port: u16, host: String) -> Self {
        Self {
            controller,
            notifier,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            notices: Arc::new(Mutex::new(VecDeque::with_capacity(NOTICE_HISTORY))),
        }
    }

    /// Launch `app_name` and start its countdown.
    ///
    /// Every notice is kept for `/status`; when `desktop_notify` is set it is
    /// also shown as a desktop notification.
    pub async fn start_run(&self, app_name: &str, duration_seconds: u64, desktop_notify: bool) -> Result<TimerState, TimerError> {
        let notices = Arc::clone(&self.notices);
        let notifier = desktop_notify.then(|| self.notifier.clone());
        let on_notify = move |notice: Notice| {
            let message = notice.to_string();
            if notice.is_failure() {
                warn!("{}", message);
            }
            push_notice(&notices, notice);
            if let Some(notifier) = &notifier {
                notifier.spawn_send(message);
            }
        };
        let on_tick = |remaining: u64, total: u64| {
            debug!("Time remaining: {} of {} seconds", remaining, total);
        };

        self.controller
            .start(duration_seconds, app_name, on_tick, on_notify)
            .await?;
        self.record_action("start");
        Ok(self.controller.snapshot())
    }

    pub async fn pause_run(&self) -> Result<TimerState, TimerError> {
        self.controller.pause().await?;
        self.record_action("pause");
        Ok(self.controller.snapshot())
    }

    pub async fn resume_run(&self) -> Result<TimerState, TimerError> {
        self.controller.resume().await?;
        self.record_action("resume");
        Ok(self.controller.snapshot())
    }

    /// Stop the run; the action is recorded even if the kill failed, since
    /// the timer has reset either way
    pub async fn stop_run(&self) -> Result<TimerState, TimerError> {
        let result = self.controller.stop().await;
        if !matches!(result, Err(TimerError::InvalidState { .. })) {
            self.record_action("stop");
        }
        result.map(|_| self.controller.snapshot())
    }

    /// Snapshot of the recent notices, oldest first
    pub fn recent_notices(&self) -> Vec<NoticeRecord> {
        self.notices
            .lock()
            .map(|notices| notices.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record_action(&self, action: &str) {
        info!("Timer action: {}", action);
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

fn push_notice(notices: &Mutex<VecDeque<NoticeRecord>>, notice: Notice) {
    let Ok(mut notices) = notices.lock() else {
        warn!("Notice history is unavailable, dropping: {}", notice);
        return;
    };
    if notices.len() == NOTICE_HISTORY {
        notices.pop_front();
    }
    notices.push_back(NoticeRecord {
        timestamp: Utc::now(),
        message: notice.to_string(),
        notice,
    });
}
