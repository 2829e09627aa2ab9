//! Shared test doubles for the controller and API tests

#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use app_timer::{
    error::{Result, TimerError},
    Notice, ProcessSupervisor, SupervisedProcess,
};

/// A supervisor that never touches real processes:
/// - records every launch and terminate call
/// - hands out increasing fake PIDs
/// - fails launch/terminate on demand
/// - optionally takes a while to launch
#[derive(Default)]
pub struct FakeSupervisor {
    launched: Mutex<Vec<String>>,
    terminated: Mutex<Vec<u32>>,
    next_pid: AtomicU32,
    launch_delay: Duration,
    pub fail_launch: AtomicBool,
    pub fail_terminate: AtomicBool,
}

impl FakeSupervisor {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(1000),
            ..Default::default()
        }
    }

    pub fn failing_terminate() -> Self {
        let supervisor = Self::new();
        supervisor.fail_terminate.store(true, Ordering::SeqCst);
        supervisor
    }

    pub fn slow_launch(delay: Duration) -> Self {
        Self {
            launch_delay: delay,
            ..Self::new()
        }
    }

    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().unwrap().clone()
    }
}

impl ProcessSupervisor for FakeSupervisor {
    async fn launch(&self, app_name: &str) -> Result<SupervisedProcess> {
        if !self.launch_delay.is_zero() {
            tokio::time::sleep(self.launch_delay).await;
        }
        if self.fail_launch.load(Ordering::SeqCst) {
            return Err(TimerError::launch_failed(app_name, "No such file or directory"));
        }
        self.launched.lock().unwrap().push(app_name.to_string());
        Ok(SupervisedProcess {
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
            app_name: app_name.to_string(),
        })
    }

    async fn terminate(&self, pid: u32) -> Result<()> {
        self.terminated.lock().unwrap().push(pid);
        if self.fail_terminate.load(Ordering::SeqCst) {
            return Err(TimerError::terminate_failed(pid, "Operation not permitted"));
        }
        Ok(())
    }
}

/// Collects everything the controller reports through its callbacks
#[derive(Clone, Default)]
pub struct Recorder {
    ticks: Arc<Mutex<Vec<(u64, u64)>>>,
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl Recorder {
    pub fn on_tick(&self) -> impl Fn(u64, u64) + Send + Sync + 'static {
        let ticks = Arc::clone(&self.ticks);
        move |remaining, total| ticks.lock().unwrap().push((remaining, total))
    }

    pub fn on_notify(&self) -> impl Fn(Notice) + Send + Sync + 'static {
        let notices = Arc::clone(&self.notices);
        move |notice| notices.lock().unwrap().push(notice)
    }

    pub fn ticks(&self) -> Vec<(u64, u64)> {
        self.ticks.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> usize {
        self.notices()
            .iter()
            .filter(|n| matches!(n, Notice::TimeRunningOut { .. }))
            .count()
    }
}
