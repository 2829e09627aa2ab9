//! Launching and terminating the supervised application

use std::{
    collections::HashMap,
    future::Future,
    process::Stdio,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use serde::{Deserialize, Serialize};
use tokio::{
    process::{Child, Command},
    sync::oneshot,
};
use tracing::{debug, info, warn};

use crate::error::{Result, TimerError};

/// The external application whose lifetime is bounded by the timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisedProcess {
    pub pid: u32,
    pub app_name: String,
}

/// Starts and stops the supervised application.
///
/// The countdown controller only talks to this trait, so tests can swap in a
/// fake that records calls instead of touching real processes. The
/// controller hands back the pid on every call.
pub trait ProcessSupervisor: Send + Sync + 'static {
    /// Start `app_name` as a child process without waiting for it to exit.
    fn launch(&self, app_name: &str) -> impl Future<Output = Result<SupervisedProcess>> + Send;

    /// Ask the process identified by `pid` to terminate.
    fn terminate(&self, pid: u32) -> impl Future<Output = Result<()>> + Send;
}

type KillReply = oneshot::Sender<Result<()>>;

/// A launched child that has not been reaped or killed yet
struct Tracked {
    launch_id: u64,
    kill_tx: oneshot::Sender<KillReply>,
}

#[derive(Default)]
struct Registry {
    children: Mutex<HashMap<u32, Tracked>>,
    next_launch_id: AtomicU64,
}

impl Registry {
    fn children(&self) -> std::sync::MutexGuard<'_, HashMap<u32, Tracked>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget `pid` if it still belongs to the launch `launch_id`
    fn release(&self, pid: u32, launch_id: u64) {
        let mut children = self.children();
        if children.get(&pid).is_some_and(|t| t.launch_id == launch_id) {
            children.remove(&pid);
        }
    }
}

/// Supervisor backed by real OS processes.
///
/// Each launched child is owned by a reaper task that waits for it to exit.
/// `terminate` only reaches processes this supervisor launched and that have
/// not been reaped, by asking the reaper to signal its own child. The pid can
/// therefore never point at an unrelated process that reused the number.
#[derive(Clone, Default)]
pub struct OsSupervisor {
    registry: Arc<Registry>,
}

impl OsSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of launched children that are still alive and unkilled
    pub fn tracked(&self) -> usize {
        self.registry.children().len()
    }
}

impl ProcessSupervisor for OsSupervisor {
    async fn launch(&self, app_name: &str) -> Result<SupervisedProcess> {
        debug!("Attempting to launch {}", app_name);

        let child = Command::new(app_name)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| TimerError::launch_failed(app_name, e))?;

        let pid = child
            .id()
            .ok_or_else(|| TimerError::launch_failed(app_name, "process exited before its PID was read"))?;

        let launch_id = self.registry.next_launch_id.fetch_add(1, Ordering::Relaxed);
        let (kill_tx, kill_rx) = oneshot::channel();
        self.registry.children().insert(pid, Tracked { launch_id, kill_tx });

        tokio::spawn(reap(
            child,
            app_name.to_string(),
            pid,
            launch_id,
            kill_rx,
            Arc::clone(&self.registry),
        ));

        info!("{} launched with PID {}", app_name, pid);
        Ok(SupervisedProcess {
            pid,
            app_name: app_name.to_string(),
        })
    }

    async fn terminate(&self, pid: u32) -> Result<()> {
        debug!("Attempting to kill process with PID {}", pid);

        let tracked = self
            .registry
            .children()
            .remove(&pid)
            .ok_or_else(|| TimerError::terminate_failed(pid, "no running process launched with this PID"))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        if tracked.kill_tx.send(reply_tx).is_err() {
            return Err(TimerError::terminate_failed(pid, "process already exited"));
        }
        reply_rx
            .await
            .map_err(|_| TimerError::terminate_failed(pid, "process already exited"))??;

        info!("Process with PID {} has been killed", pid);
        Ok(())
    }
}

/// Owns `child` until it exits; serves at most one kill request meanwhile
async fn reap(
    mut child: Child,
    name: String,
    pid: u32,
    launch_id: u64,
    mut kill_rx: oneshot::Receiver<KillReply>,
    registry: Arc<Registry>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        request = &mut kill_rx => {
            if let Ok(reply) = request {
                let _ = reply.send(signal_child(&mut child, pid));
            }
            child.wait().await
        }
    };
    registry.release(pid, launch_id);

    match status {
        Ok(status) => debug!("{} (PID {}) exited with {}", name, pid, status),
        Err(e) => warn!("Failed to wait on {} (PID {}): {}", name, pid, e),
    }
}

/// Send SIGTERM to a child that is still unreaped, so its pid is still ours
fn signal_child(child: &mut Child, pid: u32) -> Result<()> {
    if let Ok(Some(status)) = child.try_wait() {
        return Err(TimerError::terminate_failed(pid, format!("process already exited with {}", status)));
    }

    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|e| TimerError::terminate_failed(pid, e))
    }

    #[cfg(not(unix))]
    {
        child.start_kill().map_err(|e| TimerError::terminate_failed(pid, e))
    }
}
