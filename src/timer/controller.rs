//! Countdown controller: the run state machine and its process lifecycle

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Notice;
use crate::{
    error::{Result, TimerError},
    services::{ProcessSupervisor, SupervisedProcess},
    state::{TimerState, TimerStatus},
    tasks::countdown_task,
};

/// Progress callback, called as `on_tick(remaining_seconds, total_seconds)`
pub type TickCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;
/// Notification callback
pub type NotifyCallback = Arc<dyn Fn(Notice) + Send + Sync>;

/// Timing knobs for a controller
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Length of one tick
    pub tick_interval: Duration,
    /// Remaining seconds at which a `TimeRunningOut` notice fires, if any
    pub warning_threshold: Option<u64>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            warning_threshold: Some(60),
        }
    }
}

/// The single run slot, only ever touched under the controller lock
enum Slot {
    Idle,
    /// Reserved while the supervisor starts the application outside the lock
    Launching { total_seconds: u64 },
    Active(Run),
}

impl Slot {
    fn status(&self) -> TimerStatus {
        match self {
            Slot::Idle => TimerStatus::Idle,
            Slot::Launching { .. } => TimerStatus::Launching,
            Slot::Active(run) => run.status,
        }
    }
}

struct Run {
    id: u64,
    /// Bumped on every resume so a retired countdown task can never act again
    segment: u64,
    status: TimerStatus,
    remaining_seconds: u64,
    total_seconds: u64,
    process: SupervisedProcess,
    on_tick: TickCallback,
    on_notify: NotifyCallback,
    ticker: Option<JoinHandle<()>>,
}

impl Run {
    fn ending(&self) -> RunEnding {
        RunEnding {
            run_id: self.id,
            process: self.process.clone(),
            on_notify: Arc::clone(&self.on_notify),
        }
    }
}

struct Shared {
    slot: Slot,
    next_run_id: u64,
}

/// What is needed to finish a run once it has left the Running/Paused states
pub(crate) struct RunEnding {
    run_id: u64,
    process: SupervisedProcess,
    on_notify: NotifyCallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndReason {
    Expired,
    Stopped,
}

/// Result of one countdown step, computed under the lock and acted on outside it
pub(crate) enum Advance {
    /// The calling task no longer owns a running segment and must exit
    Retired,
    Ticked {
        remaining_seconds: u64,
        total_seconds: u64,
        on_tick: TickCallback,
        warning: Option<(NotifyCallback, Notice)>,
    },
    Expired {
        total_seconds: u64,
        on_tick: TickCallback,
        ending: RunEnding,
    },
}

struct Inner<S> {
    shared: Mutex<Shared>,
    supervisor: S,
    config: TimerConfig,
}

/// Couples a pausable countdown to the lifetime of one supervised process.
///
/// Cloning yields another handle to the same controller. Independent timers
/// need independent controllers; there is no global state.
pub struct CountdownController<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for CountdownController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ProcessSupervisor> CountdownController<S> {
    /// Create a controller with one-second ticks and a one-minute warning
    pub fn new(supervisor: S) -> Self {
        Self::with_config(supervisor, TimerConfig::default())
    }

    pub fn with_config(supervisor: S, config: TimerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    slot: Slot::Idle,
                    next_run_id: 0,
                }),
                supervisor,
                config,
            }),
        }
    }

    pub fn supervisor(&self) -> &S {
        &self.inner.supervisor
    }

    pub fn config(&self) -> &TimerConfig {
        &self.inner.config
    }

    /// Launch `app_name` and start counting down from `duration_seconds`.
    ///
    /// Rejected with `InvalidState` unless the controller is idle. On any
    /// error the controller stays idle and no countdown runs.
    ///
    /// Callbacks run outside the lock. A panicking callback is logged and
    /// the countdown carries on; builds with `panic = "abort"` abort instead.
    pub async fn start<T, N>(&self, duration_seconds: u64, app_name: &str, on_tick: T, on_notify: N) -> Result<()>
    where
        T: Fn(u64, u64) + Send + Sync + 'static,
        N: Fn(Notice) + Send + Sync + 'static,
    {
        let app_name = app_name.trim();
        if duration_seconds == 0 {
            return Err(TimerError::invalid_input("duration must be greater than zero"));
        }
        if app_name.is_empty() {
            return Err(TimerError::invalid_input("app name cannot be empty"));
        }

        {
            let mut shared = self.lock();
            if !matches!(shared.slot, Slot::Idle) {
                return Err(TimerError::InvalidState {
                    operation: "start",
                    status: shared.slot.status(),
                });
            }
            shared.slot = Slot::Launching {
                total_seconds: duration_seconds,
            };
        }

        let mut reservation = LaunchReservation {
            controller: self,
            armed: true,
        };
        let process = self
            .inner
            .supervisor
            .launch(app_name)
            .await
            .inspect_err(|e| warn!("{}", e))?;
        reservation.armed = false;

        let mut shared = self.lock();
        shared.next_run_id += 1;
        let id = shared.next_run_id;
        info!(
            "Starting {}s countdown for {} (PID {}), run {}",
            duration_seconds, process.app_name, process.pid, id
        );
        let ticker = tokio::spawn(countdown_task(self.clone(), id, 0));
        shared.slot = Slot::Active(Run {
            id,
            segment: 0,
            status: TimerStatus::Running,
            remaining_seconds: duration_seconds,
            total_seconds: duration_seconds,
            process,
            on_tick: Arc::new(on_tick),
            on_notify: Arc::new(on_notify),
            ticker: Some(ticker),
        });
        Ok(())
    }

    /// Freeze the countdown; the supervised process keeps running
    pub async fn pause(&self) -> Result<()> {
        let ticker = {
            let mut shared = self.lock();
            let run = run_in(&mut shared.slot, "pause", &[TimerStatus::Running])?;
            run.status = TimerStatus::Paused;
            info!("Pausing run {} with {}s remaining", run.id, run.remaining_seconds);
            run.ticker.take()
        };
        retire(ticker).await;
        Ok(())
    }

    /// Continue a paused countdown from where it stopped
    pub async fn resume(&self) -> Result<()> {
        let mut shared = self.lock();
        let run = run_in(&mut shared.slot, "resume", &[TimerStatus::Paused])?;
        run.status = TimerStatus::Running;
        run.segment += 1;
        info!("Resuming run {} with {}s remaining", run.id, run.remaining_seconds);
        run.ticker = Some(tokio::spawn(countdown_task(self.clone(), run.id, run.segment)));
        Ok(())
    }

    /// End the run now and terminate the supervised process.
    ///
    /// The controller is idle afterwards even when this returns
    /// `TerminateFailed`. Only the caller that actually ends the run issues a
    /// terminate; concurrent callers get `InvalidState`.
    pub async fn stop(&self) -> Result<()> {
        let (ending, ticker) = {
            let mut shared = self.lock();
            let run = run_in(&mut shared.slot, "stop", &[TimerStatus::Running, TimerStatus::Paused])?;
            run.status = TimerStatus::Stopped;
            info!("Stopping run {} with {}s remaining", run.id, run.remaining_seconds);
            (run.ending(), run.ticker.take())
        };
        retire(ticker).await;
        self.finish(ending, EndReason::Stopped).await
    }

    /// Current status, remaining time and supervised process
    pub fn snapshot(&self) -> TimerState {
        let shared = self.lock();
        match &shared.slot {
            Slot::Idle => TimerState::idle(),
            Slot::Launching { total_seconds } => TimerState {
                status: TimerStatus::Launching,
                remaining_seconds: *total_seconds,
                total_seconds: *total_seconds,
                process: None,
            },
            Slot::Active(run) => TimerState {
                status: run.status,
                remaining_seconds: run.remaining_seconds,
                total_seconds: run.total_seconds,
                process: Some(run.process.clone()),
            },
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.lock().slot.status()
    }

    /// One decrement of the countdown owned by `run_id`/`segment`
    pub(crate) fn advance(&self, run_id: u64, segment: u64) -> Advance {
        let mut shared = self.lock();
        let run = match &mut shared.slot {
            Slot::Active(run) if run.id == run_id && run.segment == segment && run.status == TimerStatus::Running => run,
            _ => return Advance::Retired,
        };

        run.remaining_seconds = run.remaining_seconds.saturating_sub(1);
        let on_tick = Arc::clone(&run.on_tick);

        if run.remaining_seconds == 0 {
            run.status = TimerStatus::Stopped;
            // The handle belongs to the calling task; dropping it detaches.
            run.ticker.take();
            return Advance::Expired {
                total_seconds: run.total_seconds,
                on_tick,
                ending: run.ending(),
            };
        }

        let warning = match self.inner.config.warning_threshold {
            Some(threshold) if threshold == run.remaining_seconds => Some((
                Arc::clone(&run.on_notify),
                Notice::TimeRunningOut {
                    app_name: run.process.app_name.clone(),
                    remaining_seconds: run.remaining_seconds,
                },
            )),
            _ => None,
        };

        Advance::Ticked {
            remaining_seconds: run.remaining_seconds,
            total_seconds: run.total_seconds,
            on_tick,
            warning,
        }
    }

    /// Terminate the process of a run that is already `Stopped`, return the
    /// controller to idle and report how it went
    pub(crate) async fn finish(&self, ending: RunEnding, reason: EndReason) -> Result<()> {
        let result = self.inner.supervisor.terminate(ending.process.pid).await;
        if let Err(e) = &result {
            warn!("Run {} ended but its process could not be killed: {}", ending.run_id, e);
        }

        {
            let mut shared = self.lock();
            if matches!(&shared.slot, Slot::Active(run) if run.id == ending.run_id) {
                shared.slot = Slot::Idle;
            }
        }
        debug!("Run {} finished ({:?}), controller idle", ending.run_id, reason);

        let terminate_error = result.as_ref().err().map(ToString::to_string);
        let RunEnding {
            run_id,
            process,
            on_notify,
        } = ending;
        let notice = match reason {
            EndReason::Expired => Notice::Expired {
                app_name: process.app_name,
                pid: process.pid,
                terminate_error,
            },
            EndReason::Stopped => Notice::Stopped {
                app_name: process.app_name,
                pid: process.pid,
                terminate_error,
            },
        };
        call_guarded(run_id, "on_notify", || on_notify(notice));
        result
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // Callbacks never run under the lock, so a poisoned guard still holds
        // consistent state.
        self.inner.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the `Launching` reservation if the launch fails or is cancelled
struct LaunchReservation<'a, S> {
    controller: &'a CountdownController<S>,
    armed: bool,
}

impl<S> Drop for LaunchReservation<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut shared = self
            .controller
            .inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if matches!(shared.slot, Slot::Launching { .. }) {
            shared.slot = Slot::Idle;
        }
    }
}

fn run_in<'a>(slot: &'a mut Slot, operation: &'static str, allowed: &[TimerStatus]) -> Result<&'a mut Run> {
    let status = slot.status();
    match slot {
        Slot::Active(run) if allowed.contains(&run.status) => Ok(run),
        _ => Err(TimerError::InvalidState { operation, status }),
    }
}

/// Run a caller-supplied callback; a panic is logged instead of taking down
/// the countdown task with the run still marked as running
pub(crate) fn call_guarded(run_id: u64, callback: &str, f: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        warn!("Run {}: {} callback panicked", run_id, callback);
    }
}

/// Abort a countdown task and wait until it is gone
async fn retire(ticker: Option<JoinHandle<()>>) {
    if let Some(handle) = ticker {
        handle.abort();
        let _ = handle.await;
    }
}
