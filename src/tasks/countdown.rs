//! Countdown background task

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::{
    services::ProcessSupervisor,
    timer::{call_guarded, Advance, CountdownController, EndReason},
};

/// Decrement loop for one running segment of a run.
///
/// Each `start` or `resume` spawns one of these. The task checks, under the
/// controller lock, that it still owns the running segment before every
/// decrement and exits as soon as it does not.
pub(crate) async fn countdown_task<S: ProcessSupervisor>(controller: CountdownController<S>, run_id: u64, segment: u64) {
    let period = controller.config().tick_interval.max(Duration::from_millis(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!("Countdown task started for run {} segment {}", run_id, segment);

    loop {
        interval.tick().await;

        match controller.advance(run_id, segment) {
            Advance::Retired => {
                debug!("Countdown task for run {} segment {} retired", run_id, segment);
                return;
            }
            Advance::Ticked {
                remaining_seconds,
                total_seconds,
                on_tick,
                warning,
            } => {
                call_guarded(run_id, "on_tick", || on_tick(remaining_seconds, total_seconds));
                if let Some((on_notify, notice)) = warning {
                    info!("Run {}: {}", run_id, notice);
                    call_guarded(run_id, "on_notify", || on_notify(notice));
                }
            }
            Advance::Expired {
                total_seconds,
                on_tick,
                ending,
            } => {
                call_guarded(run_id, "on_tick", || on_tick(0, total_seconds));
                info!("Timer for run {} expired, closing application", run_id);
                // Failures are already carried by the Expired notice.
                let _ = controller.finish(ending, EndReason::Expired).await;
                return;
            }
        }
    }
}
