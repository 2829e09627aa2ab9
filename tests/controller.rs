mod common;

use std::time::Duration;

use app_timer::{CountdownController, Notice, TimerConfig, TimerError, TimerStatus};
use tokio::time::sleep;

use common::{FakeSupervisor, Recorder};

fn controller() -> CountdownController<FakeSupervisor> {
    CountdownController::new(FakeSupervisor::new())
}

async fn start(c: &CountdownController<FakeSupervisor>, seconds: u64, rec: &Recorder) {
    c.start(seconds, "sleep", rec.on_tick(), rec.on_notify())
        .await
        .expect("start should succeed");
}

#[tokio::test(start_paused = true)]
async fn start_then_stop_kills_without_ticking() {
    let c = controller();
    let rec = Recorder::default();

    start(&c, 30, &rec).await;
    assert_eq!(c.status(), TimerStatus::Running);

    c.stop().await.unwrap();

    assert_eq!(c.supervisor().terminated(), vec![1000]);
    assert_eq!(c.status(), TimerStatus::Idle);
    assert!(rec.ticks().is_empty());
    assert_eq!(
        rec.notices(),
        vec![Notice::Stopped {
            app_name: "sleep".into(),
            pid: 1000,
            terminate_error: None,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn three_second_run_ticks_down_and_expires_once() {
    let c = controller();
    let rec = Recorder::default();

    start(&c, 3, &rec).await;
    sleep(Duration::from_millis(3500)).await;

    assert_eq!(rec.ticks(), vec![(2, 3), (1, 3), (0, 3)]);
    assert_eq!(c.supervisor().terminated(), vec![1000]);
    assert_eq!(c.snapshot(), app_timer::TimerState::idle());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(rec.ticks().len(), 3);
    assert_eq!(c.supervisor().terminated().len(), 1);
    assert_eq!(
        rec.notices(),
        vec![Notice::Expired {
            app_name: "sleep".into(),
            pid: 1000,
            terminate_error: None,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_keep_effective_ticks() {
    let c = controller();
    let rec = Recorder::default();

    start(&c, 100, &rec).await;
    sleep(Duration::from_millis(10_500)).await;
    c.pause().await.unwrap();

    let paused = c.snapshot();
    assert_eq!(paused.status, TimerStatus::Paused);
    assert_eq!(paused.remaining_seconds, 90);
    assert!((paused.progress() - 0.1).abs() < 1e-9);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(c.snapshot().remaining_seconds, 90);
    assert_eq!(rec.ticks().len(), 10);
    assert!(c.supervisor().terminated().is_empty());

    c.resume().await.unwrap();
    let resumed = c.snapshot();
    assert_eq!(resumed.status, TimerStatus::Running);
    assert_eq!(resumed.remaining_seconds, 90);
    assert_eq!(resumed.total_seconds, 100);

    sleep(Duration::from_secs(100)).await;

    let expected: Vec<(u64, u64)> = (0..100).rev().map(|r| (r, 100)).collect();
    assert_eq!(rec.ticks(), expected);
    assert_eq!(c.supervisor().terminated().len(), 1);
    assert_eq!(c.status(), TimerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn rapid_pause_resume_never_runs_two_loops() {
    let c = controller();
    let rec = Recorder::default();

    start(&c, 10, &rec).await;
    sleep(Duration::from_millis(500)).await;
    c.pause().await.unwrap();
    c.resume().await.unwrap();
    c.pause().await.unwrap();
    c.resume().await.unwrap();

    sleep(Duration::from_millis(2100)).await;
    assert_eq!(rec.ticks(), vec![(9, 10), (8, 10)]);
    assert_eq!(c.snapshot().remaining_seconds, 8);
}

#[tokio::test(start_paused = true)]
async fn warning_fires_once_at_sixty_seconds() {
    let c = controller();
    let rec = Recorder::default();

    start(&c, 62, &rec).await;
    sleep(Duration::from_secs(70)).await;

    assert_eq!(rec.warnings(), 1);
    assert_eq!(
        rec.notices().first(),
        Some(&Notice::TimeRunningOut {
            app_name: "sleep".into(),
            remaining_seconds: 60,
        })
    );
    assert!(matches!(rec.notices().last(), Some(Notice::Expired { .. })));
}

#[tokio::test(start_paused = true)]
async fn no_warning_for_runs_of_a_minute_or_less() {
    for seconds in [59, 60] {
        let c = controller();
        let rec = Recorder::default();

        start(&c, seconds, &rec).await;
        sleep(Duration::from_secs(65)).await;

        assert_eq!(rec.warnings(), 0, "duration {}", seconds);
        assert_eq!(c.status(), TimerStatus::Idle);
    }
}

#[tokio::test(start_paused = true)]
async fn warning_threshold_is_configurable() {
    let config = TimerConfig {
        warning_threshold: Some(5),
        ..TimerConfig::default()
    };
    let c = CountdownController::with_config(FakeSupervisor::new(), config);
    let rec = Recorder::default();

    start(&c, 8, &rec).await;
    sleep(Duration::from_secs(10)).await;

    assert_eq!(rec.warnings(), 1);
    assert_eq!(rec.notices()[0].to_string(), "5 seconds remaining!");
}

#[tokio::test(start_paused = true)]
async fn invalid_input_launches_nothing() {
    let c = controller();
    let rec = Recorder::default();

    let err = c.start(0, "sleep", rec.on_tick(), rec.on_notify()).await.unwrap_err();
    assert!(matches!(err, TimerError::InvalidInput(_)));

    let err = c.start(10, "   ", rec.on_tick(), rec.on_notify()).await.unwrap_err();
    assert!(matches!(err, TimerError::InvalidInput(_)));

    assert!(c.supervisor().launched().is_empty());
    assert_eq!(c.status(), TimerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn launch_failure_leaves_controller_idle() {
    let c = controller();
    let rec = Recorder::default();
    c.supervisor().fail_launch.store(true, std::sync::atomic::Ordering::SeqCst);

    let err = c.start(10, "no-such-app", rec.on_tick(), rec.on_notify()).await.unwrap_err();
    assert!(matches!(err, TimerError::LaunchFailed { .. }));
    assert_eq!(c.status(), TimerStatus::Idle);

    sleep(Duration::from_secs(5)).await;
    assert!(rec.ticks().is_empty());

    c.supervisor().fail_launch.store(false, std::sync::atomic::Ordering::SeqCst);
    start(&c, 10, &rec).await;
    assert_eq!(c.status(), TimerStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn start_is_rejected_while_a_run_is_active() {
    let c = controller();
    let rec = Recorder::default();

    start(&c, 30, &rec).await;
    let err = c.start(10, "other", rec.on_tick(), rec.on_notify()).await.unwrap_err();
    assert_eq!(
        err,
        TimerError::InvalidState {
            operation: "start",
            status: TimerStatus::Running,
        }
    );

    c.pause().await.unwrap();
    let err = c.start(10, "other", rec.on_tick(), rec.on_notify()).await.unwrap_err();
    assert!(matches!(err, TimerError::InvalidState { status: TimerStatus::Paused, .. }));

    assert_eq!(c.supervisor().launched(), vec!["sleep".to_string()]);
    assert_eq!(c.snapshot().remaining_seconds, 30);
}

#[tokio::test(start_paused = true)]
async fn operations_outside_their_state_are_rejected() {
    let c = controller();
    let rec = Recorder::default();

    for err in [c.pause().await, c.resume().await, c.stop().await] {
        assert!(matches!(err, Err(TimerError::InvalidState { status: TimerStatus::Idle, .. })));
    }

    start(&c, 30, &rec).await;
    assert!(matches!(c.resume().await, Err(TimerError::InvalidState { operation: "resume", .. })));

    c.pause().await.unwrap();
    assert!(matches!(c.pause().await, Err(TimerError::InvalidState { operation: "pause", .. })));

    assert!(c.supervisor().terminated().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_from_paused_kills_the_process() {
    let c = controller();
    let rec = Recorder::default();

    start(&c, 30, &rec).await;
    sleep(Duration::from_millis(2500)).await;
    c.pause().await.unwrap();
    c.stop().await.unwrap();

    assert_eq!(c.supervisor().terminated(), vec![1000]);
    assert_eq!(c.status(), TimerStatus::Idle);
    assert_eq!(rec.ticks().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_stops_terminate_once() {
    let c = controller();
    let rec = Recorder::default();

    start(&c, 30, &rec).await;
    let other = c.clone();
    let (first, second) = tokio::join!(c.stop(), other.stop());

    let ok = [&first, &second].iter().filter(|r| r.is_ok()).count();
    let rejected = [&first, &second]
        .iter()
        .filter(|r| matches!(r, Err(TimerError::InvalidState { .. })))
        .count();
    assert_eq!((ok, rejected), (1, 1));
    assert_eq!(c.supervisor().terminated().len(), 1);
    assert_eq!(c.status(), TimerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn no_ticks_after_stop() {
    let c = controller();
    let rec = Recorder::default();

    start(&c, 10, &rec).await;
    sleep(Duration::from_millis(2500)).await;
    c.stop().await.unwrap();
    sleep(Duration::from_secs(20)).await;

    assert_eq!(rec.ticks(), vec![(9, 10), (8, 10)]);
    assert_eq!(c.supervisor().terminated().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_kill_on_stop_still_resets() {
    let c = CountdownController::new(FakeSupervisor::failing_terminate());
    let rec = Recorder::default();

    start(&c, 30, &rec).await;
    let err = c.stop().await.unwrap_err();

    assert!(matches!(err, TimerError::TerminateFailed { pid: 1000, .. }));
    assert_eq!(c.status(), TimerStatus::Idle);
    assert!(rec.notices()[0].is_failure());

    // The controller is usable again right away
    start(&c, 5, &rec).await;
    assert_eq!(c.snapshot().process.map(|p| p.pid), Some(1001));
}

#[tokio::test(start_paused = true)]
async fn failed_kill_on_expiry_still_resets() {
    let c = CountdownController::new(FakeSupervisor::failing_terminate());
    let rec = Recorder::default();

    start(&c, 2, &rec).await;
    sleep(Duration::from_secs(3)).await;

    assert_eq!(c.status(), TimerStatus::Idle);
    assert_eq!(c.supervisor().terminated(), vec![1000]);
    match rec.notices().as_slice() {
        [Notice::Expired {
            terminate_error: Some(reason),
            ..
        }] => assert!(reason.contains("Operation not permitted")),
        other => panic!("unexpected notices: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn controllers_are_independent() {
    let a = controller();
    let b = controller();
    let (rec_a, rec_b) = (Recorder::default(), Recorder::default());

    start(&a, 2, &rec_a).await;
    start(&b, 5, &rec_b).await;
    sleep(Duration::from_millis(2500)).await;

    assert_eq!(a.status(), TimerStatus::Idle);
    assert_eq!(b.status(), TimerStatus::Running);
    assert_eq!(b.snapshot().remaining_seconds, 3);
    assert!(b.supervisor().terminated().is_empty());
}

#[tokio::test(start_paused = true)]
async fn operations_during_launch_are_rejected() {
    let c = CountdownController::new(FakeSupervisor::slow_launch(Duration::from_secs(2)));
    let rec = Recorder::default();

    let starter = c.clone();
    let hooks = rec.clone();
    let first = tokio::spawn(async move {
        starter
            .start(10, "sleep", hooks.on_tick(), hooks.on_notify())
            .await
    });
    sleep(Duration::from_millis(100)).await;

    let launching = c.snapshot();
    assert_eq!(launching.status, TimerStatus::Launching);
    assert_eq!(launching.remaining_seconds, 10);
    assert_eq!(launching.process, None);

    let err = c.start(5, "other", rec.on_tick(), rec.on_notify()).await.unwrap_err();
    assert_eq!(
        err,
        TimerError::InvalidState {
            operation: "start",
            status: TimerStatus::Launching,
        }
    );
    for (operation, result) in [
        ("pause", c.pause().await),
        ("resume", c.resume().await),
        ("stop", c.stop().await),
    ] {
        assert_eq!(
            result,
            Err(TimerError::InvalidState {
                operation,
                status: TimerStatus::Launching,
            })
        );
    }

    first.await.unwrap().unwrap();
    assert_eq!(c.status(), TimerStatus::Running);
    assert_eq!(c.supervisor().launched(), vec!["sleep".to_string()]);
    assert!(c.supervisor().terminated().is_empty());

    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(rec.ticks().len(), 10);
    assert_eq!(c.supervisor().terminated(), vec![1000]);
    assert_eq!(c.status(), TimerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn cancelled_launch_releases_the_slot() {
    let c = CountdownController::new(FakeSupervisor::slow_launch(Duration::from_secs(2)));
    let rec = Recorder::default();

    let starter = c.clone();
    let hooks = rec.clone();
    let first = tokio::spawn(async move {
        starter
            .start(10, "sleep", hooks.on_tick(), hooks.on_notify())
            .await
    });
    sleep(Duration::from_millis(100)).await;
    assert_eq!(c.status(), TimerStatus::Launching);

    first.abort();
    assert!(first.await.unwrap_err().is_cancelled());
    assert_eq!(c.status(), TimerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn panicking_callback_does_not_stall_the_run() {
    let c = controller();
    let rec = Recorder::default();

    let on_tick = |remaining: u64, _total: u64| {
        if remaining == 2 {
            panic!("progress display went away");
        }
    };
    c.start(3, "sleep", on_tick, rec.on_notify()).await.unwrap();
    sleep(Duration::from_millis(3500)).await;

    assert_eq!(c.status(), TimerStatus::Idle);
    assert_eq!(c.supervisor().terminated(), vec![1000]);
    assert!(matches!(rec.notices().as_slice(), [Notice::Expired { .. }]));
}
