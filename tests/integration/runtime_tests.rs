//! [`Runtime`] ordering and concurrency tests.

use embassy_time::Instant;
use sosguard::adapters::time::SystemClock;
use sosguard::app::commands::AppCommand;
use sosguard::app::events::CoreEvent;
use sosguard::app::runtime::Runtime;
use sosguard::app::service::AppService;
use sosguard::config::TriggerConfig;
use sosguard::error::{Error, SessionKind};
use sosguard::sensors::AccelSample;

use crate::mock_hw::{MockDispatch, MockHardware, RecordingSink};

type TestRuntime = Runtime<MockHardware, RecordingSink, MockDispatch>;

fn runtime() -> TestRuntime {
    Runtime::new(
        AppService::new(TriggerConfig::default()).unwrap(),
        MockHardware::new(),
        RecordingSink::new(),
        MockDispatch::new(),
    )
}

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

fn confirmations(rt: &TestRuntime) -> usize {
    rt.inspect(|_, _, sink, _| sink.confirmations())
}

#[test]
fn out_of_order_submissions_are_processed_in_time_order() {
    let rt = runtime();
    // Submitted backwards; the queue sorts by timestamp.
    rt.submit_command(at(11_050), AppCommand::StopAlert);
    for (m, t) in [(12.0, 900), (8.0, 500), (8.0, 10), (12.0, 0)] {
        assert!(rt.submit_sample(AccelSample::from_magnitude(m, t)));
    }

    rt.run_until(at(11_000));
    assert_eq!(confirmations(&rt), 1);
    assert!(rt.inspect(|svc, hw, _, _| svc.alert().is_active() && hw.torch_on()));

    rt.run_until(at(11_050));
    let (svc, hw, _, dispatch) = rt.into_parts();
    assert!(!svc.alert().is_active());
    assert!(!hw.torch_on());
    assert!(!hw.audio_playing());
    assert_eq!(dispatch.sent.len(), 1);
}

#[test]
fn input_wins_a_tie_with_the_deadline() {
    let rt = runtime();
    rt.submit_command(at(0), AppCommand::HoldPressed);
    rt.submit_command(at(3_000), AppCommand::HoldReleased);
    rt.run_until(at(5_000));

    assert_eq!(confirmations(&rt), 0);
    assert_eq!(
        rt.inspect(|_, _, sink, _| sink.count(|e| matches!(e, CoreEvent::Cancelled { .. }))),
        1
    );
}

#[test]
fn run_until_stops_at_now() {
    let rt = runtime();
    rt.submit_command(at(0), AppCommand::HoldPressed);
    rt.run_until(at(2_999));
    assert_eq!(confirmations(&rt), 0);
    assert!(rt.next_wake().is_some_and(|t| t <= at(3_000)));

    rt.run_until(at(3_000));
    assert_eq!(confirmations(&rt), 1);
}

#[test]
fn concurrent_holds_start_exactly_one_countdown() {
    let rt = runtime();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| rt.submit_command(at(100), AppCommand::HoldPressed));
        }
    });
    rt.run_until(at(200));

    let (started, rejected) = rt.inspect(|_, _, sink, _| {
        (
            sink.count(|e| matches!(e, CoreEvent::CountdownStarted { .. })),
            sink.count(|e| {
                *e == CoreEvent::Rejected(Error::SessionAlreadyActive(SessionKind::Activation))
            }),
        )
    });
    assert_eq!(started, 1);
    assert_eq!(rejected, 3);
}

#[test]
fn sensor_and_ui_threads_share_the_runtime() {
    let rt = runtime();
    std::thread::scope(|s| {
        for lane in 0..4u64 {
            let rt = &rt;
            s.spawn(move || {
                for i in 0..10u64 {
                    rt.submit_sample(AccelSample::from_magnitude(9.8, lane + i * 100));
                }
            });
        }
        s.spawn(|| rt.submit_command(at(50), AppCommand::HoldPressed));
    });
    assert_eq!(rt.dropped_inputs(), 0);

    let processed = rt.run_until(at(3_050));
    assert!(processed >= 41);
    assert_eq!(confirmations(&rt), 1);
}

#[test]
fn full_queue_drops_and_counts() {
    let rt = runtime();
    let mut accepted = 0;
    for i in 0..100u64 {
        if rt.submit_sample(AccelSample::from_magnitude(9.8, i)) {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 64);
    assert_eq!(rt.dropped_inputs(), 36);
    assert_eq!(rt.run_until(at(1_000)), 64);
}

#[test]
fn run_pending_reads_the_clock() {
    let rt = runtime();
    rt.submit_command(at(0), AppCommand::HoldPressed);
    assert!(rt.run_pending(&SystemClock::new()) >= 1);
    assert_eq!(
        rt.inspect(|_, _, sink, _| {
            sink.count(|e| matches!(e, CoreEvent::CountdownStarted { .. }))
        }),
        1
    );
}
