//! End-to-end scenarios through [`AppService`] with mock ports.

use embassy_time::Instant;
use sosguard::activation::{SessionHandle, TriggerSource};
use sosguard::alert::pulse::{COLOUR_BLUE, COLOUR_RED};
use sosguard::alert::Channel;
use sosguard::app::commands::AppCommand;
use sosguard::app::events::{CoreEvent, DispatchError};
use sosguard::app::service::AppService;
use sosguard::config::TriggerConfig;
use sosguard::error::{Error, HardwareError, SessionKind};
use sosguard::scheduler::TimerChannel;
use sosguard::sensors::AccelSample;

use crate::mock_hw::{HwCall, MockDispatch, MockHardware, RecordingSink};

// ── Harness ───────────────────────────────────────────────────

struct Harness {
    app: AppService,
    hw: MockHardware,
    sink: RecordingSink,
    dispatch: MockDispatch,
}

impl Harness {
    fn new() -> Self {
        Self::with(MockHardware::new(), MockDispatch::new())
    }

    fn with(hw: MockHardware, dispatch: MockDispatch) -> Self {
        Self {
            app: AppService::new(TriggerConfig::default()).unwrap(),
            hw,
            sink: RecordingSink::new(),
            dispatch,
        }
    }

    /// Fire timers up to `ms`.
    fn advance(&mut self, ms: u64) {
        self.app.advance(
            Instant::from_millis(ms),
            &mut self.hw,
            &mut self.sink,
            &mut self.dispatch,
        );
    }

    fn sample(&mut self, magnitude: f32, ms: u64) {
        self.advance(ms);
        self.app.handle_sample(
            AccelSample::from_magnitude(magnitude, ms),
            &mut self.hw,
            &mut self.sink,
            &mut self.dispatch,
        );
    }

    fn command(&mut self, ms: u64, cmd: AppCommand) {
        self.advance(ms);
        self.app.handle_command(
            cmd,
            Instant::from_millis(ms),
            &mut self.hw,
            &mut self.sink,
            &mut self.dispatch,
        );
    }

    /// The canonical fall trace: detection at 900 ms.
    fn fall(&mut self) {
        for (m, t) in [(12.0, 0), (8.0, 10), (8.0, 500), (12.0, 900)] {
            self.sample(m, t);
        }
    }
}

// ── Fall path ─────────────────────────────────────────────────

#[test]
fn fall_trace_confirms_dispatches_and_alerts() {
    let mut h = Harness::with(MockHardware::new(), MockDispatch::with_location("12 Harbour Rd"));
    h.fall();

    let hits: Vec<_> = h
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::FallImpactDetected(d) => Some(*d),
            _ => None,
        })
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].freefall_start, Instant::from_millis(10));
    assert_eq!(hits[0].impact_at, Instant::from_millis(900));
    assert!(h.app.activation().is_counting());

    h.advance(10_899);
    assert_eq!(h.sink.confirmations(), 0);
    assert!(h.dispatch.sent.is_empty());

    h.advance(10_900);
    assert_eq!(h.sink.confirmations(), 1);
    assert_eq!(h.dispatch.sent.len(), 1);
    let req = &h.dispatch.sent[0];
    assert_eq!(req.session, SessionHandle(1));
    assert_eq!(req.source, TriggerSource::FallDetected);
    assert_eq!(req.location.as_deref(), Some("12 Harbour Rd"));

    assert!(h.app.alert().is_active());
    assert_eq!(h.app.alert().trigger(), Some(SessionHandle(1)));
    assert!(h.hw.torch_on());
    assert!(h.hw.audio_playing());
    assert_eq!(h.hw.screen_calls(), vec![COLOUR_RED]);

    // Nothing else confirms however long we wait.
    h.advance(60_000);
    assert_eq!(h.sink.confirmations(), 1);
    assert_eq!(h.dispatch.sent.len(), 1);
}

#[test]
fn stop_mid_flash_leaves_everything_off() {
    let mut h = Harness::new();
    h.fall();
    h.advance(10_900);
    h.command(11_050, AppCommand::StopAlert);

    assert!(!h.app.alert().is_active());
    assert!(!h.hw.torch_on());
    assert!(!h.hw.audio_playing());
    assert_eq!(h.app.pending_timers(TimerChannel::Flashlight), 0);
    assert_eq!(h.app.pending_timers(TimerChannel::ScreenPulse), 0);
    assert!(h.app.next_deadline().is_none());

    let calls_at_stop = h.hw.calls.len();
    h.advance(30_000);
    assert_eq!(h.hw.calls.len(), calls_at_stop, "no transitions after stop");
    assert_eq!(
        h.sink.count(|e| matches!(e, CoreEvent::AlertStopped(_))),
        1
    );

    // A second stop is harmless.
    h.command(30_001, AppCommand::StopAlert);
    assert_eq!(h.hw.calls.len(), calls_at_stop);
}

#[test]
fn screen_alternates_while_alerting() {
    let mut h = Harness::new();
    h.fall();
    h.advance(10_900 + 300 * 3);
    assert_eq!(
        h.hw.screen_calls(),
        vec![COLOUR_RED, COLOUR_BLUE, COLOUR_RED, COLOUR_BLUE]
    );
}

#[test]
fn countdown_progress_runs_down() {
    let mut h = Harness::new();
    h.fall();
    h.advance(10_900);

    let progress: Vec<_> = h
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::CountdownProgress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(!progress.is_empty());
    assert_eq!(progress[0].remaining_ticks, 10);
    assert_eq!(progress[0].remaining_ms, 10_000);
    for pair in progress.windows(2) {
        assert!(pair[1].remaining_ms < pair[0].remaining_ms);
        assert!(pair[1].fraction >= pair[0].fraction);
    }
}

#[test]
fn cancel_before_deadline_prevents_confirmation() {
    let mut h = Harness::new();
    h.fall();
    h.command(5_000, AppCommand::CancelCountdown);
    h.advance(20_000);

    assert_eq!(h.sink.confirmations(), 0);
    assert!(h.dispatch.sent.is_empty());
    assert!(!h.app.alert().is_active());
    assert_eq!(
        h.sink.count(|e| matches!(
            e,
            CoreEvent::Cancelled {
                source: TriggerSource::FallDetected,
                ..
            }
        )),
        1
    );
}

#[test]
fn cancel_at_the_deadline_wins() {
    let mut h = Harness::new();
    h.fall();
    h.advance(10_000);
    // Delivered before the 10 900 ms timer is fired.
    h.app.handle_command(
        AppCommand::CancelCountdown,
        Instant::from_millis(10_900),
        &mut h.hw,
        &mut h.sink,
        &mut h.dispatch,
    );
    h.advance(11_000);
    assert_eq!(h.sink.confirmations(), 0);
    assert!(h.dispatch.sent.is_empty());
}

// ── Manual hold path ──────────────────────────────────────────

#[test]
fn manual_hold_released_early_cancels() {
    let mut h = Harness::new();
    h.command(0, AppCommand::HoldPressed);
    h.command(1_200, AppCommand::HoldReleased);
    h.advance(10_000);

    assert_eq!(h.sink.confirmations(), 0);
    assert!(h.hw.calls.is_empty());
}

#[test]
fn manual_hold_held_to_the_end_confirms() {
    let mut h = Harness::new();
    h.command(0, AppCommand::HoldPressed);
    h.advance(3_000);

    assert_eq!(h.sink.confirmations(), 1);
    assert_eq!(h.dispatch.sent[0].source, TriggerSource::ManualHold);
    assert!(h.app.alert().is_active());

    // Releasing after confirmation changes nothing.
    h.command(3_100, AppCommand::HoldReleased);
    assert!(h.app.alert().is_active());
}

#[test]
fn hold_during_fall_countdown_is_rejected() {
    let mut h = Harness::new();
    h.fall();
    h.command(2_000, AppCommand::HoldPressed);

    assert!(h.sink.events.contains(&CoreEvent::Rejected(
        Error::SessionAlreadyActive(SessionKind::Activation)
    )));
    // The hold release must not cancel the fall countdown.
    h.command(2_500, AppCommand::HoldReleased);
    assert!(h.app.activation().is_counting());
    h.advance(10_900);
    assert_eq!(h.sink.confirmations(), 1);
}

#[test]
fn second_confirmation_during_alert_is_rejected() {
    let mut h = Harness::new();
    h.fall();
    h.advance(10_900);
    let first = h.app.alert().active();

    h.command(12_000, AppCommand::HoldPressed);
    h.advance(15_000);

    assert_eq!(h.sink.confirmations(), 2);
    assert_eq!(h.dispatch.sent.len(), 2);
    assert!(h.sink.events.contains(&CoreEvent::Rejected(
        Error::SessionAlreadyActive(SessionKind::Alert)
    )));
    assert_eq!(h.app.alert().active(), first);
}

// ── Configuration and lifecycle ───────────────────────────────

#[test]
fn disabled_fall_detection_ignores_samples() {
    let mut h = Harness::new();
    h.command(0, AppCommand::SetFallDetection(false));
    for (m, t) in [(8.0, 10), (12.0, 900)] {
        h.sample(m, t);
    }
    assert_eq!(
        h.sink.count(|e| matches!(e, CoreEvent::FallImpactDetected(_))),
        0
    );
    assert!(!h.app.activation().is_counting());

    h.command(1_000, AppCommand::SetFallDetection(true));
    for (m, t) in [(8.0, 1_010), (12.0, 1_500)] {
        h.sample(m, t);
    }
    assert!(h.app.activation().is_counting());
}

#[test]
fn invalid_config_update_is_rejected_and_old_config_kept() {
    let mut h = Harness::new();
    let mut bad = TriggerConfig::default();
    bad.hold_duration_ms = 0;
    h.command(0, AppCommand::UpdateConfig(bad));

    assert!(
        h.sink
            .events
            .iter()
            .any(|e| matches!(e, CoreEvent::Rejected(Error::Config(_))))
    );
    assert_eq!(h.app.config(), &TriggerConfig::default());
}

#[test]
fn shorter_hold_applies_to_next_session() {
    let mut h = Harness::new();
    let mut quick = TriggerConfig::default();
    quick.hold_duration_ms = 1_000;
    h.command(0, AppCommand::UpdateConfig(quick));
    h.command(100, AppCommand::HoldPressed);
    h.advance(1_100);
    assert_eq!(h.sink.confirmations(), 1);
}

#[test]
fn shutdown_cancels_countdown_and_stops_alert() {
    let mut h = Harness::new();
    h.fall();
    h.advance(10_900);
    h.command(12_000, AppCommand::HoldPressed);
    h.command(12_500, AppCommand::Shutdown);

    assert!(!h.app.activation().is_counting());
    assert!(!h.app.alert().is_active());
    assert!(!h.hw.torch_on());
    assert!(!h.hw.audio_playing());
    assert!(h.app.next_deadline().is_none());
}

// ── Failure handling ──────────────────────────────────────────

#[test]
fn dispatch_failure_is_reported_and_alert_still_runs() {
    let dispatch = MockDispatch {
        fail_with: Some(DispatchError::NoRecipients),
        ..MockDispatch::default()
    };
    let mut h = Harness::with(MockHardware::new(), dispatch);
    h.fall();
    h.advance(10_900);

    assert!(h.sink.events.contains(&CoreEvent::DispatchFailed {
        session: SessionHandle(1),
        error: DispatchError::NoRecipients,
    }));
    assert_eq!(h.dispatch.sent.len(), 1);
    assert!(h.app.alert().is_active());
}

#[test]
fn torch_fault_is_reported_once_and_siren_keeps_playing() {
    let hw = MockHardware {
        torch_broken: true,
        ..MockHardware::default()
    };
    let mut h = Harness::with(hw, MockDispatch::new());
    h.fall();
    h.advance(17_000);

    let faults = h.sink.count(|e| {
        matches!(
            e,
            CoreEvent::HardwareFault {
                channel: Channel::Flashlight,
                error: HardwareError::Unavailable,
            }
        )
    });
    assert_eq!(faults, 1);
    assert!(h.hw.audio_playing());
    assert!(h.app.alert().health().is_faulted(Channel::Flashlight));
    assert!(!h.app.alert().health().is_faulted(Channel::AudioLoop));
    // The pattern keeps being attempted.
    assert!(h.hw.torch_calls().len() > 18);
}

#[test]
fn siren_fault_at_start_keeps_torch_and_screen_running() {
    let hw = MockHardware {
        audio_broken: true,
        ..MockHardware::default()
    };
    let mut h = Harness::with(hw, MockDispatch::new());
    h.fall();
    h.advance(12_000);

    assert!(h.sink.events.contains(&CoreEvent::HardwareFault {
        channel: Channel::AudioLoop,
        error: HardwareError::Rejected,
    }));
    assert!(h.app.alert().is_active());
    assert!(!h.app.alert().siren_playing());
    assert!(h.hw.torch_calls().len() > 5);
    assert!(h.hw.screen_calls().len() > 3);

    // Stop still works and still tries to silence the siren.
    h.command(12_100, AppCommand::StopAlert);
    assert!(!h.app.alert().is_active());
    assert_eq!(h.hw.calls.last(), Some(&HwCall::AudioStop));
}

#[test]
fn torch_rejecting_the_stop_still_stops_audio() {
    let mut h = Harness::new();
    h.fall();
    h.advance(10_900);
    let alert = h.app.alert().active().unwrap();
    h.hw.torch_broken = true;
    h.command(11_000, AppCommand::StopAlert);

    assert!(!h.hw.audio_playing());
    assert!(!h.app.alert().is_active());
    assert!(h.sink.events.contains(&CoreEvent::HardwareFault {
        channel: Channel::Flashlight,
        error: HardwareError::Unavailable,
    }));
    assert_eq!(h.sink.events.last(), Some(&CoreEvent::AlertStopped(alert)));
    assert!(h.app.next_deadline().is_none());
}

#[test]
fn screen_fault_is_reported_once_and_pulse_keeps_trying() {
    let hw = MockHardware {
        screen_broken: true,
        ..MockHardware::default()
    };
    let mut h = Harness::with(hw, MockDispatch::new());
    h.fall();
    h.advance(12_100);

    let faults = h.sink.count(|e| {
        matches!(
            e,
            CoreEvent::HardwareFault {
                channel: Channel::ScreenPulse,
                ..
            }
        )
    });
    assert_eq!(faults, 1);
    assert_eq!(h.hw.screen_calls().len(), 5);
    assert!(h.hw.torch_calls().len() > 5);
    assert!(h.hw.audio_playing());
}
