//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the fall detector, activation controller, alert
//! sequencer and the shared timer queue.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected
//! at call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  AccelSample ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  AppCommand  ──▶ │          AppService          │ ──▶ DispatchPort
//!                  │ FallDetector · Activation    │
//!  TimerQueue  ◀──▶│ AlertSequencer               │ ──▶ AlertOutputs
//!                  └──────────────────────────────┘
//! ```
//!
//! The service is single-threaded and never reads a clock.  Callers
//! deliver inputs and fire timers in timestamp order; the
//! [`Runtime`](super::runtime::Runtime) does that under one lock.

use embassy_time::Instant;
use log::{debug, info, warn};

use crate::activation::{ActivationController, SessionHandle, TriggerSource};
use crate::alert::AlertSequencer;
use crate::config::TriggerConfig;
use crate::error::{Error, Result};
use crate::events::Input;
use crate::scheduler::{Timer, TimerAction, TimerChannel, TimerQueue};
use crate::sensors::AccelSample;
use crate::sensors::fall::FallDetector;

use super::commands::AppCommand;
use super::events::{AlertRequest, CoreEvent};
use super::ports::{AlertOutputs, DispatchPort, EventSink};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: TriggerConfig,
    detector: FallDetector,
    activation: ActivationController,
    alert: AlertSequencer,
    timers: TimerQueue,
}

impl AppService {
    /// Construct the service from a validated configuration.
    pub fn new(config: TriggerConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "AppService: fall detection {}, hold {}ms, fall countdown {}ms, SOS cycle {}ms",
            if config.fall_detection_enabled { "on" } else { "off" },
            config.hold_duration_ms,
            config.fall_countdown_ms,
            config.morse.cycle_ms()
        );
        Ok(Self {
            detector: FallDetector::new(&config),
            activation: ActivationController::new(&config),
            alert: AlertSequencer::new(),
            timers: TimerQueue::new(),
            config,
        })
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Route one queued input.
    pub fn handle_input(
        &mut self,
        at: Instant,
        input: Input,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
        dispatch: &mut impl DispatchPort,
    ) {
        match input {
            Input::Sample(sample) => self.handle_sample(sample, hw, sink, dispatch),
            Input::Command(cmd) => self.handle_command(cmd, at, hw, sink, dispatch),
        }
    }

    /// Feed one accelerometer sample.  A detected fall starts the
    /// fall-confirmation countdown at the impact timestamp.
    pub fn handle_sample(
        &mut self,
        sample: AccelSample,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
        dispatch: &mut impl DispatchPort,
    ) {
        if !self.config.fall_detection_enabled {
            return;
        }
        if let Err(e) = sample.validate() {
            debug!("sample at {}ms ignored: {e}", sample.t.as_millis());
            return;
        }
        let Some(hit) = self.detector.on_sample(sample) else {
            return;
        };

        info!(
            "Fall detected: free-fall {}ms, impact {}ms",
            hit.freefall_start.as_millis(),
            hit.impact_at.as_millis()
        );
        sink.emit(&CoreEvent::FallImpactDetected(hit));
        if let Err(e) = self.activation.on_fall_detected(hit.impact_at) {
            sink.emit(&CoreEvent::Rejected(e));
        }
        self.flush_activation(hit.impact_at, hw, sink, dispatch);
    }

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now: Instant,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
        dispatch: &mut impl DispatchPort,
    ) {
        match cmd {
            AppCommand::HoldPressed => {
                if let Err(e) = self.activation.start_manual_hold(now) {
                    sink.emit(&CoreEvent::Rejected(e));
                }
            }
            AppCommand::HoldReleased => match self.activation.session() {
                Some(s) if s.source == TriggerSource::ManualHold => {
                    self.activation.cancel(s.id, now);
                }
                _ => debug!("HoldReleased with no hold countdown, ignored"),
            },
            AppCommand::CancelCountdown => {
                if let Some(s) = self.activation.session() {
                    self.activation.cancel(s.id, now);
                }
            }
            AppCommand::StopAlert => {
                if !self.alert.stop_active(&mut self.timers, hw, sink) {
                    debug!("StopAlert with no live alert, ignored");
                }
            }
            AppCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Configuration update rejected: {e}");
                    sink.emit(&CoreEvent::Rejected(Error::from(e)));
                    return;
                }
                self.detector.reconfigure(&new_config);
                self.activation.reconfigure(&new_config);
                self.config = new_config;
                if !self.config.fall_detection_enabled {
                    self.detector.reset();
                }
                info!("Configuration updated at runtime");
            }
            AppCommand::SetFallDetection(enabled) => {
                self.config.fall_detection_enabled = enabled;
                if !enabled {
                    self.detector.reset();
                }
                info!("Fall detection {}", if enabled { "enabled" } else { "disabled" });
            }
            AppCommand::Shutdown => {
                info!("Shutdown: cancelling countdown, stopping alert");
                if let Some(s) = self.activation.session() {
                    self.activation.cancel(s.id, now);
                }
                self.alert.stop_active(&mut self.timers, hw, sink);
                self.detector.reset();
            }
        }
        self.flush_activation(now, hw, sink, dispatch);
    }

    // ── Timers ────────────────────────────────────────────────

    /// Fire every timer due at or before `now`, in order.
    pub fn advance(
        &mut self,
        now: Instant,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
        dispatch: &mut impl DispatchPort,
    ) -> usize {
        let mut fired = 0;
        while self.fire_next(now, hw, sink, dispatch) {
            fired += 1;
        }
        fired
    }

    /// Fire the earliest timer if it is due.  Returns whether one fired.
    pub fn fire_next(
        &mut self,
        now: Instant,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
        dispatch: &mut impl DispatchPort,
    ) -> bool {
        let Some(timer) = self.timers.pop_due(now) else {
            return false;
        };
        self.fire(timer, hw, sink, dispatch);
        true
    }

    /// Earliest pending timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn detector(&self) -> &FallDetector {
        &self.detector
    }

    pub fn activation(&self) -> &ActivationController {
        &self.activation
    }

    pub fn alert(&self) -> &AlertSequencer {
        &self.alert
    }

    pub fn pending_timers(&self, channel: TimerChannel) -> usize {
        self.timers.pending(channel)
    }

    // ── Internal ──────────────────────────────────────────────

    fn fire(
        &mut self,
        timer: Timer,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
        dispatch: &mut impl DispatchPort,
    ) {
        match timer.action {
            TimerAction::ActivationWake => {
                self.activation.tick(timer.fire_at);
                self.flush_activation(timer.fire_at, hw, sink, dispatch);
            }
            action => self.alert.on_timer(action, &mut self.timers, hw, sink),
        }
    }

    /// Forward activation events, act on a confirmation, and keep exactly
    /// one activation timer queued for the controller's next wake.
    fn flush_activation(
        &mut self,
        now: Instant,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
        dispatch: &mut impl DispatchPort,
    ) {
        for event in self.activation.take_events() {
            sink.emit(&event);
            if let CoreEvent::EmergencyConfirmed { session, source } = event {
                self.on_confirmed(session, source, now, hw, sink, dispatch);
            }
        }

        self.timers.cancel_channel(TimerChannel::Activation);
        if let Some(wake) = self.activation.next_wake() {
            self.timers.schedule(wake, TimerAction::ActivationWake);
        }
    }

    fn on_confirmed(
        &mut self,
        session: SessionHandle,
        source: TriggerSource,
        now: Instant,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
        dispatch: &mut impl DispatchPort,
    ) {
        let request = AlertRequest {
            session,
            source,
            location: dispatch.current_location(),
        };
        match dispatch.send_alert(&request) {
            Ok(()) => info!("Dispatch: alert for {session} handed off"),
            Err(error) => {
                warn!("Dispatch: alert for {session} failed: {error}");
                sink.emit(&CoreEvent::DispatchFailed { session, error });
            }
        }

        if let Err(e) = self
            .alert
            .start(session, &self.config, now, &mut self.timers, hw, sink)
        {
            sink.emit(&CoreEvent::Rejected(e));
        }
    }
}
