//! Alert sequencer: drives the three alert channels once an emergency
//! is confirmed.
//!
//! ```text
//!                       ┌──────────────────────────────┐
//!   start(confirmed) ──▶│        AlertSequencer        │──▶ ScreenPort  (colour every 300ms)
//!                       │  ScreenPulse · FlashPattern  │──▶ AudioPort   (loop until stop)
//!   TimerQueue ────────▶│  ChannelHealth               │──▶ TorchPort   (SOS steps)
//!   stop(handle) ──────▶│                              │──▶ EventSink
//!                       └──────────────────────────────┘
//! ```
//!
//! The sequencer owns no clock and no timer primitive.  Each repeating
//! channel keeps exactly one entry in the shared [`TimerQueue`]; when it
//! fires, the owner applies the step and pushes the next entry computed
//! from the channel's absolute anchor.
//!
//! ## Stop guarantees
//!
//! `stop` first removes every pending screen and flashlight entry from
//! the queue, then commands torch OFF and audio stop.  Because timer
//! delivery and `stop` are serialised by the caller (single lock or
//! single thread), a toggle either ran entirely before `stop` or never
//! runs at all, so the OFF command is always the last word.

pub mod health;
pub mod morse;
pub mod pulse;

use core::fmt;

use embassy_time::Instant;
use log::{debug, info, warn};
use serde::Serialize;

use crate::activation::SessionHandle;
use crate::app::events::CoreEvent;
use crate::app::ports::{AlertOutputs, EventSink};
use crate::config::TriggerConfig;
use crate::error::{Error, HardwareError, Result, SessionKind};
use crate::scheduler::{TimerAction, TimerChannel, TimerQueue};
use health::ChannelHealth;
use morse::{FlashPattern, MorseSchedule};
use pulse::{Rgb, ScreenPulse};

// ═══════════════════════════════════════════════════════════════
//  Identity and channel types
// ═══════════════════════════════════════════════════════════════

/// Hardware-facing capability driven by an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Channel {
    Flashlight = 0,
    AudioLoop = 1,
    ScreenPulse = 2,
}

impl Channel {
    pub const ALL: [Self; 3] = [Self::Flashlight, Self::AudioLoop, Self::ScreenPulse];

    /// Bit position in the health latch.
    pub fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flashlight => write!(f, "flashlight"),
            Self::AudioLoop => write!(f, "siren"),
            Self::ScreenPulse => write!(f, "screen"),
        }
    }
}

/// Opaque identity of one alert session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AlertSessionHandle(pub u32);

impl fmt::Display for AlertSessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alert#{}", self.0)
    }
}

/// Observable state of one channel after a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Screen(Rgb),
    Siren(bool),
    Torch(bool),
}

// ═══════════════════════════════════════════════════════════════
//  Session
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct AlertSession {
    handle: AlertSessionHandle,
    trigger: SessionHandle,
    started_at: Instant,
    screen: ScreenPulse,
    flash: FlashPattern,
}

// ═══════════════════════════════════════════════════════════════
//  Sequencer
// ═══════════════════════════════════════════════════════════════

pub struct AlertSequencer {
    session: Option<AlertSession>,
    health: ChannelHealth,
    next_id: u32,
    /// Last torch state the device acknowledged.
    torch_on: bool,
    /// Whether the device acknowledged `start_loop` without a later `stop`.
    siren_playing: bool,
}

impl AlertSequencer {
    pub fn new() -> Self {
        Self {
            session: None,
            health: ChannelHealth::new(),
            next_id: 0,
            torch_on: false,
            siren_playing: false,
        }
    }

    /// Begin a new alert for the confirmed activation `trigger`.
    ///
    /// The first screen colour, the siren and the first SOS step are
    /// applied immediately; follow-up transitions are queued in `timers`.
    /// Rejected with [`SessionKind::Alert`] while another alert is live.
    ///
    /// Crate-private: `trigger` is not checked here, so only
    /// [`AppService`](crate::app::service::AppService) may call it, and
    /// only on `EmergencyConfirmed`.
    pub(crate) fn start(
        &mut self,
        trigger: SessionHandle,
        config: &TriggerConfig,
        now: Instant,
        timers: &mut TimerQueue,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
    ) -> Result<AlertSessionHandle> {
        if let Some(live) = &self.session {
            warn!("ALERT: start for {trigger} rejected, {} still live", live.handle);
            return Err(Error::SessionAlreadyActive(SessionKind::Alert));
        }

        self.next_id = self.next_id.wrapping_add(1);
        let handle = AlertSessionHandle(self.next_id);
        self.health.reset();
        info!("ALERT {handle}: starting for {trigger} at {}ms", now.as_millis());
        sink.emit(&CoreEvent::AlertStarted {
            alert: handle,
            trigger,
        });

        // ── Screen ────────────────────────────────────────────
        let screen = ScreenPulse::start(config.pulse_colours, config.screen_pulse(), now);
        self.apply_screen(screen.current_colour(), hw, sink);
        timers.schedule(screen.next_fire(), TimerAction::ScreenToggle);

        // ── Siren ─────────────────────────────────────────────
        let outcome = hw.start_loop();
        if self.record(Channel::AudioLoop, outcome, sink) {
            self.siren_playing = true;
            sink.emit(&CoreEvent::ChannelChanged(ChannelState::Siren(true)));
        }

        // ── Flashlight ────────────────────────────────────────
        let mut flash = FlashPattern::start(MorseSchedule::new(&config.morse), now);
        let on = flash.advance();
        self.apply_torch(on, hw, sink);
        timers.schedule(
            flash.next_fire(),
            TimerAction::FlashStep {
                cursor: flash.cursor() as u8,
            },
        );

        self.session = Some(AlertSession {
            handle,
            trigger,
            started_at: now,
            screen,
            flash,
        });
        Ok(handle)
    }

    /// Handle a due screen or flashlight timer.
    pub fn on_timer(
        &mut self,
        action: TimerAction,
        timers: &mut TimerQueue,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
    ) {
        let Some(session) = self.session.as_mut() else {
            debug!("ALERT: {:?} with no live session, ignored", action);
            return;
        };

        match action {
            TimerAction::ScreenToggle => {
                let colour = session.screen.toggle();
                let next = session.screen.next_fire();
                self.apply_screen(colour, hw, sink);
                timers.schedule(next, TimerAction::ScreenToggle);
            }
            TimerAction::FlashStep { cursor } => {
                if session.flash.cursor() != cursor as usize {
                    warn!(
                        "ALERT {}: flash step {} out of sequence (expected {})",
                        session.handle,
                        cursor,
                        session.flash.cursor()
                    );
                    return;
                }
                let on = session.flash.advance();
                let next = session.flash.next_fire();
                let next_cursor = session.flash.cursor() as u8;
                self.apply_torch(on, hw, sink);
                timers.schedule(next, TimerAction::FlashStep { cursor: next_cursor });
            }
            TimerAction::ActivationWake => {
                debug!("ALERT: activation timer routed to sequencer, ignored");
            }
        }
    }

    /// Stop the alert `handle`: cancel every pending channel transition,
    /// force the torch OFF and stop the siren.
    ///
    /// Returns `false` (and touches nothing) if `handle` is not the live
    /// session, so repeated calls are harmless.
    pub fn stop(
        &mut self,
        handle: AlertSessionHandle,
        timers: &mut TimerQueue,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(session) = self.session.filter(|s| s.handle == handle) else {
            debug!("ALERT {handle}: stop ignored, not live");
            return false;
        };

        let dropped = timers.cancel_channel(TimerChannel::Flashlight)
            + timers.cancel_channel(TimerChannel::ScreenPulse);
        self.session = None;

        let outcome = hw.set_torch(false);
        if self.record(Channel::Flashlight, outcome, sink) {
            self.torch_on = false;
            sink.emit(&CoreEvent::ChannelChanged(ChannelState::Torch(false)));
        }

        let outcome = hw.stop();
        if self.record(Channel::AudioLoop, outcome, sink) {
            self.siren_playing = false;
            sink.emit(&CoreEvent::ChannelChanged(ChannelState::Siren(false)));
        }

        info!(
            "ALERT {handle}: stopped (started {}ms, {} SOS cycles, {dropped} pending transitions dropped)",
            session.started_at.as_millis(),
            session.flash.cycles_completed(),
        );
        sink.emit(&CoreEvent::AlertStopped(handle));
        true
    }

    /// Stop whatever alert is live.  Returns `false` when idle.
    pub fn stop_active(
        &mut self,
        timers: &mut TimerQueue,
        hw: &mut impl AlertOutputs,
        sink: &mut impl EventSink,
    ) -> bool {
        match self.active() {
            Some(handle) => self.stop(handle, timers, hw, sink),
            None => false,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn active(&self) -> Option<AlertSessionHandle> {
        self.session.map(|s| s.handle)
    }

    /// Activation session that confirmed the live alert.
    pub fn trigger(&self) -> Option<SessionHandle> {
        self.session.map(|s| s.trigger)
    }

    /// Last torch state acknowledged by the device.
    pub fn torch_on(&self) -> bool {
        self.torch_on
    }

    pub fn siren_playing(&self) -> bool {
        self.siren_playing
    }

    pub fn health(&self) -> &ChannelHealth {
        &self.health
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_screen(&mut self, colour: Rgb, hw: &mut impl AlertOutputs, sink: &mut impl EventSink) {
        let outcome = hw.set_background(colour);
        if self.record(Channel::ScreenPulse, outcome, sink) {
            sink.emit(&CoreEvent::ChannelChanged(ChannelState::Screen(colour)));
        }
    }

    fn apply_torch(&mut self, on: bool, hw: &mut impl AlertOutputs, sink: &mut impl EventSink) {
        let outcome = hw.set_torch(on);
        if self.record(Channel::Flashlight, outcome, sink) {
            self.torch_on = on;
            sink.emit(&CoreEvent::ChannelChanged(ChannelState::Torch(on)));
        }
    }

    /// Feed a port outcome through the health latch.  Returns whether the
    /// command succeeded.
    fn record(
        &mut self,
        channel: Channel,
        outcome: core::result::Result<(), HardwareError>,
        sink: &mut impl EventSink,
    ) -> bool {
        let ok = outcome.is_ok();
        if self.health.record(channel, outcome) {
            if let Err(error) = outcome {
                sink.emit(&CoreEvent::HardwareFault { channel, error });
            }
        }
        ok
    }
}

impl Default for AlertSequencer {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
