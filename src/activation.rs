//! Activation controller: one cancellable countdown fed by two triggers.
//!
//! ```text
//!   HoldPressed ──▶ start_manual_hold ──┐
//!                                        ├──▶ Counting ──▶ EmergencyConfirmed
//!   FallImpactDetected ─▶ on_fall_detected ┘       │
//!                                                  └──▶ Cancelled
//! ```
//!
//! At most one session is live.  Whichever trigger starts first owns the
//! session until it resolves; the other is rejected with
//! [`SessionKind::Activation`] so the user's cancel affordance for the
//! running countdown is never silently replaced.
//!
//! The controller is a thin owner around the table-driven [`Fsm`].  It
//! never reads a clock: every call carries `now`, and [`next_wake`]
//! tells the caller when the next progress update or the deadline is
//! due.
//!
//! [`next_wake`]: ActivationController::next_wake

use core::fmt;

use embassy_time::{Duration, Instant};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::events::{CoreEvent, CountdownProgress};
use crate::config::TriggerConfig;
use crate::error::{Error, Result, SessionKind};
use crate::fsm::context::{ActivationContext, ActivationTiming, CountdownTiming, OUTPUT_CAP};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

// ───────────────────────────────────────────────────────────────
// Session types
// ───────────────────────────────────────────────────────────────

/// What started a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerSource {
    /// Press-and-hold on the SOS button.  Released early = cancelled.
    ManualHold,
    /// Automatic, from the fall detector.  Runs until cancelled.
    FallDetected,
}

/// Opaque identity of one activation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub u32);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// One in-progress countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationSession {
    pub id: SessionHandle,
    pub source: TriggerSource,
    pub started_at: Instant,
    pub deadline: Instant,
    /// Progress update granularity.
    pub interval: Duration,
    /// When the next progress update is due (always on an interval
    /// boundary measured from `started_at`).
    pub next_progress: Instant,
}

impl ActivationSession {
    pub fn new(
        id: SessionHandle,
        source: TriggerSource,
        now: Instant,
        timing: CountdownTiming,
    ) -> Self {
        Self {
            id,
            source,
            started_at: now,
            deadline: now + timing.duration,
            interval: timing.interval,
            next_progress: now + timing.interval,
        }
    }

    pub fn duration(&self) -> Duration {
        self.deadline - self.started_at
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Earliest instant at which [`ActivationController::tick`] has work.
    pub fn next_wake(&self) -> Instant {
        self.next_progress.min(self.deadline)
    }

    /// Move `next_progress` to the first interval boundary after `now`.
    pub fn advance_progress(&mut self, now: Instant) {
        let interval_ms = self.interval.as_millis().max(1);
        let elapsed_ms = now.saturating_duration_since(self.started_at).as_millis();
        let boundaries = elapsed_ms / interval_ms + 1;
        self.next_progress = self.started_at + Duration::from_millis(boundaries * interval_ms);
    }

    pub fn progress(&self, now: Instant) -> CountdownProgress {
        let total_ms = self.duration().as_millis().max(1);
        let remaining_ms = self.remaining(now).as_millis();
        let interval_ms = self.interval.as_millis().max(1);
        CountdownProgress {
            session: self.id,
            source: self.source,
            remaining_ms: remaining_ms as u32,
            remaining_ticks: remaining_ms.div_ceil(interval_ms) as u32,
            fraction: (total_ms - remaining_ms.min(total_ms)) as f32 / total_ms as f32,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ActivationController
// ───────────────────────────────────────────────────────────────

pub struct ActivationController {
    fsm: Fsm,
    ctx: ActivationContext,
    next_id: u32,
}

impl ActivationController {
    pub fn new(config: &TriggerConfig) -> Self {
        let mut ctx = ActivationContext::new(config);
        let mut fsm = Fsm::new(build_state_table(), StateId::Idle);
        fsm.start(&mut ctx);
        Self {
            fsm,
            ctx,
            next_id: 0,
        }
    }

    /// New timing applies to sessions started afterwards; a live
    /// countdown keeps its deadline.
    pub fn reconfigure(&mut self, config: &TriggerConfig) {
        self.ctx.timing = ActivationTiming::from(config);
    }

    // ── Triggers ──────────────────────────────────────────────

    /// Begin the hold countdown (3000ms, 30ms progress by default).
    pub fn start_manual_hold(&mut self, now: Instant) -> Result<SessionHandle> {
        self.begin(TriggerSource::ManualHold, now)
    }

    /// Begin the fall-confirmation countdown (10000ms, 1000ms progress
    /// by default).  It runs without further input until cancelled.
    pub fn on_fall_detected(&mut self, now: Instant) -> Result<SessionHandle> {
        self.begin(TriggerSource::FallDetected, now)
    }

    /// Cancel `handle` without confirming.  Returns `false` if it is not
    /// the live session (already resolved, or never existed).
    pub fn cancel(&mut self, handle: SessionHandle, now: Instant) -> bool {
        match self.ctx.session {
            Some(s) if s.id == handle => {
                self.ctx.now = now;
                self.ctx.cancel_requested = true;
                self.step();
                true
            }
            _ => false,
        }
    }

    /// Advance to `now`: emit a progress update if one is due and
    /// confirm once `now >= deadline`.
    pub fn tick(&mut self, now: Instant) {
        if self.ctx.session.is_none() {
            return;
        }
        self.ctx.now = now;
        self.step();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn session(&self) -> Option<ActivationSession> {
        self.ctx.session
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_counting(&self) -> bool {
        self.ctx.session.is_some()
    }

    /// When `tick` next has work, `None` while idle.
    pub fn next_wake(&self) -> Option<Instant> {
        self.ctx.session.map(|s| s.next_wake())
    }

    /// Drain events produced since the last call.
    pub fn take_events(&mut self) -> heapless::Vec<CoreEvent, OUTPUT_CAP> {
        core::mem::take(&mut self.ctx.outputs)
    }

    // ── Internal ──────────────────────────────────────────────

    fn begin(&mut self, source: TriggerSource, now: Instant) -> Result<SessionHandle> {
        if let Some(live) = self.ctx.session {
            warn!(
                "activation: {:?} rejected, {} ({:?}) still counting",
                source, live.id, live.source
            );
            return Err(Error::SessionAlreadyActive(SessionKind::Activation));
        }

        self.next_id = self.next_id.wrapping_add(1);
        let id = SessionHandle(self.next_id);
        let timing = self.ctx.timing.for_source(source);

        self.ctx.now = now;
        self.ctx.session = Some(ActivationSession::new(id, source, now, timing));
        self.fsm.force_transition(StateId::Counting, &mut self.ctx);
        Ok(id)
    }

    /// One FSM update, then run any terminal state through to `Idle`.
    fn step(&mut self) {
        self.fsm.tick(&mut self.ctx);
        while self.fsm.current_state().is_transient() {
            self.fsm.tick(&mut self.ctx);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
