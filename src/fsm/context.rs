//! Shared mutable context threaded through every FSM handler.
//!
//! `ActivationContext` is the single struct that state handlers read from
//! and write to: the current clock reading, the live countdown session,
//! countdown timing, the pending cancel request, and the buffer of
//! outbound events the controller hands to the service after each call.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use log::warn;

use crate::activation::{ActivationSession, TriggerSource};
use crate::app::events::CoreEvent;
use crate::config::TriggerConfig;

/// Events one controller call can produce before the buffer is drained.
pub const OUTPUT_CAP: usize = 8;

// ---------------------------------------------------------------------------
// Countdown timing (copied out of the config when a session starts)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTiming {
    /// Start-to-deadline length.
    pub duration: Duration,
    /// Progress update granularity.
    pub interval: Duration,
}

/// Timing for both trigger sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationTiming {
    pub hold: CountdownTiming,
    pub fall: CountdownTiming,
}

impl ActivationTiming {
    pub fn for_source(&self, source: TriggerSource) -> CountdownTiming {
        match source {
            TriggerSource::ManualHold => self.hold,
            TriggerSource::FallDetected => self.fall,
        }
    }
}

impl From<&TriggerConfig> for ActivationTiming {
    fn from(c: &TriggerConfig) -> Self {
        let ms = |v: u32| Duration::from_millis(v as u64);
        Self {
            hold: CountdownTiming {
                duration: ms(c.hold_duration_ms),
                interval: ms(c.hold_progress_interval_ms),
            },
            fall: CountdownTiming {
                duration: ms(c.fall_countdown_ms),
                interval: ms(c.fall_progress_interval_ms),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ActivationContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct ActivationContext {
    // -- Timing --
    /// Clock reading for the current call.  Set by the controller before
    /// every FSM step.
    pub now: Instant,
    /// Timing applied to sessions started from now on.
    pub timing: ActivationTiming,

    // -- Session --
    /// The live countdown, `Some` exactly while `Counting`.
    pub session: Option<ActivationSession>,
    /// Set by `cancel`; consumed by the `Counting` update handler.
    pub cancel_requested: bool,

    // -- Outputs --
    /// Events produced by handlers, drained by the controller's owner.
    pub outputs: Vec<CoreEvent, OUTPUT_CAP>,
}

impl ActivationContext {
    pub fn new(config: &TriggerConfig) -> Self {
        Self {
            now: Instant::from_ticks(0),
            timing: ActivationTiming::from(config),
            session: None,
            cancel_requested: false,
            outputs: Vec::new(),
        }
    }

    /// Queue an outbound event.
    ///
    /// When the buffer is full the oldest `CountdownProgress` is evicted to
    /// make room, so lifecycle events (`CountdownStarted`,
    /// `EmergencyConfirmed`, `Cancelled`) are never lost to progress
    /// backlog.  Only a progress update arriving with no evictable entry
    /// is dropped.
    pub fn emit(&mut self, event: CoreEvent) {
        if self.outputs.is_full() {
            let oldest_progress = self
                .outputs
                .iter()
                .position(|e| matches!(e, CoreEvent::CountdownProgress(_)));
            match oldest_progress {
                Some(idx) => {
                    self.outputs.remove(idx);
                }
                None if matches!(event, CoreEvent::CountdownProgress(_)) => {
                    warn!("activation: output buffer full, dropped {:?}", event);
                    return;
                }
                None => {}
            }
        }
        if let Err(dropped) = self.outputs.push(event) {
            warn!("activation: output buffer full, dropped {:?}", dropped);
        }
    }

    /// Queue a progress update for the live session at `now`.
    pub fn emit_progress(&mut self) {
        if let Some(session) = self.session {
            self.emit(CoreEvent::CountdownProgress(session.progress(self.now)));
        }
    }
}
