//! Free-fall-then-impact detector.
//!
//! ```text
//!            m < freefall                 m > impact, Δt < window
//!   CLOSED ───────────────▶ OPEN(start) ─────────────────────────▶ CLOSED + emit
//!      ▲                        │
//!      │   m > impact, Δt ≥ window  │  Δt > window
//!      └────────────────────────┴───────────────────── (silent close)
//! ```
//!
//! The detector holds at most one open window and nothing else, so memory
//! is O(1) regardless of sample rate.  A second free-fall onset while a
//! window is open is ignored; the first onset's timestamp stays
//! authoritative.

use embassy_time::{Duration, Instant};
use log::debug;

use super::AccelSample;
use crate::config::TriggerConfig;

/// Emitted when an impact follows a free-fall onset inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallImpactDetected {
    /// Timestamp of the free-fall onset that opened the window.
    pub freefall_start: Instant,
    /// Timestamp of the impact sample.
    pub impact_at: Instant,
}

/// Transient record of an open free-fall window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallWindow {
    pub freefall_start: Instant,
}

/// Thresholds copied out of [`TriggerConfig`].
#[derive(Debug, Clone, Copy)]
struct Thresholds {
    freefall: f32,
    impact: f32,
    window: Duration,
}

impl From<&TriggerConfig> for Thresholds {
    fn from(c: &TriggerConfig) -> Self {
        Self {
            freefall: c.freefall_threshold,
            impact: c.impact_threshold,
            window: c.fall_window(),
        }
    }
}

pub struct FallDetector {
    thresholds: Thresholds,
    window: Option<FallWindow>,
}

impl FallDetector {
    pub fn new(config: &TriggerConfig) -> Self {
        Self {
            thresholds: Thresholds::from(config),
            window: None,
        }
    }

    /// Swap in new thresholds.  An open window keeps its start time.
    pub fn reconfigure(&mut self, config: &TriggerConfig) {
        self.thresholds = Thresholds::from(config);
    }

    /// Feed one sample.  Returns `Some` exactly when an impact lands
    /// strictly less than one window after the free-fall onset.
    ///
    /// Malformed samples (NaN / infinite) leave the window untouched.
    pub fn on_sample(&mut self, sample: AccelSample) -> Option<FallImpactDetected> {
        if sample.validate().is_err() {
            return None;
        }
        let m = sample.magnitude();
        let th = self.thresholds;

        let Some(window) = self.window else {
            if m < th.freefall {
                debug!("fall: free-fall onset at {}ms (|a|={:.2})", sample.t.as_millis(), m);
                self.window = Some(FallWindow {
                    freefall_start: sample.t,
                });
            }
            return None;
        };

        // Out-of-order timestamps count as zero elapsed.
        let elapsed = sample.t.saturating_duration_since(window.freefall_start);

        if m > th.impact && elapsed < th.window {
            self.window = None;
            debug!(
                "fall: impact {:.2} m/s² {}ms after onset",
                m,
                elapsed.as_millis()
            );
            return Some(FallImpactDetected {
                freefall_start: window.freefall_start,
                impact_at: sample.t,
            });
        }

        if m > th.impact {
            debug!("fall: impact arrived {}ms after onset, too late", elapsed.as_millis());
            self.window = None;
        } else if elapsed > th.window {
            debug!("fall: window expired without impact");
            self.window = None;
        }

        None
    }

    /// The currently open window, if any.
    pub fn window(&self) -> Option<FallWindow> {
        self.window
    }

    /// Drop any open window (detection disabled or lifecycle reset).
    pub fn reset(&mut self) {
        self.window = None;
    }
}
