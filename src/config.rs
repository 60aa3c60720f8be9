//! Trigger configuration parameters
//!
//! All tunable thresholds and timings for the emergency-trigger core.
//! Defaults reproduce the reference behaviour; a settings collaborator may
//! push a replacement at runtime via `AppCommand::UpdateConfig`.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::alert::pulse::{Rgb, COLOUR_BLUE, COLOUR_RED};
use crate::error::ConfigError;

/// Core trigger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    // --- Fall detection ---
    /// Whether accelerometer samples are fed to the fall detector at all
    pub fall_detection_enabled: bool,
    /// Magnitude (m/s²) below which the device is considered in free fall
    pub freefall_threshold: f32,
    /// Magnitude (m/s²) above which a sample counts as an impact
    pub impact_threshold: f32,
    /// Maximum free-fall to impact delay (exclusive), milliseconds
    pub fall_window_ms: u32,

    // --- Manual hold ---
    /// How long the SOS button must be held
    pub hold_duration_ms: u32,
    /// Progress update granularity while holding
    pub hold_progress_interval_ms: u32,

    // --- Fall confirmation countdown ---
    /// Grace period before a detected fall is confirmed
    pub fall_countdown_ms: u32,
    /// Remaining-time update granularity
    pub fall_progress_interval_ms: u32,

    // --- Alert ---
    /// Screen colour toggle period
    pub screen_pulse_ms: u32,
    /// The two colours the screen alternates between (first shown first)
    pub pulse_colours: [Rgb; 2],
    /// Flashlight SOS timing
    pub morse: MorseTiming,
}

/// Signal and gap durations for the flashlight SOS pattern, milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorseTiming {
    pub dot_ms: u32,
    pub dash_ms: u32,
    /// Gap between signals of the same letter
    pub intra_letter_gap_ms: u32,
    /// Gap after the last signal of each letter
    pub inter_letter_gap_ms: u32,
    /// Extra pause before the pattern repeats
    pub inter_word_gap_ms: u32,
}

impl Default for MorseTiming {
    fn default() -> Self {
        Self {
            dot_ms: 150,
            dash_ms: 450,
            intra_letter_gap_ms: 150,
            inter_letter_gap_ms: 450,
            inter_word_gap_ms: 1000,
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            // Fall detection (on unless the user opts out)
            fall_detection_enabled: true,
            freefall_threshold: 9.0,
            impact_threshold: 11.0,
            fall_window_ms: 1000,

            // Manual hold
            hold_duration_ms: 3000,
            hold_progress_interval_ms: 30,

            // Fall countdown
            fall_countdown_ms: 10_000,
            fall_progress_interval_ms: 1000,

            // Alert
            screen_pulse_ms: 300,
            pulse_colours: [COLOUR_RED, COLOUR_BLUE],
            morse: MorseTiming::default(),
        }
    }
}

impl TriggerConfig {
    /// Reject values that would make the state machines misbehave.
    /// Invalid ranges are refused, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.freefall_threshold.is_finite() || !self.impact_threshold.is_finite() {
            return Err(ConfigError("thresholds must be finite"));
        }
        if self.freefall_threshold <= 0.0 {
            return Err(ConfigError("freefall_threshold must be positive"));
        }
        if self.impact_threshold <= self.freefall_threshold {
            return Err(ConfigError("impact_threshold must exceed freefall_threshold"));
        }
        if self.fall_window_ms == 0 {
            return Err(ConfigError("fall_window_ms must be non-zero"));
        }
        if self.hold_duration_ms == 0 || self.fall_countdown_ms == 0 {
            return Err(ConfigError("countdown durations must be non-zero"));
        }
        if self.hold_progress_interval_ms == 0
            || self.hold_progress_interval_ms > self.hold_duration_ms
        {
            return Err(ConfigError("hold_progress_interval_ms out of range"));
        }
        if self.fall_progress_interval_ms == 0
            || self.fall_progress_interval_ms > self.fall_countdown_ms
        {
            return Err(ConfigError("fall_progress_interval_ms out of range"));
        }
        if self.screen_pulse_ms == 0 {
            return Err(ConfigError("screen_pulse_ms must be non-zero"));
        }
        self.morse.validate()
    }

    pub fn fall_window(&self) -> Duration {
        Duration::from_millis(self.fall_window_ms as u64)
    }

    pub fn screen_pulse(&self) -> Duration {
        Duration::from_millis(self.screen_pulse_ms as u64)
    }
}

impl MorseTiming {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dot_ms == 0 || self.dash_ms == 0 {
            return Err(ConfigError("morse signal durations must be non-zero"));
        }
        if self.intra_letter_gap_ms == 0 || self.inter_letter_gap_ms == 0 {
            return Err(ConfigError("morse gaps must be non-zero"));
        }
        Ok(())
    }

    /// Milliseconds between the starts of two consecutive SOS cycles.
    pub fn cycle_ms(&self) -> u64 {
        crate::alert::morse::MorseSchedule::new(self).cycle().as_millis()
    }
}
