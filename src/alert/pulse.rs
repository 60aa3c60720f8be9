//! Screen colour pulse.
//!
//! Alternates the screen background between two colours at a fixed
//! period.  The first colour is shown immediately when the pulse starts;
//! each toggle is scheduled from the pulse's start anchor
//! (`start + n × period`), never from "now", so late handling does not
//! stretch the rhythm.

use embassy_time::{Duration, Instant};

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

pub const COLOUR_RED: Rgb = (255, 0, 0);
pub const COLOUR_BLUE: Rgb = (0, 0, 255);

/// Live state of the screen channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenPulse {
    colours: [Rgb; 2],
    period: Duration,
    anchor: Instant,
    toggles: u64,
    current: Rgb,
}

impl ScreenPulse {
    /// Start pulsing at `now`; returns the pulse and the colour to show now.
    pub fn start(colours: [Rgb; 2], period: Duration, now: Instant) -> Self {
        Self {
            colours,
            period,
            anchor: now,
            toggles: 0,
            current: colours[0],
        }
    }

    /// Flip to the other colour and return it.
    pub fn toggle(&mut self) -> Rgb {
        self.toggles += 1;
        self.current = self.colours[(self.toggles % 2) as usize];
        self.current
    }

    /// Absolute time of the next toggle.
    pub fn next_fire(&self) -> Instant {
        self.anchor + self.period * (self.toggles as u32 + 1)
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }
}
