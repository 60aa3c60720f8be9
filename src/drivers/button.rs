//! Debounced press-and-hold SOS button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up, read through an
//! `embedded-hal` [`InputPin`].  The owner calls [`HoldButton::poll`]
//! from its loop (or from a pin-change callback) with the current
//! monotonic time; the driver runs the debounce + gesture state machine.
//!
//! ## Gestures
//!
//! | Gesture  | Condition                               | Command         |
//! |----------|-----------------------------------------|-----------------|
//! | Pressed  | Pin held low for the debounce interval  | `HoldPressed`   |
//! | Released | Pin high again after a `Pressed`        | `HoldReleased`  |
//!
//! How long the hold must last is the activation controller's business;
//! the driver only reports edges.  A pin read error is treated as a
//! release so a failing switch can never hold a countdown open.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::commands::AppCommand;

const DEBOUNCE_MS: u64 = 50;

/// Gesture edges emitted after debouncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldGesture {
    Pressed,
    Released,
}

impl From<HoldGesture> for AppCommand {
    fn from(g: HoldGesture) -> Self {
        match g {
            HoldGesture::Pressed => AppCommand::HoldPressed,
            HoldGesture::Released => AppCommand::HoldReleased,
        }
    }
}

/// Internal state machine for gesture detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    DebounceWait { since: Instant },
    Held { since: Instant },
}

pub struct HoldButton<P> {
    pin: P,
    state: GestureState,
    debounce: Duration,
    read_failed: bool,
}

impl<P: InputPin> HoldButton<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            state: GestureState::Idle,
            debounce: Duration::from_millis(DEBOUNCE_MS),
            read_failed: false,
        }
    }

    /// Sample the pin at `now`.  Returns a gesture edge, if any.
    pub fn poll(&mut self, now: Instant) -> Option<HoldGesture> {
        let down = self.is_down();

        match self.state {
            GestureState::Idle => {
                if down {
                    self.state = GestureState::DebounceWait { since: now };
                }
                None
            }

            GestureState::DebounceWait { since } => {
                if !down {
                    // Bounce: never reported.
                    self.state = GestureState::Idle;
                    return None;
                }
                if now.saturating_duration_since(since) >= self.debounce {
                    self.state = GestureState::Held { since: now };
                    return Some(HoldGesture::Pressed);
                }
                None
            }

            GestureState::Held { .. } => {
                if !down {
                    self.state = GestureState::Idle;
                    return Some(HoldGesture::Released);
                }
                None
            }
        }
    }

    /// Time since the debounced press, while held.
    pub fn held_for(&self, now: Instant) -> Option<Duration> {
        match self.state {
            GestureState::Held { since } => Some(now.saturating_duration_since(since)),
            _ => None,
        }
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }

    fn is_down(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => {
                self.read_failed = false;
                low
            }
            Err(_) => {
                if !self.read_failed {
                    warn!("HoldButton: pin read failed, treating as released");
                }
                self.read_failed = true;
                false
            }
        }
    }
}
