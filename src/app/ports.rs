//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (torch, audio, screen, dispatch, event sinks, clocks)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Contract notes
//!
//! - Hardware ports are fire-and-forget: implementations must return
//!   promptly and never block on device I/O completion.
//! - A port error is recovered inside the core and surfaced as an event;
//!   it never aborts the other channels.

use embassy_time::Instant;

use super::events::{AlertRequest, CoreEvent, DispatchError, LocationText};
use crate::alert::pulse::Rgb;
use crate::error::HardwareError;

// ───────────────────────────────────────────────────────────────
// Alert output ports (driven adapters: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Flashlight collaborator.  Receives on/off commands only.
pub trait TorchPort {
    fn set_torch(&mut self, on: bool) -> Result<(), HardwareError>;
}

/// Audio-output collaborator driving the looping siren.
pub trait AudioPort {
    /// Begin looping playback.  Calling it while already playing is allowed.
    fn start_loop(&mut self) -> Result<(), HardwareError>;

    /// Stop playback and release the output resource.
    fn stop(&mut self) -> Result<(), HardwareError>;
}

/// Screen collaborator.  Receives background colour commands only.
pub trait ScreenPort {
    fn set_background(&mut self, colour: Rgb) -> Result<(), HardwareError>;
}

/// Everything the alert sequencer drives, bundled so a single `&mut`
/// satisfies all three channels without a double borrow.
pub trait AlertOutputs: TorchPort + AudioPort + ScreenPort {}

impl<T: TorchPort + AudioPort + ScreenPort> AlertOutputs for T {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → UI / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`CoreEvent`]s through this port.
/// Adapters decide where they go (progress bar, notification, log).
pub trait EventSink {
    fn emit(&mut self, event: &CoreEvent);
}

// ───────────────────────────────────────────────────────────────
// Dispatch port (driven adapter: domain → message composition/send)
// ───────────────────────────────────────────────────────────────

/// Externally-owned "send alert" capability.
///
/// Called exactly once per confirmed activation session.  The core never
/// retries a failed send.
pub trait DispatchPort {
    /// Best-effort textual location, `None` if unknown.
    fn current_location(&mut self) -> Option<LocationText>;

    fn send_alert(&mut self, request: &AlertRequest) -> Result<(), DispatchError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source for the outer loop.  The core itself never
/// reads the clock; callers pass `now` in.
pub trait ClockPort {
    fn now(&self) -> Instant;
}
