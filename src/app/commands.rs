//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (SOS button,
//! countdown dialog, alert screen, settings, lifecycle) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::TriggerConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// SOS button went down: begin the hold countdown.
    HoldPressed,

    /// SOS button released: cancels a hold countdown that has not yet
    /// confirmed.  Ignored for fall countdowns.
    HoldReleased,

    /// Cancel affordance on the countdown dialog.  Cancels whichever
    /// countdown is live.
    CancelCountdown,

    /// Stop button on the alert screen.
    StopAlert,

    /// Hot-reload configuration.  Applies to sessions started afterwards.
    UpdateConfig(TriggerConfig),

    /// Settings toggle for automatic fall detection.
    SetFallDetection(bool),

    /// Host is going away: cancel countdowns, stop alerts, close windows.
    Shutdown,
}
