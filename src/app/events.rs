//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (drive a progress indicator, show
//! the cancel affordance, hand off to the notification flow, or log).

use core::fmt;

use serde::Serialize;

use crate::activation::{SessionHandle, TriggerSource};
use crate::alert::{AlertSessionHandle, Channel, ChannelState};
use crate::error::{Error, HardwareError};
use crate::sensors::fall::FallImpactDetected;

/// Maximum length of the textual location handed to the dispatcher.
pub const LOCATION_TEXT_CAP: usize = 128;

/// Textual location as produced by the address-lookup collaborator.
pub type LocationText = heapless::String<LOCATION_TEXT_CAP>;

/// Structured events emitted by the emergency-trigger core.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// The motion detector matched a free-fall-then-impact signature.
    FallImpactDetected(FallImpactDetected),

    /// A countdown began.
    CountdownStarted {
        session: SessionHandle,
        source: TriggerSource,
        duration_ms: u32,
    },

    /// Periodic countdown update for the progress collaborator.
    CountdownProgress(CountdownProgress),

    /// The countdown reached its deadline without being cancelled.
    /// Emitted exactly once per session.
    EmergencyConfirmed {
        session: SessionHandle,
        source: TriggerSource,
    },

    /// The countdown was cancelled before its deadline.
    Cancelled {
        session: SessionHandle,
        source: TriggerSource,
    },

    /// An alert session took ownership of torch, audio and screen.
    AlertStarted {
        alert: AlertSessionHandle,
        trigger: SessionHandle,
    },

    /// A channel reached a new observable state.
    ChannelChanged(ChannelState),

    /// A channel's hardware started rejecting commands.  Raised once per
    /// healthy → faulted edge; the remaining channels keep running.
    HardwareFault {
        channel: Channel,
        error: HardwareError,
    },

    /// Every channel has been driven to OFF and no transitions remain.
    AlertStopped(AlertSessionHandle),

    /// The dispatch collaborator refused the alert request.
    DispatchFailed {
        session: SessionHandle,
        error: DispatchError,
    },

    /// A command was refused; the core state is unchanged.
    Rejected(Error),
}

impl CoreEvent {
    /// The equivalent [`Error`] for a hardware fault event.
    pub fn as_error(&self) -> Option<Error> {
        match *self {
            Self::HardwareFault { channel, error } => {
                Some(Error::HardwareCommandFailed { channel, error })
            }
            Self::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

/// One countdown progress update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountdownProgress {
    pub session: SessionHandle,
    pub source: TriggerSource,
    /// Milliseconds until the deadline.
    pub remaining_ms: u32,
    /// Whole progress intervals left, rounded up (the per-second
    /// countdown shows this number).
    pub remaining_ticks: u32,
    /// Elapsed share of the countdown, `0.0..=1.0`.
    pub fraction: f32,
}

/// Payload handed to [`DispatchPort::send_alert`](super::ports::DispatchPort::send_alert).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRequest {
    pub session: SessionHandle,
    pub source: TriggerSource,
    pub location: Option<LocationText>,
}

/// Why the dispatch collaborator could not accept an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// No recipients configured.
    NoRecipients,
    /// The send capability is not granted.
    PermissionDenied,
    /// The underlying transport refused the message.
    SendFailed,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecipients => write!(f, "no recipients configured"),
            Self::PermissionDenied => write!(f, "send permission denied"),
            Self::SendFailed => write!(f, "send failed"),
        }
    }
}
