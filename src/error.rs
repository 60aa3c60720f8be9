//! Unified error types for the emergency-trigger core.
//!
//! The core performs no I/O of its own, so the taxonomy is narrow: bad
//! samples, rejected session requests, hardware commands that a device
//! refused, and invalid configuration.  All variants are `Copy` so they
//! can be carried inside outbound events without allocation.

use core::fmt;

use crate::alert::Channel;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An acceleration sample carried a NaN or infinite component.
    InvalidSample,
    /// A second session was requested while one of the same kind is live.
    SessionAlreadyActive(SessionKind),
    /// A hardware-facing channel rejected a command.
    HardwareCommandFailed {
        channel: Channel,
        error: HardwareError,
    },
    /// Configuration failed validation.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSample => write!(f, "invalid acceleration sample"),
            Self::SessionAlreadyActive(kind) => write!(f, "{kind} session already active"),
            Self::HardwareCommandFailed { channel, error } => {
                write!(f, "{channel} command failed: {error}")
            }
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

/// Which single-instance session a request collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Activation,
    Alert,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activation => write!(f, "activation"),
            Self::Alert => write!(f, "alert"),
        }
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// The device refused the command (e.g. torch held by another app).
    Rejected,
    /// The device is not present or not yet initialised.
    Unavailable,
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "command rejected by device"),
            Self::Unavailable => write!(f, "device unavailable"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A config field failed range validation.  The message names the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigError(pub &'static str);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: {}", self.0)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
