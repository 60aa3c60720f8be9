//! Per-channel hardware health latch.
//!
//! The sequencer reports the outcome of every port call here.  A channel
//! that fails is latched as faulted until a later command on the same
//! channel succeeds.  Callers use the return value of [`ChannelHealth::record`]
//! to emit one `HardwareFault` per healthy → faulted edge instead of one
//! per failing toggle (the flashlight alone toggles 18 times per cycle).
//!
//! The latch is cleared when a new alert session starts.

use log::{error, info};

use super::Channel;
use crate::error::HardwareError;

/// Latched fault bitmask, one bit per [`Channel`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelHealth {
    faults: u8,
}

impl ChannelHealth {
    pub fn new() -> Self {
        Self { faults: 0 }
    }

    /// Record the outcome of a command on `channel`.
    ///
    /// Returns `true` only when this call moved the channel from healthy
    /// to faulted.
    pub fn record(&mut self, channel: Channel, outcome: Result<(), HardwareError>) -> bool {
        match outcome {
            Ok(()) => {
                if self.faults & channel.mask() != 0 {
                    info!("HARDWARE FAULT CLEARED: {channel}");
                }
                self.faults &= !channel.mask();
                false
            }
            Err(e) => {
                let edge = self.faults & channel.mask() == 0;
                if edge {
                    error!("HARDWARE FAULT SET: {channel} ({e})");
                }
                self.faults |= channel.mask();
                edge
            }
        }
    }

    pub fn is_faulted(&self, channel: Channel) -> bool {
        self.faults & channel.mask() != 0
    }

    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn reset(&mut self) {
        self.faults = 0;
    }
}
