//! Hardware adapter: bridges the alert peripherals to the output ports.
//!
//! Owns the torch, siren and beacon drivers and exposes them through
//! [`TorchPort`], [`AudioPort`] and [`ScreenPort`].  This is the only
//! module in the system that touches actual hardware.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::alert::pulse::Rgb;
use crate::app::ports::{AudioPort, ScreenPort, TorchPort};
use crate::drivers::beacon::RgbBeacon;
use crate::drivers::siren::PwmSiren;
use crate::drivers::torch::GpioTorch;
use crate::error::HardwareError;

/// Concrete adapter that combines all alert hardware behind port traits.
pub struct HardwareAdapter<T, A, L> {
    torch: GpioTorch<T>,
    siren: PwmSiren<A>,
    beacon: RgbBeacon<L>,
}

impl<T, A, L> HardwareAdapter<T, A, L>
where
    T: OutputPin,
    A: SetDutyCycle,
    L: SetDutyCycle,
{
    /// Take ownership of the drivers and force every output dark.
    ///
    /// Pin and PWM levels survive a warm restart, so a torch or siren
    /// left on by a previous run is switched off here before the core
    /// ever sees the adapter.
    pub fn new(torch: GpioTorch<T>, siren: PwmSiren<A>, beacon: RgbBeacon<L>) -> Self {
        let mut hw = Self {
            torch,
            siren,
            beacon,
        };
        if let Err(e) = hw.all_off() {
            warn!("HardwareAdapter: startup all-off incomplete: {}", e);
        }
        hw
    }

    pub fn torch(&self) -> &GpioTorch<T> {
        &self.torch
    }

    pub fn siren(&self) -> &PwmSiren<A> {
        &self.siren
    }

    pub fn beacon(&self) -> &RgbBeacon<L> {
        &self.beacon
    }

    /// Drive everything dark and silent regardless of session state.
    /// Every output is attempted; the first failure is returned.
    pub fn all_off(&mut self) -> Result<(), HardwareError> {
        let torch = self.torch.set(false);
        let siren = self.siren.stop();
        let beacon = self.beacon.off();
        torch.and(siren).and(beacon)
    }
}

// ── TorchPort implementation ──────────────────────────────────

impl<T: OutputPin, A, L> TorchPort for HardwareAdapter<T, A, L> {
    fn set_torch(&mut self, on: bool) -> Result<(), HardwareError> {
        self.torch.set(on)
    }
}

// ── AudioPort implementation ──────────────────────────────────

impl<T, A: SetDutyCycle, L> AudioPort for HardwareAdapter<T, A, L> {
    fn start_loop(&mut self) -> Result<(), HardwareError> {
        self.siren.start()
    }

    fn stop(&mut self) -> Result<(), HardwareError> {
        self.siren.stop()
    }
}

// ── ScreenPort implementation ─────────────────────────────────

impl<T, A, L: SetDutyCycle> ScreenPort for HardwareAdapter<T, A, L> {
    fn set_background(&mut self, colour: Rgb) -> Result<(), HardwareError> {
        self.beacon.set_colour(colour)
    }
}
