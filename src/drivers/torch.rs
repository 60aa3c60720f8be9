//! Flashlight driver: a single LED (or torch module enable line) on a
//! GPIO output.
//!
//! Dumb actuator.  Exclusive ownership by the live alert session is
//! enforced above this layer.

use embedded_hal::digital::OutputPin;

use crate::error::HardwareError;

pub struct GpioTorch<P> {
    pin: P,
    /// Level that turns the torch on.
    active_high: bool,
    on: bool,
}

impl<P: OutputPin> GpioTorch<P> {
    pub fn new(pin: P, active_high: bool) -> Self {
        Self {
            pin,
            active_high,
            on: false,
        }
    }

    pub fn set(&mut self, on: bool) -> Result<(), HardwareError> {
        let high = on == self.active_high;
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| HardwareError::Rejected)?;
        self.on = on;
        Ok(())
    }

    /// Last state the pin accepted.
    pub fn is_on(&self) -> bool {
        self.on
    }
}
