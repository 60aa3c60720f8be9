//! RGB beacon driver.
//!
//! Three PWM channels drive discrete R/G/B LEDs (or a common-cathode RGB
//! LED).  On devices without a display this is the screen-pulse channel:
//! the alert colour pulse is shown on the beacon instead.

use embedded_hal::pwm::SetDutyCycle;

use crate::alert::pulse::Rgb;
use crate::error::HardwareError;

pub struct RgbBeacon<P> {
    red: P,
    green: P,
    blue: P,
    current: Rgb,
}

impl<P: SetDutyCycle> RgbBeacon<P> {
    pub fn new(red: P, green: P, blue: P) -> Self {
        Self {
            red,
            green,
            blue,
            current: (0, 0, 0),
        }
    }

    pub fn set_colour(&mut self, colour: Rgb) -> Result<(), HardwareError> {
        let (r, g, b) = colour;
        Self::set_channel(&mut self.red, r)?;
        Self::set_channel(&mut self.green, g)?;
        Self::set_channel(&mut self.blue, b)?;
        self.current = colour;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), HardwareError> {
        self.set_colour((0, 0, 0))
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }

    fn set_channel(pwm: &mut P, level: u8) -> Result<(), HardwareError> {
        pwm.set_duty_cycle_fraction(u16::from(level), 255)
            .map_err(|_| HardwareError::Rejected)
    }
}
