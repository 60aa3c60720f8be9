//! Siren driver: piezo buzzer or amplifier fed by a PWM channel.
//!
//! The tone frequency is fixed by the PWM peripheral configuration; the
//! driver only gates it: 50 % duty while playing, fully off when stopped.

use embedded_hal::pwm::SetDutyCycle;

use crate::error::HardwareError;

const PLAYING_DUTY_PERCENT: u8 = 50;

pub struct PwmSiren<P> {
    pwm: P,
    playing: bool,
}

impl<P: SetDutyCycle> PwmSiren<P> {
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            playing: false,
        }
    }

    pub fn start(&mut self) -> Result<(), HardwareError> {
        self.pwm
            .set_duty_cycle_percent(PLAYING_DUTY_PERCENT)
            .map_err(|_| HardwareError::Rejected)?;
        self.playing = true;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), HardwareError> {
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| HardwareError::Rejected)?;
        self.playing = false;
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}
