//! Sensor inputs: the accelerometer sample type and the fall detector.
//!
//! Samples are produced by a platform sensor binding at whatever rate it
//! likes; the core tolerates irregular intervals and never asks for more
//! than the sample it is currently handling.

pub mod fall;

use embassy_time::Instant;

use crate::error::{Error, Result};

/// A single 3-axis accelerometer reading in m/s².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Monotonic capture time.
    pub t: Instant,
}

impl AccelSample {
    pub fn new(x: f32, y: f32, z: f32, t: Instant) -> Self {
        Self { x, y, z, t }
    }

    /// Convenience constructor for scripted traces: all acceleration on
    /// the z axis, timestamp in milliseconds.
    pub fn from_magnitude(magnitude: f32, t_ms: u64) -> Self {
        Self::new(0.0, 0.0, magnitude, Instant::from_millis(t_ms))
    }

    /// Euclidean magnitude of the acceleration vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Reject NaN and infinite components, and vectors so large that the
    /// magnitude overflows.
    pub fn validate(&self) -> Result<()> {
        let components_finite = self.x.is_finite() && self.y.is_finite() && self.z.is_finite();
        if components_finite && self.magnitude().is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidSample)
        }
    }
}
