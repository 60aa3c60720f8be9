//! Monotonic clock adapter.
//!
//! Backed by the `embassy-time` driver.  On host builds the `std`
//! feature supplies a driver over `std::time::Instant`; on device the
//! platform's embassy time driver is linked instead.

use embassy_time::Instant;

use crate::app::ports::ClockPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
