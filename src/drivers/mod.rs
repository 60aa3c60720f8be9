//! Input and actuator drivers over `embedded-hal` traits.

pub mod beacon;
pub mod button;
pub mod siren;
pub mod torch;
