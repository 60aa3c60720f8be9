//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the orchestration rules of the emergency-trigger
//! core: samples into the fall detector, triggers into the activation
//! countdown, confirmations into dispatch and the alert sequencer.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod runtime;
pub mod service;
