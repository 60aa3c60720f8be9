//! SOSGuard emergency-trigger core.
//!
//! Turns accelerometer samples and button/UI commands into a cancellable
//! activation countdown and, once confirmed, a single SOS alert session
//! driving torch, siren and screen.  Everything is clock-injected and
//! heap-free so the same code runs on device and in host tests.
//!
//! ```text
//!   samples ─┐                     ┌──▶ TorchPort / AudioPort / ScreenPort
//!            ├─▶ Runtime ─▶ AppService ──▶ DispatchPort
//!  commands ─┘   (InputQueue,          └──▶ EventSink
//!                 TimerQueue)
//! ```

#![deny(unused_must_use)]

pub mod activation;
pub mod adapters;
pub mod alert;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod fsm;
pub mod scheduler;
pub mod sensors;
