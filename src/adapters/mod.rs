//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                      |
//! |------------|--------------|----------------------------------|
//! | `hardware` | TorchPort    | GPIO torch line                  |
//! |            | AudioPort    | PWM siren                        |
//! |            | ScreenPort   | PWM RGB beacon                   |
//! | `log_sink` | EventSink    | Log output                       |
//! | `time`     | ClockPort    | embassy-time monotonic driver    |
//!
//! Dispatch (message composition and delivery) is owned by the host
//! application and has no adapter here.

pub mod hardware;
pub mod log_sink;
pub mod time;
