//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured core events to the
//! logger (serial console on device, stderr on host).  A UI adapter
//! driving the progress bar would implement the same trait.

use log::{error, info, warn};

use crate::alert::ChannelState;
use crate::app::events::CoreEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`CoreEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::FallImpactDetected(d) => {
                info!(
                    "FALL  | freefall@{}ms impact@{}ms",
                    d.freefall_start.as_millis(),
                    d.impact_at.as_millis(),
                );
            }
            CoreEvent::CountdownStarted {
                session,
                source,
                duration_ms,
            } => {
                info!("COUNT | {} started | source={:?} | {}ms", session, source, duration_ms);
            }
            CoreEvent::CountdownProgress(p) => {
                info!(
                    "COUNT | {} | remaining={}ms ({} ticks) | {:.0}%",
                    p.session,
                    p.remaining_ms,
                    p.remaining_ticks,
                    p.fraction * 100.0,
                );
            }
            CoreEvent::EmergencyConfirmed { session, source } => {
                warn!("SOS   | {} CONFIRMED | source={:?}", session, source);
            }
            CoreEvent::Cancelled { session, source } => {
                info!("COUNT | {} cancelled | source={:?}", session, source);
            }
            CoreEvent::AlertStarted { alert, trigger } => {
                warn!("ALERT | {} started for {}", alert, trigger);
            }
            CoreEvent::ChannelChanged(state) => match state {
                ChannelState::Screen((r, g, b)) => {
                    info!("ALERT | screen=#{:02x}{:02x}{:02x}", r, g, b);
                }
                ChannelState::Siren(on) => {
                    info!("ALERT | siren={}", if *on { "ON" } else { "OFF" });
                }
                ChannelState::Torch(on) => {
                    info!("ALERT | torch={}", if *on { "ON" } else { "OFF" });
                }
            },
            CoreEvent::HardwareFault { .. } => {
                if let Some(e) = event.as_error() {
                    error!("FAULT | {}", e);
                }
            }
            CoreEvent::AlertStopped(alert) => {
                info!("ALERT | {} stopped, all channels off", alert);
            }
            CoreEvent::DispatchFailed { session, error: e } => {
                error!("SEND  | {} dispatch failed: {}", session, e);
            }
            CoreEvent::Rejected(_) => {
                if let Some(e) = event.as_error() {
                    warn!("REJECT| {}", e);
                }
            }
        }
    }
}
