//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.

use sosguard::alert::pulse::Rgb;
use sosguard::app::events::{AlertRequest, CoreEvent, DispatchError, LocationText};
use sosguard::app::ports::{AudioPort, DispatchPort, EventSink, ScreenPort, TorchPort};
use sosguard::error::HardwareError;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    Torch(bool),
    AudioStart,
    AudioStop,
    Screen(Rgb),
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<HwCall>,
    pub torch_broken: bool,
    pub audio_broken: bool,
    pub screen_broken: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last torch level the device accepted.
    pub fn torch_on(&self) -> bool {
        !self.torch_broken
            && self
                .calls
                .iter()
                .rev()
                .find_map(|c| match c {
                    HwCall::Torch(on) => Some(*on),
                    _ => None,
                })
                .unwrap_or(false)
    }

    pub fn audio_playing(&self) -> bool {
        !self.audio_broken
            && self
                .calls
                .iter()
                .rev()
                .find_map(|c| match c {
                    HwCall::AudioStart => Some(true),
                    HwCall::AudioStop => Some(false),
                    _ => None,
                })
                .unwrap_or(false)
    }

    pub fn torch_calls(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Torch(on) => Some(*on),
                _ => None,
            })
            .collect()
    }

    pub fn screen_calls(&self) -> Vec<Rgb> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Screen(rgb) => Some(*rgb),
                _ => None,
            })
            .collect()
    }
}

impl TorchPort for MockHardware {
    fn set_torch(&mut self, on: bool) -> Result<(), HardwareError> {
        self.calls.push(HwCall::Torch(on));
        if self.torch_broken {
            Err(HardwareError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl AudioPort for MockHardware {
    fn start_loop(&mut self) -> Result<(), HardwareError> {
        self.calls.push(HwCall::AudioStart);
        if self.audio_broken {
            Err(HardwareError::Rejected)
        } else {
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<(), HardwareError> {
        self.calls.push(HwCall::AudioStop);
        Ok(())
    }
}

impl ScreenPort for MockHardware {
    fn set_background(&mut self, colour: Rgb) -> Result<(), HardwareError> {
        self.calls.push(HwCall::Screen(colour));
        if self.screen_broken {
            Err(HardwareError::Rejected)
        } else {
            Ok(())
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<CoreEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&CoreEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn confirmations(&self) -> usize {
        self.count(|e| matches!(e, CoreEvent::EmergencyConfirmed { .. }))
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &CoreEvent) {
        self.events.push(event.clone());
    }
}

// ── MockDispatch ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockDispatch {
    pub sent: Vec<AlertRequest>,
    pub location: Option<&'static str>,
    pub fail_with: Option<DispatchError>,
}

#[allow(dead_code)]
impl MockDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(location: &'static str) -> Self {
        Self {
            location: Some(location),
            ..Self::default()
        }
    }
}

impl DispatchPort for MockDispatch {
    fn current_location(&mut self) -> Option<LocationText> {
        self.location.and_then(|s| LocationText::try_from(s).ok())
    }

    fn send_alert(&mut self, request: &AlertRequest) -> Result<(), DispatchError> {
        self.sent.push(request.clone());
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
