//! Thread-safe driver around [`AppService`].
//!
//! Sensor callbacks, the UI thread and lifecycle hooks call
//! [`Runtime::submit`] from wherever they run.  One consumer calls
//! [`Runtime::run_until`] with the current monotonic time (from a
//! [`ClockPort`] or a scripted clock) and the runtime interleaves queued
//! inputs and due timers in global timestamp order:
//!
//! ```text
//!   submit(at, input) ──▶ InputQueue ─┐
//!                                     ├─▶ run_until(now) ─▶ AppService
//!   AppService timers ────────────────┘    (earliest first, inputs
//!                                           before timers on a tie)
//! ```
//!
//! The service and its ports sit behind a single `embassy-sync` blocking
//! mutex, so no two handlers ever run concurrently and the single-session
//! invariants hold however many threads submit.  Port implementations
//! may call `submit` but must not call `run_until` re-entrantly.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;

use super::commands::AppCommand;
use super::ports::{AlertOutputs, ClockPort, DispatchPort, EventSink};
use super::service::AppService;
use crate::events::{Input, InputQueue};
use crate::sensors::AccelSample;

struct Core<H, S, D> {
    service: AppService,
    hw: H,
    sink: S,
    dispatch: D,
}

pub struct Runtime<H, S, D> {
    core: Mutex<CriticalSectionRawMutex, RefCell<Core<H, S, D>>>,
    inputs: InputQueue,
}

impl<H, S, D> Runtime<H, S, D>
where
    H: AlertOutputs,
    S: EventSink,
    D: DispatchPort,
{
    pub fn new(service: AppService, hw: H, sink: S, dispatch: D) -> Self {
        Self {
            core: Mutex::new(RefCell::new(Core {
                service,
                hw,
                sink,
                dispatch,
            })),
            inputs: InputQueue::new(),
        }
    }

    // ── Producers (any thread) ────────────────────────────────

    /// Queue `input` as having happened at `at`.  Returns `false` if the
    /// input queue is full.
    pub fn submit(&self, at: Instant, input: Input) -> bool {
        self.inputs.push(at, input)
    }

    /// Queue a sample at its own capture time.
    pub fn submit_sample(&self, sample: AccelSample) -> bool {
        self.submit(sample.t, Input::Sample(sample))
    }

    pub fn submit_command(&self, at: Instant, cmd: AppCommand) -> bool {
        self.submit(at, Input::Command(cmd))
    }

    // ── Consumer ──────────────────────────────────────────────

    /// Process every input and timer due at or before `now`, earliest
    /// first.  Returns how many were processed.
    pub fn run_until(&self, now: Instant) -> usize {
        let mut processed = 0;
        loop {
            let input_at = self.inputs.next_at().filter(|t| *t <= now);
            let timer_at = self
                .core
                .lock(|c| c.borrow().service.next_deadline())
                .filter(|t| *t <= now);

            let take_input = match (input_at, timer_at) {
                (None, None) => break,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some(i), Some(t)) => i <= t,
            };

            if take_input {
                let Some((at, input)) = self.inputs.pop_due(now) else {
                    continue;
                };
                self.core.lock(|c| {
                    let mut core = c.borrow_mut();
                    let Core {
                        service,
                        hw,
                        sink,
                        dispatch,
                    } = &mut *core;
                    service.handle_input(at, input, hw, sink, dispatch);
                });
            } else {
                self.core.lock(|c| {
                    let mut core = c.borrow_mut();
                    let Core {
                        service,
                        hw,
                        sink,
                        dispatch,
                    } = &mut *core;
                    service.fire_next(now, hw, sink, dispatch);
                });
            }
            processed += 1;
        }
        processed
    }

    /// `run_until(clock.now())`.
    pub fn run_pending(&self, clock: &impl ClockPort) -> usize {
        self.run_until(clock.now())
    }

    /// When there is next work to do: the earlier of the first queued
    /// input and the first pending timer.
    pub fn next_wake(&self) -> Option<Instant> {
        let timer = self.core.lock(|c| c.borrow().service.next_deadline());
        match (self.inputs.next_at(), timer) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run `f` with shared access to the service and its ports.
    pub fn inspect<R>(&self, f: impl FnOnce(&AppService, &H, &S, &D) -> R) -> R {
        self.core.lock(|c| {
            let core = c.borrow();
            f(&core.service, &core.hw, &core.sink, &core.dispatch)
        })
    }

    /// Inputs dropped because the queue was full.
    pub fn dropped_inputs(&self) -> u32 {
        self.inputs.dropped()
    }

    /// Tear down and hand back the service and ports.
    pub fn into_parts(self) -> (AppService, H, S, D) {
        let core = self.core.into_inner().into_inner();
        (core.service, core.hw, core.sink, core.dispatch)
    }
}
