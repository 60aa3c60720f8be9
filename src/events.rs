//! Inbound event queue.
//!
//! Inputs are produced by:
//! - the platform sensor binding (accelerometer samples)
//! - the UI (hold button, cancel, stop)
//! - settings and lifecycle (config updates, detection toggle, shutdown)
//!
//! Producers may run on any thread.  Each input is stamped with the
//! monotonic time it happened and the consumer (the
//! [`Runtime`](crate::app::runtime::Runtime)) drains them in timestamp
//! order, interleaved with due timers.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ Sensor cb   │────▶│                  │     │              │
//! │ UI thread   │────▶│  InputQueue      │────▶│  Runtime     │
//! │ Settings    │────▶│  (min-heap, CS   │     │  (consumer)  │
//! │ Lifecycle   │────▶│   mutex)         │     │              │
//! └─────────────┘     └──────────────────┘     └──────────────┘
//! ```

use core::cell::RefCell;
use core::cmp::Ordering;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;
use heapless::binary_heap::{BinaryHeap, Min};
use log::warn;

use crate::app::commands::AppCommand;
use crate::sensors::AccelSample;

/// Maximum pending inputs.  At 50 Hz sampling this is over a second of
/// backlog.
const INPUT_QUEUE_CAP: usize = 64;

/// Everything that can arrive from outside the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Sample(AccelSample),
    Command(AppCommand),
}

#[derive(Debug)]
struct QueuedInput {
    at: Instant,
    /// Submission order; equal timestamps are delivered FIFO.
    seq: u32,
    input: Input,
}

impl PartialEq for QueuedInput {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedInput {}

impl PartialOrd for QueuedInput {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedInput {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .cmp(&other.at)
            .then((self.seq.wrapping_sub(other.seq) as i32).cmp(&0))
    }
}

struct Inner {
    heap: BinaryHeap<QueuedInput, Min, INPUT_QUEUE_CAP>,
    next_seq: u32,
    dropped: u32,
}

/// Multi-producer, single-consumer, timestamp-ordered input queue.
pub struct InputQueue {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner>>,
}

impl InputQueue {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                heap: BinaryHeap::new(),
                next_seq: 0,
                dropped: 0,
            })),
        }
    }

    /// Enqueue `input` stamped at `at`.  Safe from any thread.
    /// Returns `false` if the queue is full (input dropped).
    pub fn push(&self, at: Instant, input: Input) -> bool {
        self.inner.lock(|cell| {
            let mut q = cell.borrow_mut();
            let seq = q.next_seq;
            q.next_seq = seq.wrapping_add(1);
            match q.heap.push(QueuedInput { at, seq, input }) {
                Ok(()) => true,
                Err(rejected) => {
                    q.dropped = q.dropped.saturating_add(1);
                    warn!(
                        "InputQueue: full, dropped {:?} at {}ms",
                        rejected.input,
                        at.as_millis()
                    );
                    false
                }
            }
        })
    }

    /// Pop the earliest input if it is due at or before `now`.
    pub fn pop_due(&self, now: Instant) -> Option<(Instant, Input)> {
        self.inner.lock(|cell| {
            let mut q = cell.borrow_mut();
            match q.heap.peek() {
                Some(head) if head.at <= now => q.heap.pop().map(|e| (e.at, e.input)),
                _ => None,
            }
        })
    }

    /// Timestamp of the earliest pending input.
    pub fn next_at(&self) -> Option<Instant> {
        self.inner.lock(|cell| cell.borrow().heap.peek().map(|e| e.at))
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().heap.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inputs lost to a full queue since construction.
    pub fn dropped(&self) -> u32 {
        self.inner.lock(|cell| cell.borrow().dropped)
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
