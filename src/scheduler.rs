//! Timer queue engine.
//!
//! Every delayed transition in the core (countdown progress, countdown
//! deadline, screen colour toggle, flashlight step) is an entry in one
//! min-heap keyed by absolute fire time.  Nothing reschedules itself
//! from inside a closure; the owner of a channel pushes the next entry
//! when the current one fires, computed from an absolute anchor.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  TimerQueue  (min-heap on fire_at, FIFO on ties)       │
//! │                                                        │
//! │   (t=+30ms,  Activation, Wake)                         │
//! │   (t=+150ms, Flashlight, FlashStep{cursor=1})          │
//! │   (t=+300ms, ScreenPulse, ScreenToggle)                │
//! └──────────────────────────┬─────────────────────────────┘
//!                            │ pop_due(now)
//!                            ▼
//!               AppService routes by channel
//! ```
//!
//! Cancelling a channel physically removes its entries, so a cancelled
//! transition can never fire later.

use core::cmp::Ordering;

use embassy_time::Instant;
use heapless::binary_heap::{BinaryHeap, Min};
use log::error;

// ═══════════════════════════════════════════════════════════════
//  Timer types
// ═══════════════════════════════════════════════════════════════

/// Independent timelines sharing the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerChannel {
    Activation,
    ScreenPulse,
    Flashlight,
}

/// What to do when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Advance the activation countdown (progress or deadline).
    ActivationWake,
    /// Flip the screen background colour.
    ScreenToggle,
    /// Apply step `cursor` of the SOS schedule.
    FlashStep { cursor: u8 },
}

impl TimerAction {
    pub fn channel(self) -> TimerChannel {
        match self {
            Self::ActivationWake => TimerChannel::Activation,
            Self::ScreenToggle => TimerChannel::ScreenPulse,
            Self::FlashStep { .. } => TimerChannel::Flashlight,
        }
    }
}

/// A scheduled `(fire_at, channel, action)` entry.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    pub fire_at: Instant,
    pub action: TimerAction,
    /// Insertion order; breaks ties so equal deadlines fire FIFO.
    seq: u32,
}

impl Timer {
    pub fn channel(&self) -> TimerChannel {
        self.action.channel()
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .cmp(&other.fire_at)
            .then((self.seq.wrapping_sub(other.seq) as i32).cmp(&0))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Queue
// ═══════════════════════════════════════════════════════════════

/// Maximum pending timers.  Each channel keeps at most one in flight.
const TIMER_QUEUE_CAP: usize = 8;

pub struct TimerQueue {
    heap: BinaryHeap<Timer, Min, TIMER_QUEUE_CAP>,
    next_seq: u32,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `action` at the absolute time `fire_at`.
    /// Returns `false` if the queue is full (timer dropped).
    pub fn schedule(&mut self, fire_at: Instant, action: TimerAction) -> bool {
        let timer = Timer {
            fire_at,
            action,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        if self.heap.push(timer).is_err() {
            error!("TimerQueue: full, dropped {:?} at {}ms", action, fire_at.as_millis());
            return false;
        }
        true
    }

    /// Pop the earliest timer if it is due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Timer> {
        match self.heap.peek() {
            Some(t) if t.fire_at <= now => self.heap.pop(),
            _ => None,
        }
    }

    /// Fire time of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|t| t.fire_at)
    }

    /// Remove every pending timer on `channel`.  Returns how many were removed.
    pub fn cancel_channel(&mut self, channel: TimerChannel) -> usize {
        let before = self.heap.len();
        let old = core::mem::replace(&mut self.heap, BinaryHeap::new());
        for timer in old.iter().filter(|t| t.channel() != channel) {
            // Capacity cannot be exceeded: we only re-insert a subset.
            let _ = self.heap.push(*timer);
        }
        before - self.heap.len()
    }

    /// Pending timers on `channel`.
    pub fn pending(&self, channel: TimerChannel) -> usize {
        self.heap.iter().filter(|t| t.channel() == channel).count()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
