//! Flashlight SOS pattern.
//!
//! The nine signals `...---...` are expanded once into a table of
//! eighteen torch steps (ON at signal start, OFF at signal end), each with
//! an offset from the cycle start:
//!
//! ```text
//!  offset  0    150  300  450  600  750  900 1350 1800 ... 4500     5500
//!          ON   OFF  ON   OFF  ON   OFF  ON   OFF  ON       │ +word  │
//!          └dot┘ gap └dot┘ gap └dot┘ letter gap └─dash─┘   │  gap   │ next cycle
//! ```
//!
//! Every third signal is followed by the inter-letter gap, the others by
//! the intra-letter gap.  After the ninth signal's gap the inter-word gap
//! elapses and the table repeats.  Fire times are always
//! `cycle_start + offset`, with `cycle_start` advancing by exactly one
//! cycle length, so a late consumer never accumulates drift.

use embassy_time::{Duration, Instant};

use crate::config::MorseTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Dot,
    Dash,
}

/// S-O-S.
pub const SOS: [Signal; 9] = [
    Signal::Dot,
    Signal::Dot,
    Signal::Dot,
    Signal::Dash,
    Signal::Dash,
    Signal::Dash,
    Signal::Dot,
    Signal::Dot,
    Signal::Dot,
];

/// Two torch steps (ON, OFF) per signal.
pub const STEPS_PER_CYCLE: usize = SOS.len() * 2;

/// Signals per letter; a letter boundary uses the longer gap.
const SIGNALS_PER_LETTER: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Offset from the cycle start.
    pub offset: Duration,
    pub torch_on: bool,
}

/// One SOS cycle expanded into absolute offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorseSchedule {
    steps: [Step; STEPS_PER_CYCLE],
    cycle: Duration,
}

impl MorseSchedule {
    pub fn new(timing: &MorseTiming) -> Self {
        let ms = |v: u32| Duration::from_millis(v as u64);
        let mut steps = [Step {
            offset: Duration::from_ticks(0),
            torch_on: false,
        }; STEPS_PER_CYCLE];

        let mut offset = Duration::from_ticks(0);
        for (i, signal) in SOS.iter().enumerate() {
            let length = match signal {
                Signal::Dot => ms(timing.dot_ms),
                Signal::Dash => ms(timing.dash_ms),
            };
            steps[i * 2] = Step {
                offset,
                torch_on: true,
            };
            offset += length;
            steps[i * 2 + 1] = Step {
                offset,
                torch_on: false,
            };
            offset += if i % SIGNALS_PER_LETTER == SIGNALS_PER_LETTER - 1 {
                ms(timing.inter_letter_gap_ms)
            } else {
                ms(timing.intra_letter_gap_ms)
            };
        }

        Self {
            steps,
            cycle: offset + ms(timing.inter_word_gap_ms),
        }
    }

    pub fn steps(&self) -> &[Step; STEPS_PER_CYCLE] {
        &self.steps
    }

    /// Time between the starts of two consecutive cycles.
    pub fn cycle(&self) -> Duration {
        self.cycle
    }
}

/// Live state of the flashlight channel: where we are in the table and
/// which cycle we are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashPattern {
    schedule: MorseSchedule,
    cycle_start: Instant,
    cursor: usize,
    cycles_completed: u32,
}

impl FlashPattern {
    pub fn start(schedule: MorseSchedule, now: Instant) -> Self {
        Self {
            schedule,
            cycle_start: now,
            cursor: 0,
            cycles_completed: 0,
        }
    }

    /// Index of the next step to apply.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Absolute fire time of the next step.
    pub fn next_fire(&self) -> Instant {
        self.cycle_start + self.schedule.steps[self.cursor].offset
    }

    /// Start time of the current cycle.
    pub fn cycle_start(&self) -> Instant {
        self.cycle_start
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    /// Consume the next step and return the torch state it commands.
    pub fn advance(&mut self) -> bool {
        let step = self.schedule.steps[self.cursor];
        self.cursor += 1;
        if self.cursor == STEPS_PER_CYCLE {
            self.cursor = 0;
            self.cycle_start += self.schedule.cycle;
            self.cycles_completed += 1;
        }
        step.torch_on
    }
}
