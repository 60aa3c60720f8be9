//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  IDLE ──[start_manual_hold / on_fall_detected]──▶ COUNTING(source)
//!    ▲                                                 │       │
//!    │                                  [now >= deadline]   [cancel]
//!    │                                                 ▼       ▼
//!    └──────────────────────────────────────── CONFIRMED   CANCELLED
//! ```
//!
//! `Confirmed` and `Cancelled` emit their event on entry and hand back
//! to `Idle` on the next update; the controller runs that update within
//! the same call, so they are never observed from outside.

use log::{info, warn};

use super::context::ActivationContext;
use super::{StateDescriptor, StateId};
use crate::app::events::CoreEvent;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per controller.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Counting
        StateDescriptor {
            id: StateId::Counting,
            name: "Counting",
            on_enter: Some(counting_enter),
            on_exit: None,
            on_update: counting_update,
        },
        // Index 2: Confirmed
        StateDescriptor {
            id: StateId::Confirmed,
            name: "Confirmed",
            on_enter: Some(confirmed_enter),
            on_exit: None,
            on_update: settle_to_idle,
        },
        // Index 3: Cancelled
        StateDescriptor {
            id: StateId::Cancelled,
            name: "Cancelled",
            on_enter: Some(cancelled_enter),
            on_exit: None,
            on_update: settle_to_idle,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut ActivationContext) {
    // The session is destroyed on every return to Idle.
    ctx.session = None;
    ctx.cancel_requested = false;
}

fn idle_update(_ctx: &mut ActivationContext) -> Option<StateId> {
    // Left only through force_transition when a trigger arrives.
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COUNTING state: countdown running and cancellable
// ═══════════════════════════════════════════════════════════════════════════

fn counting_enter(ctx: &mut ActivationContext) {
    let Some(session) = ctx.session else {
        warn!("COUNTING: entered without a session");
        return;
    };
    info!(
        "COUNTING: {} ({:?}) for {}ms",
        session.id,
        session.source,
        session.duration().as_millis()
    );
    ctx.emit(CoreEvent::CountdownStarted {
        session: session.id,
        source: session.source,
        duration_ms: session.duration().as_millis() as u32,
    });
    ctx.emit_progress();
}

fn counting_update(ctx: &mut ActivationContext) -> Option<StateId> {
    let Some(mut session) = ctx.session else {
        return Some(StateId::Idle);
    };

    // A cancel that arrives before the deadline has been processed wins.
    if ctx.cancel_requested {
        return Some(StateId::Cancelled);
    }

    if ctx.now >= session.deadline {
        return Some(StateId::Confirmed);
    }

    // One update per call however many intervals elapsed.
    if ctx.now >= session.next_progress {
        session.advance_progress(ctx.now);
        ctx.session = Some(session);
        ctx.emit_progress();
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONFIRMED / CANCELLED: emit once, then return to Idle
// ═══════════════════════════════════════════════════════════════════════════

fn confirmed_enter(ctx: &mut ActivationContext) {
    if let Some(s) = ctx.session {
        info!(
            "CONFIRMED: {} ({:?}) at {}ms",
            s.id,
            s.source,
            ctx.now.as_millis()
        );
        ctx.emit(CoreEvent::EmergencyConfirmed {
            session: s.id,
            source: s.source,
        });
    }
}

fn cancelled_enter(ctx: &mut ActivationContext) {
    if let Some(s) = ctx.session {
        info!(
            "CANCELLED: {} ({:?}) with {}ms remaining",
            s.id,
            s.source,
            s.remaining(ctx.now).as_millis()
        );
        ctx.emit(CoreEvent::Cancelled {
            session: s.id,
            source: s.source,
        });
    }
}

fn settle_to_idle(_ctx: &mut ActivationContext) -> Option<StateId> {
    Some(StateId::Idle)
}
