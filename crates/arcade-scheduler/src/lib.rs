//! One-shot phase timers for arcade sessions.
//!
//! Timed games need the server to act when nobody does: a question's
//! fifteen seconds run out, a reveal has been on screen long enough, the
//! next round is due. This crate provides those deadlines.
//!
//! # Model
//!
//! A [`Scheduler`] spawns one sleeping task per timer. When the sleep
//! finishes the task sends an [`Expired`] message down a channel; the
//! owner receives it inside its own `tokio::select!` loop and handles it
//! like any other serialized operation. Nothing runs on the timer task
//! itself, so the single-writer discipline of the owner is preserved.
//!
//! Every scheduled timer returns a [`PendingTimer`] guard. Dropping or
//! cancelling the guard aborts the sleeping task. A timer can still fire
//! after its phase ended if its message was already queued, so owners
//! keep guards in a [`SessionTimers`] set and check
//! [`SessionTimers::is_current`] before acting on an expiry.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         Some(expired) = timer_rx.recv() => {
//!             if timers.clear_if_current(slot, expired.id) {
//!                 /* advance the phase */
//!             }
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Timer identity
// ---------------------------------------------------------------------------

/// Identifies one scheduled timer. Never reused by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// Delivered on the scheduler's channel when a timer's deadline passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expired<E> {
    pub id: TimerId,
    pub event: E,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Spawns one-shot timers that report back on a single channel.
///
/// `E` is whatever the owner needs to route an expiry (typically a session
/// id plus the slot that armed it).
pub struct Scheduler<E> {
    tx: mpsc::UnboundedSender<Expired<E>>,
    next_id: u64,
}

impl<E: Send + 'static> Scheduler<E> {
    /// Creates a scheduler and the receiver its expiries arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Expired<E>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, next_id: 1 }, rx)
    }

    /// Schedules `event` to be delivered after `delay`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&mut self, delay: Duration, event: E) -> PendingTimer {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let deadline = Instant::now() + delay;
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            // The owner may already be gone during shutdown.
            let _ = tx.send(Expired { id, event });
        });

        trace!(%id, delay_ms = delay.as_millis() as u64, "timer scheduled");
        PendingTimer {
            id,
            deadline,
            abort: task.abort_handle(),
        }
    }
}

/// Guard for a scheduled timer. Dropping it cancels the timer.
#[derive(Debug)]
pub struct PendingTimer {
    id: TimerId,
    deadline: Instant,
    abort: AbortHandle,
}

impl PendingTimer {
    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Cancels the timer. Equivalent to dropping the guard.
    pub fn cancel(self) {}
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

// ---------------------------------------------------------------------------
// Named slots
// ---------------------------------------------------------------------------

/// The three deadlines a session can have pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    /// Turn, round, or question deadline.
    Turn,
    /// Delay before moving on from a revealed answer.
    Reveal,
    /// Delay before the next round after a decided one.
    Advance,
}

impl TimerSlot {
    pub const ALL: [TimerSlot; 3] = [TimerSlot::Turn, TimerSlot::Reveal, TimerSlot::Advance];
}

impl fmt::Display for TimerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Turn => write!(f, "turn"),
            Self::Reveal => write!(f, "reveal"),
            Self::Advance => write!(f, "advance"),
        }
    }
}

/// The pending timers owned by one session, one per slot.
///
/// Arming a slot replaces (and cancels) whatever it held. `cancel_all` is
/// the single teardown point used when a session finishes or is removed.
#[derive(Debug, Default)]
pub struct SessionTimers {
    turn: Option<PendingTimer>,
    reveal: Option<PendingTimer>,
    advance: Option<PendingTimer>,
}

impl SessionTimers {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, slot: TimerSlot) -> &mut Option<PendingTimer> {
        match slot {
            TimerSlot::Turn => &mut self.turn,
            TimerSlot::Reveal => &mut self.reveal,
            TimerSlot::Advance => &mut self.advance,
        }
    }

    fn slot(&self, slot: TimerSlot) -> Option<&PendingTimer> {
        match slot {
            TimerSlot::Turn => self.turn.as_ref(),
            TimerSlot::Reveal => self.reveal.as_ref(),
            TimerSlot::Advance => self.advance.as_ref(),
        }
    }

    /// Puts `timer` in `slot`, cancelling the previous occupant.
    pub fn arm(&mut self, slot: TimerSlot, timer: PendingTimer) {
        if let Some(old) = self.slot_mut(slot).replace(timer) {
            debug!(%slot, id = %old.id, "timer replaced");
        }
    }

    /// Cancels the timer in `slot`. Returns `true` if one was pending.
    pub fn cancel(&mut self, slot: TimerSlot) -> bool {
        self.slot_mut(slot).take().is_some()
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        for slot in TimerSlot::ALL {
            self.cancel(slot);
        }
    }

    /// Returns `true` if `id` is the timer currently armed in `slot`.
    pub fn is_current(&self, slot: TimerSlot, id: TimerId) -> bool {
        self.slot(slot).is_some_and(|t| t.id == id)
    }

    /// Clears `slot` if it holds `id`. Returns whether it did.
    ///
    /// Call this when an expiry arrives: `false` means the timer was
    /// cancelled or replaced after it fired and the expiry must be ignored.
    pub fn clear_if_current(&mut self, slot: TimerSlot, id: TimerId) -> bool {
        if self.is_current(slot, id) {
            self.slot_mut(slot).take();
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self, slot: TimerSlot) -> bool {
        self.slot(slot).is_some()
    }

    pub fn is_empty(&self) -> bool {
        TimerSlot::ALL.iter().all(|s| !self.is_armed(*s))
    }

    pub fn deadline(&self, slot: TimerSlot) -> Option<Instant> {
        self.slot(slot).map(PendingTimer::deadline)
    }
}
