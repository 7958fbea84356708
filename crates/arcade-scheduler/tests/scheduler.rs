//! Timer behaviour under Tokio's paused clock.

use std::time::Duration;

use arcade_scheduler::{Expired, Scheduler, SessionTimers, TimerSlot};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lets spawned timer tasks observe the advanced clock.
async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

async fn advance(ms: u64) {
    time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

fn drain<E>(rx: &mut UnboundedReceiver<Expired<E>>) -> Vec<E> {
    let mut out = Vec::new();
    while let Ok(expired) = rx.try_recv() {
        out.push(expired.event);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn timer_fires_after_delay() {
    let (mut scheduler, mut rx) = Scheduler::new();
    let _timer = scheduler.schedule(Duration::from_millis(500), "reveal");
    settle().await;

    advance(499).await;
    assert!(drain(&mut rx).is_empty());

    advance(1).await;
    assert_eq!(drain(&mut rx), vec!["reveal"]);
}

#[tokio::test(start_paused = true)]
async fn timers_fire_in_deadline_order() {
    let (mut scheduler, mut rx) = Scheduler::new();
    let _late = scheduler.schedule(Duration::from_secs(3), 3);
    let _early = scheduler.schedule(Duration::from_secs(1), 1);
    let _middle = scheduler.schedule(Duration::from_secs(2), 2);
    settle().await;

    let mut fired = Vec::new();
    for _ in 0..3 {
        advance(1000).await;
        fired.extend(drain(&mut rx));
    }
    assert_eq!(fired, vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn dropped_timer_never_fires() {
    let (mut scheduler, mut rx) = Scheduler::new();
    let timer = scheduler.schedule(Duration::from_millis(100), ());
    settle().await;
    timer.cancel();

    advance(1000).await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn remaining_counts_down() {
    let (mut scheduler, _rx) = Scheduler::new();
    let timer = scheduler.schedule(Duration::from_secs(15), ());
    assert_eq!(timer.remaining(), Duration::from_secs(15));

    time::advance(Duration::from_secs(10)).await;
    assert_eq!(timer.remaining(), Duration::from_secs(5));

    time::advance(Duration::from_secs(10)).await;
    assert_eq!(timer.remaining(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn arming_a_slot_cancels_its_previous_timer() {
    let (mut scheduler, mut rx) = Scheduler::new();
    let mut timers = SessionTimers::new();

    timers.arm(TimerSlot::Turn, scheduler.schedule(Duration::from_secs(1), "old"));
    timers.arm(TimerSlot::Turn, scheduler.schedule(Duration::from_secs(2), "new"));
    settle().await;

    advance(3000).await;
    assert_eq!(drain(&mut rx), vec!["new"]);
}

#[tokio::test(start_paused = true)]
async fn cancel_all_silences_every_slot() {
    let (mut scheduler, mut rx) = Scheduler::new();
    let mut timers = SessionTimers::new();
    for slot in TimerSlot::ALL {
        timers.arm(slot, scheduler.schedule(Duration::from_secs(1), slot));
    }
    assert!(!timers.is_empty());
    settle().await;

    timers.cancel_all();
    assert!(timers.is_empty());

    advance(2000).await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn stale_expiry_is_rejected_after_replacement() {
    let (mut scheduler, mut rx) = Scheduler::new();
    let mut timers = SessionTimers::new();

    timers.arm(TimerSlot::Reveal, scheduler.schedule(Duration::from_secs(1), ()));
    settle().await;
    advance(1000).await;

    // Fired and queued, but the slot moved on before it was handled.
    let expired = rx.try_recv().expect("expiry queued");
    timers.arm(TimerSlot::Reveal, scheduler.schedule(Duration::from_secs(1), ()));

    assert!(!timers.clear_if_current(TimerSlot::Reveal, expired.id));
    assert!(timers.is_armed(TimerSlot::Reveal));
}

#[tokio::test(start_paused = true)]
async fn current_expiry_clears_its_slot() {
    let (mut scheduler, mut rx) = Scheduler::new();
    let mut timers = SessionTimers::new();

    timers.arm(TimerSlot::Advance, scheduler.schedule(Duration::from_millis(2500), ()));
    settle().await;
    advance(2500).await;

    let expired = rx.try_recv().expect("expiry queued");
    assert!(timers.is_current(TimerSlot::Advance, expired.id));
    assert!(timers.clear_if_current(TimerSlot::Advance, expired.id));
    assert!(timers.is_empty());
    assert!(!timers.clear_if_current(TimerSlot::Advance, expired.id));
}
