//! Timer-driven phase changes and session finalization.
//!
//! Three kinds of timers report back to the registry:
//!
//! - **Phase** deadlines in a session's named slots. `Turn` asks the game
//!   what happens when time runs out; `Reveal` and `Advance` move on to
//!   the next turn, round, or question (or end the game).
//! - **Purge** removes a finished session after its grace period.
//! - **InviteExpiry** drops an unanswered invite and its placeholder.
//!
//! Every expiry is checked against the slot it was armed in before it is
//! acted on. One that lost a race with a player action (all answers in
//! before the deadline, say) is ignored.

use std::time::Duration;

use arcade_games::{ActionContext, Advance, FollowUp, GameState, Transition};
use arcade_protocol::{FinishReason, PlayerId, SessionId, SessionStatus, Winner};
use arcade_scheduler::{Expired, Scheduler, TimerId, TimerSlot};
use serde_json::Value;
use tracing::{debug, info};

use crate::{GameResult, PhaseOutcome, Registry, Session, TimerOutcome};

/// What a registry timer was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryTimer {
    Phase {
        session_id: SessionId,
        slot: TimerSlot,
    },
    Purge {
        session_id: SessionId,
    },
    InviteExpiry {
        inviter: PlayerId,
        target: PlayerId,
    },
}

impl Registry {
    /// Applies one timer expiry. Returns `None` when the timer was stale
    /// and nothing changed.
    pub fn handle_timer(&mut self, expired: Expired<RegistryTimer>) -> Option<TimerOutcome> {
        match expired.event {
            RegistryTimer::Phase { session_id, slot } => self
                .on_phase_timer(session_id, slot, expired.id)
                .map(TimerOutcome::Phase),
            RegistryTimer::Purge { session_id } => self
                .on_purge(session_id, expired.id)
                .then_some(TimerOutcome::Purged(session_id)),
            RegistryTimer::InviteExpiry { inviter, target } => self
                .on_invite_expiry(inviter, target, expired.id)
                .map(TimerOutcome::InviteExpired),
        }
    }

    fn on_phase_timer(
        &mut self,
        session_id: SessionId,
        slot: TimerSlot,
        timer_id: TimerId,
    ) -> Option<PhaseOutcome> {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            debug!(%session_id, %slot, "timer for removed session ignored");
            return None;
        };
        if session.status != SessionStatus::Playing || !session.timers.clear_if_current(slot, timer_id)
        {
            debug!(%session_id, %slot, %timer_id, "stale timer ignored");
            return None;
        }
        let state = session.state.as_ref()?;
        let grace = self.config.finished_grace;

        match slot {
            TimerSlot::Turn => {
                let ctx = ActionContext::new(session.phase_started_at.elapsed());
                let Some(transition) = state.on_deadline(&ctx) else {
                    debug!(%session_id, "deadline passed outside a timed phase");
                    return None;
                };
                info!(%session_id, "phase deadline reached");
                let (event, finished) = session.commit(transition, &mut self.scheduler, grace);
                Some(PhaseOutcome {
                    session_id,
                    event: Some(event),
                    next_unit: false,
                    finished,
                })
            }
            TimerSlot::Reveal | TimerSlot::Advance => match state.advance(&mut self.rng)? {
                Advance::Next { state, event } => {
                    session.state = Some(state);
                    session.sync_scores();
                    session.begin_phase(&mut self.scheduler);
                    debug!(%session_id, "next unit of play");
                    Some(PhaseOutcome {
                        session_id,
                        event: Some(event),
                        next_unit: true,
                        finished: None,
                    })
                }
                Advance::Finished(winner) => {
                    let result = session.finish(
                        Some(winner),
                        FinishReason::Completed,
                        &mut self.scheduler,
                        grace,
                    );
                    Some(PhaseOutcome {
                        session_id,
                        event: None,
                        next_unit: false,
                        finished: Some(result),
                    })
                }
            },
        }
    }

    fn on_purge(&mut self, session_id: SessionId, timer_id: TimerId) -> bool {
        let current = self.sessions.get(&session_id).is_some_and(|s| {
            s.status.is_finished() && s.purge.as_ref().is_some_and(|t| t.id() == timer_id)
        });
        if !current {
            debug!(%session_id, "stale purge timer ignored");
            return false;
        }
        self.remove_session(session_id);
        info!(%session_id, "finished session purged");
        true
    }
}

impl Session {
    /// Commits an accepted transition: replaces the state, refreshes
    /// scores, and arms whatever the game asked for next.
    pub(crate) fn commit(
        &mut self,
        transition: Transition<GameState, Value>,
        scheduler: &mut Scheduler<RegistryTimer>,
        grace: Duration,
    ) -> (Value, Option<GameResult>) {
        let Transition {
            state,
            event,
            game_over,
            follow_up,
        } = transition;
        self.state = Some(state);
        self.sync_scores();

        if let Some(winner) = game_over {
            let result = self.finish(Some(winner), FinishReason::Completed, scheduler, grace);
            return (event, Some(result));
        }

        let next = match follow_up {
            FollowUp::None => None,
            FollowUp::Reveal => Some((TimerSlot::Reveal, self.config.reveal_delay)),
            FollowUp::Advance => Some((TimerSlot::Advance, self.config.advance_delay)),
        };
        if let Some((slot, delay)) = next {
            self.timers.cancel(TimerSlot::Turn);
            self.arm(slot, delay, scheduler);
        }
        (event, None)
    }

    /// Moves the session to `Finished`, cancels its phase timers, and
    /// schedules its removal after `grace`.
    pub(crate) fn finish(
        &mut self,
        winner: Option<Winner>,
        reason: FinishReason,
        scheduler: &mut Scheduler<RegistryTimer>,
        grace: Duration,
    ) -> GameResult {
        self.status = SessionStatus::Finished;
        self.timers.cancel_all();
        self.purge = Some(scheduler.schedule(grace, RegistryTimer::Purge { session_id: self.id }));
        info!(
            session_id = %self.id,
            game_type = %self.game_type,
            ?winner,
            ?reason,
            "game finished"
        );
        GameResult {
            scores: self.scoreboard(),
            winner,
            reason,
        }
    }
}
