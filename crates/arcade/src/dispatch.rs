//! Turning player requests and timer expiries into registry calls and
//! outbound messages.
//!
//! Every state-carrying message is rendered per recipient through
//! [`Registry::view`](arcade_registry::Registry::view), so a player only
//! ever receives the redacted state they are entitled to. Draw & Guess
//! word choices travel on their own `drawerInfo` message, to the drawer
//! alone.

use arcade_presence::PresenceError;
use arcade_protocol::{ClientMessage, GameType, PlayerId, ServerMessage, SessionId};
use arcade_registry::{
    Expired, GameResult, LeaveOutcome, PhaseOutcome, ReadyOutcome, RegistryTimer, TimerOutcome,
};
use serde_json::Value;
use tracing::debug;

use crate::ArcadeError;
use crate::engine::Engine;

impl Engine {
    pub(crate) fn on_request(&mut self, player_id: PlayerId, msg: ClientMessage) {
        if let Err(e) = self.dispatch(player_id, msg) {
            debug!(%player_id, code = e.tag(), error = %e, "request rejected");
            self.send(
                player_id,
                ServerMessage::Error {
                    code: e.tag().to_owned(),
                    message: e.to_string(),
                },
            );
        }
    }

    fn dispatch(&mut self, player_id: PlayerId, msg: ClientMessage) -> Result<(), ArcadeError> {
        match msg {
            ClientMessage::List => {
                self.send(
                    player_id,
                    ServerMessage::SessionList {
                        sessions: self.registry.list_open_sessions(),
                    },
                );
            }
            ClientMessage::Create {
                game_type,
                max_players,
            } => {
                let name = self.display_name(player_id);
                let session_id = self
                    .registry
                    .create_session(player_id, &name, &game_type, max_players)?
                    .id();
                if let Some(session) = self.registry.view(session_id, player_id) {
                    self.send(player_id, ServerMessage::Created { session });
                }
                self.broadcast_lobby();
            }
            ClientMessage::Join { session_id } => {
                let name = self.display_name(player_id);
                self.registry.join_session(session_id, player_id, &name)?;
                self.announce_join(session_id, player_id, name);
            }
            ClientMessage::Leave { session_id } => {
                let outcome = self.registry.leave_session(session_id, player_id)?;
                self.announce_leave(session_id, player_id, outcome);
            }
            ClientMessage::Ready { session_id } => {
                let outcome = self.registry.set_ready(session_id, player_id)?;
                let members = self.members(session_id);
                self.send_all(
                    &members,
                    &ServerMessage::PlayerReady {
                        session_id,
                        player_id,
                    },
                );
                if outcome == ReadyOutcome::Started {
                    for &member in &members {
                        if let Some(session) = self.registry.view(session_id, member) {
                            self.send(member, ServerMessage::Started { session });
                        }
                    }
                    self.send_drawer_info(session_id);
                    self.broadcast_lobby();
                }
            }
            ClientMessage::Action {
                session_id,
                action_type,
                data,
            } => {
                let outcome = self
                    .registry
                    .apply_action(session_id, player_id, &action_type, data)?;
                self.send_state(session_id, outcome.event);
                if let Some(result) = outcome.finished {
                    let members = self.members(session_id);
                    self.send_game_over(session_id, &members, result);
                }
            }
            ClientMessage::DrawStroke { session_id, stroke } => {
                self.relay_stroke(player_id, session_id, stroke);
            }
            ClientMessage::Invite {
                target_id,
                game_type,
            } => self.invite(player_id, target_id, &game_type)?,
            ClientMessage::InviteAccept { session_id } => {
                let name = self.display_name(player_id);
                self.registry.accept_invite(session_id, player_id, &name)?;
                self.announce_join(session_id, player_id, name);
            }
            ClientMessage::InviteDecline { session_id } => {
                let outcome = self.registry.decline_invite(session_id, player_id)?;
                self.send(
                    outcome.inviter,
                    ServerMessage::InviteDeclined {
                        session_id,
                        decliner_name: self.display_name(player_id),
                    },
                );
                if outcome.discarded {
                    self.broadcast_lobby();
                }
            }
            ClientMessage::Handshake { .. } | ClientMessage::Heartbeat { .. } => {
                // Answered by the connection handler; never routed here.
                debug!(%player_id, "connection-level message reached the engine");
            }
        }
        Ok(())
    }

    /// Removes the player from one session on their behalf (disconnect).
    pub(crate) fn leave(&mut self, player_id: PlayerId, session_id: SessionId) {
        match self.registry.leave_session(session_id, player_id) {
            Ok(outcome) => self.announce_leave(session_id, player_id, outcome),
            Err(e) => debug!(%player_id, %session_id, error = %e, "leave ignored"),
        }
    }

    /// Tells whoever is left that `player_id` is gone.
    fn announce_leave(&self, session_id: SessionId, player_id: PlayerId, outcome: LeaveOutcome) {
        match outcome {
            LeaveOutcome::Deleted => {}
            LeaveOutcome::Left { remaining } => {
                self.send_all(
                    &remaining,
                    &ServerMessage::PlayerLeft {
                        session_id,
                        player_id,
                    },
                );
            }
            LeaveOutcome::Forfeited { remaining, result } => {
                self.send_all(
                    &remaining,
                    &ServerMessage::PlayerLeft {
                        session_id,
                        player_id,
                    },
                );
                self.send_game_over(session_id, &remaining, result);
            }
        }
        self.broadcast_lobby();
    }

    fn invite(
        &mut self,
        inviter: PlayerId,
        target: PlayerId,
        game_type: &str,
    ) -> Result<(), ArcadeError> {
        if !self.presence.is_online(target) {
            return Err(PresenceError::NotFound(target).into());
        }
        let inviter_name = self.display_name(inviter);
        let created = self
            .registry
            .create_invite(inviter, &inviter_name, target, game_type)?;
        let game_type = created.game_type;

        self.send(
            inviter,
            ServerMessage::InviteSent {
                session_id: created.session_id,
                game_type,
            },
        );
        self.send(
            target,
            ServerMessage::Invited {
                session_id: created.session_id,
                game_type,
                inviter_id: inviter,
                inviter_name,
                label: game_type.label().to_owned(),
            },
        );
        self.broadcast_lobby();
        Ok(())
    }

    /// Draw & Guess strokes are relayed from the current drawer to the
    /// rest of the session. Anything else is dropped without a reply.
    fn relay_stroke(&self, player_id: PlayerId, session_id: SessionId, stroke: Value) {
        let is_drawing = self.registry.session(session_id).is_some_and(|s| {
            s.game_type() == GameType::DrawAndGuess && s.current_drawer() == Some(player_id)
        });
        if !is_drawing {
            debug!(%player_id, %session_id, "stroke from non-drawer dropped");
            return;
        }
        let others: Vec<PlayerId> = self
            .members(session_id)
            .into_iter()
            .filter(|&p| p != player_id)
            .collect();
        self.send_all(&others, &ServerMessage::DrawStroke { session_id, stroke });
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    pub(crate) fn on_timer(&mut self, expired: Expired<RegistryTimer>) {
        match self.registry.handle_timer(expired) {
            None | Some(TimerOutcome::Purged(_)) => {}
            Some(TimerOutcome::Phase(phase)) => self.on_phase(phase),
            Some(TimerOutcome::InviteExpired(expired)) => {
                if expired.discarded {
                    self.broadcast_lobby();
                }
            }
        }
    }

    fn on_phase(&mut self, phase: PhaseOutcome) {
        let PhaseOutcome {
            session_id,
            event,
            next_unit,
            finished,
        } = phase;
        if let Some(event) = event {
            self.send_state(session_id, event);
        }
        if next_unit {
            self.send_drawer_info(session_id);
        }
        if let Some(result) = finished {
            let members = self.members(session_id);
            self.send_game_over(session_id, &members, result);
        }
    }

    // -----------------------------------------------------------------------
    // Fan-out helpers
    // -----------------------------------------------------------------------

    fn members(&self, session_id: SessionId) -> Vec<PlayerId> {
        self.registry
            .session(session_id)
            .map(|s| s.player_ids())
            .unwrap_or_default()
    }

    fn display_name(&self, player_id: PlayerId) -> String {
        self.presence
            .display_name(player_id)
            .map_or_else(|| player_id.to_string(), str::to_owned)
    }

    fn announce_join(&self, session_id: SessionId, player_id: PlayerId, display_name: String) {
        if let Some(session) = self.registry.view(session_id, player_id) {
            self.send(player_id, ServerMessage::Joined { session });
        }
        let others: Vec<PlayerId> = self
            .members(session_id)
            .into_iter()
            .filter(|&p| p != player_id)
            .collect();
        self.send_all(
            &others,
            &ServerMessage::PlayerJoined {
                session_id,
                player_id,
                display_name,
            },
        );
        self.broadcast_lobby();
    }

    /// One `stateUpdate` per member, each carrying that member's view.
    fn send_state(&self, session_id: SessionId, event: Value) {
        for member in self.members(session_id) {
            let state = self
                .registry
                .view(session_id, member)
                .and_then(|view| view.state);
            self.send(
                member,
                ServerMessage::StateUpdate {
                    session_id,
                    state,
                    event: event.clone(),
                },
            );
        }
    }

    fn send_drawer_info(&self, session_id: SessionId) {
        if let Some((drawer, word_choices)) = self.registry.drawer_info(session_id) {
            self.send(
                drawer,
                ServerMessage::DrawerInfo {
                    session_id,
                    word_choices,
                },
            );
        }
    }

    fn send_game_over(&self, session_id: SessionId, players: &[PlayerId], result: GameResult) {
        let GameResult {
            scores,
            winner,
            reason,
        } = result;
        self.send_all(
            players,
            &ServerMessage::GameOver {
                session_id,
                scores,
                winner,
                reason,
            },
        );
        self.broadcast_lobby();
    }
}
