//! Targeted invites backed by placeholder sessions.
//!
//! An invite creates a waiting session hosted by the inviter and records
//! who may accept it. The invite and its placeholder share one fate: when
//! the invite is declined, superseded, or expires, the placeholder goes
//! too unless someone else has already sat down in it.

use arcade_protocol::{GameType, PlayerId, SessionId, SessionStatus};
use arcade_scheduler::{PendingTimer, TimerId};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::registry::parse_game_type;
use crate::{
    DeclineOutcome, InviteCreated, InviteExpired, Registry, RegistryError, RegistryTimer, Session,
};

/// A pending invitation from `inviter` to `target`.
#[derive(Debug)]
pub struct Invite {
    pub inviter: PlayerId,
    pub target: PlayerId,
    pub session_id: SessionId,
    pub game_type: GameType,
    pub expires_at: Instant,
    pub(crate) timer: PendingTimer,
}

impl Registry {
    /// Invites `target` to a new game of `game_type` hosted by `inviter`.
    ///
    /// An earlier invite between the same pair is cancelled first.
    ///
    /// # Errors
    /// `SelfInvite`, `UnknownGameType`.
    pub fn create_invite(
        &mut self,
        inviter: PlayerId,
        inviter_name: &str,
        target: PlayerId,
        game_type: &str,
    ) -> Result<InviteCreated, RegistryError> {
        if inviter == target {
            return Err(RegistryError::SelfInvite);
        }
        let game_type = parse_game_type(game_type)?;

        let superseded = self.invites.remove(&(inviter, target)).and_then(|old| {
            debug!(%inviter, %target, session_id = %old.session_id, "invite superseded");
            self.discard_placeholder(old.session_id, inviter)
                .then_some(old.session_id)
        });

        let session_id = self.insert_session(inviter, inviter_name, game_type, None);
        let timer = self
            .scheduler
            .schedule(self.config.invite_ttl, RegistryTimer::InviteExpiry { inviter, target });
        let invite = Invite {
            inviter,
            target,
            session_id,
            game_type,
            expires_at: timer.deadline(),
            timer,
        };
        self.invites.insert((inviter, target), invite);
        info!(%inviter, %target, %session_id, %game_type, "invite created");

        Ok(InviteCreated {
            session_id,
            game_type,
            superseded,
        })
    }

    /// The invite backed by `session_id`, if one is pending.
    pub fn invite_for(&self, session_id: SessionId) -> Option<&Invite> {
        self.invites.values().find(|i| i.session_id == session_id)
    }

    /// Accepts an invite: clears it and seats the target in its session.
    ///
    /// # Errors
    /// `InviteNotFound`, `NotInvited`, or any [`join_session`] error.
    ///
    /// [`join_session`]: Registry::join_session
    pub fn accept_invite(
        &mut self,
        session_id: SessionId,
        player_id: PlayerId,
        display_name: &str,
    ) -> Result<&Session, RegistryError> {
        let invite = self.take_invite(session_id, player_id)?;
        info!(inviter = %invite.inviter, target = %player_id, %session_id, "invite accepted");
        self.join_session(session_id, player_id, display_name)
    }

    /// Declines an invite, discarding its placeholder session.
    ///
    /// # Errors
    /// `InviteNotFound`, `NotInvited`.
    pub fn decline_invite(
        &mut self,
        session_id: SessionId,
        player_id: PlayerId,
    ) -> Result<DeclineOutcome, RegistryError> {
        let invite = self.take_invite(session_id, player_id)?;
        let discarded = self.discard_placeholder(session_id, invite.inviter);
        info!(inviter = %invite.inviter, target = %player_id, %session_id, "invite declined");
        Ok(DeclineOutcome {
            inviter: invite.inviter,
            discarded,
        })
    }

    pub(crate) fn on_invite_expiry(
        &mut self,
        inviter: PlayerId,
        target: PlayerId,
        timer_id: TimerId,
    ) -> Option<InviteExpired> {
        let key = (inviter, target);
        if !self.invites.get(&key).is_some_and(|i| i.timer.id() == timer_id) {
            debug!(%inviter, %target, "stale invite timer ignored");
            return None;
        }
        let invite = self.invites.remove(&key)?;
        let discarded = self.discard_placeholder(invite.session_id, inviter);
        info!(%inviter, %target, session_id = %invite.session_id, discarded, "invite expired");
        Some(InviteExpired {
            session_id: invite.session_id,
            inviter,
            target,
            discarded,
        })
    }

    /// Removes the invite for `session_id` if `player_id` is its target.
    fn take_invite(
        &mut self,
        session_id: SessionId,
        player_id: PlayerId,
    ) -> Result<Invite, RegistryError> {
        let key = self
            .invites
            .iter()
            .find(|(_, i)| i.session_id == session_id)
            .map(|(key, _)| *key)
            .ok_or(RegistryError::InviteNotFound(session_id))?;
        if key.1 != player_id {
            return Err(RegistryError::NotInvited(session_id));
        }
        self.invites
            .remove(&key)
            .ok_or(RegistryError::InviteNotFound(session_id))
    }

    /// Deletes an invite's placeholder if the inviter is still alone in
    /// it and it has not started.
    fn discard_placeholder(&mut self, session_id: SessionId, inviter: PlayerId) -> bool {
        let unjoined = self.sessions.get(&session_id).is_some_and(|s| {
            s.status == SessionStatus::Waiting && s.player_ids() == [inviter]
        });
        if unjoined {
            self.remove_session(session_id);
        }
        unjoined
    }
}
