//! The registry: session map and lifecycle operations.

use std::collections::{BTreeMap, HashMap};

use arcade_games::{ActionContext, GameState};
use arcade_protocol::{
    FinishReason, GameType, PlayerId, SessionId, SessionStatus, SessionSummary, SessionView,
    Winner,
};
use arcade_scheduler::{Expired, Scheduler};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::session::SessionPlayer;
use crate::{
    ActionOutcome, EvictedSession, Invite, LeaveOutcome, ReadyOutcome, RegistryConfig,
    RegistryError, RegistryTimer, Session,
};

/// Owns every live session.
///
/// # Lifecycle
///
/// ```text
/// create_session() ──→ join_session() ──→ set_ready() ──→ apply_action() ──→ (game over)
///        │                   │                 │                │                 │
///        ▼                   ▼                 ▼                ▼                 ▼
///    [Waiting]           [Waiting]         [Playing]        [Playing]        [Finished]
///                                                                                 │
///                                                     handle_timer(Purge) ──→ removed
/// ```
///
/// All methods are synchronous. Methods that arm timers must run inside
/// a Tokio runtime.
pub struct Registry {
    pub(crate) sessions: BTreeMap<SessionId, Session>,
    /// Active invites keyed by `(inviter, target)`.
    pub(crate) invites: HashMap<(PlayerId, PlayerId), Invite>,
    next_id: u64,
    pub(crate) rng: StdRng,
    pub(crate) scheduler: Scheduler<RegistryTimer>,
    pub(crate) config: RegistryConfig,
}

impl Registry {
    /// Creates an empty registry seeded from the OS.
    ///
    /// Returns the registry and the channel its timer expiries arrive on.
    /// Feed every expiry back through [`handle_timer`](Self::handle_timer).
    pub fn new(config: RegistryConfig) -> (Self, mpsc::UnboundedReceiver<Expired<RegistryTimer>>) {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Like [`new`](Self::new) with a caller-supplied RNG, so question,
    /// word, and drawer selection can be reproduced in tests.
    pub fn with_rng(
        config: RegistryConfig,
        rng: StdRng,
    ) -> (Self, mpsc::UnboundedReceiver<Expired<RegistryTimer>>) {
        let (scheduler, expiries) = Scheduler::new();
        let registry = Self {
            sessions: BTreeMap::new(),
            invites: HashMap::new(),
            next_id: 1,
            rng,
            scheduler,
            config,
        };
        (registry, expiries)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// The session as `viewer` may see it.
    pub fn view(&self, id: SessionId, viewer: PlayerId) -> Option<SessionView> {
        self.sessions.get(&id).map(|s| s.view(viewer))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Lobby listing: every session that has not finished.
    pub fn list_open_sessions(&self) -> Vec<SessionSummary> {
        self.sessions
            .values()
            .filter(|s| !s.status.is_finished())
            .map(Session::summary)
            .collect()
    }

    /// Non-finished sessions `player_id` occupies.
    pub fn sessions_for(&self, player_id: PlayerId) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|s| !s.status.is_finished() && s.contains(player_id))
            .map(|s| s.id)
            .collect()
    }

    pub fn current_drawer(&self, id: SessionId) -> Option<PlayerId> {
        self.sessions.get(&id)?.current_drawer()
    }

    /// The current drawer and the word choices only they may see.
    pub fn drawer_info(&self, id: SessionId) -> Option<(PlayerId, Vec<String>)> {
        let session = self.sessions.get(&id)?;
        let drawer = session.current_drawer()?;
        let choices = session.state.as_ref()?.drawer_choices()?;
        Some((drawer, choices))
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Opens a new waiting session with `creator` as host and only player.
    ///
    /// `requested_capacity` is clamped into the game's player range.
    ///
    /// # Errors
    /// [`RegistryError::UnknownGameType`] if `game_type` names no game.
    pub fn create_session(
        &mut self,
        creator: PlayerId,
        display_name: &str,
        game_type: &str,
        requested_capacity: Option<usize>,
    ) -> Result<&Session, RegistryError> {
        let game_type = parse_game_type(game_type)?;
        let id = self.insert_session(creator, display_name, game_type, requested_capacity);
        self.sessions.get(&id).ok_or(RegistryError::NotFound(id))
    }

    pub(crate) fn insert_session(
        &mut self,
        creator: PlayerId,
        display_name: &str,
        game_type: GameType,
        requested_capacity: Option<usize>,
    ) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let session = Session::new(id, game_type, creator, display_name, requested_capacity);
        info!(
            session_id = %id,
            host = %creator,
            %game_type,
            max_players = session.max_players,
            "session created"
        );
        self.sessions.insert(id, session);
        id
    }

    /// Seats `player_id` in a waiting session.
    ///
    /// # Errors
    /// `NotFound`, `AlreadyStarted`, `Finished`, `AlreadyJoined`, `Full`.
    pub fn join_session(
        &mut self,
        id: SessionId,
        player_id: PlayerId,
        display_name: &str,
    ) -> Result<&Session, RegistryError> {
        let session = self.sessions.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        match session.status {
            SessionStatus::Waiting => {}
            SessionStatus::Playing => return Err(RegistryError::AlreadyStarted(id)),
            SessionStatus::Finished => return Err(RegistryError::Finished(id)),
        }
        if session.contains(player_id) {
            return Err(RegistryError::AlreadyJoined(id));
        }
        if session.is_full() {
            return Err(RegistryError::Full(id));
        }

        session.players.push(SessionPlayer::new(player_id, display_name));
        session.touch();
        info!(
            session_id = %id,
            %player_id,
            players = session.players.len(),
            "player joined"
        );
        Ok(session)
    }

    /// Removes `player_id` from a session.
    ///
    /// The last player out deletes the session. Leaving a running game
    /// hands the win to the remaining players by forfeit.
    ///
    /// # Errors
    /// `NotFound`, `NotAPlayer`.
    pub fn leave_session(
        &mut self,
        id: SessionId,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, RegistryError> {
        let session = self.sessions.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        let seat = session
            .players
            .iter()
            .position(|p| p.player_id == player_id)
            .ok_or(RegistryError::NotAPlayer(id))?;

        let was_playing = session.status == SessionStatus::Playing;
        session.players.remove(seat);
        info!(session_id = %id, %player_id, players = session.players.len(), "player left");

        let Some(first) = session.players.first().map(|p| p.player_id) else {
            self.remove_session(id);
            info!(session_id = %id, "session deleted, no players left");
            return Ok(LeaveOutcome::Deleted);
        };

        if session.host_id == player_id {
            session.host_id = first;
            debug!(session_id = %id, host = %first, "host reassigned");
        }
        let remaining = session.player_ids();

        if was_playing {
            for p in &mut session.players {
                p.score = 1;
            }
            let grace = self.config.finished_grace;
            let result = session.finish(
                Some(Winner::Player(first)),
                FinishReason::PlayerLeft,
                &mut self.scheduler,
                grace,
            );
            return Ok(LeaveOutcome::Forfeited { remaining, result });
        }

        session.touch();
        Ok(LeaveOutcome::Left { remaining })
    }

    /// Marks `player_id` ready. When every seated player is ready and the
    /// minimum is met, the game starts and its first deadline is armed.
    ///
    /// # Errors
    /// `NotFound`, `AlreadyStarted`, `Finished`, `NotAPlayer`.
    pub fn set_ready(
        &mut self,
        id: SessionId,
        player_id: PlayerId,
    ) -> Result<ReadyOutcome, RegistryError> {
        let session = self.sessions.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        match session.status {
            SessionStatus::Waiting => {}
            SessionStatus::Playing => return Err(RegistryError::AlreadyStarted(id)),
            SessionStatus::Finished => return Err(RegistryError::Finished(id)),
        }
        let seat = session
            .players
            .iter_mut()
            .find(|p| p.player_id == player_id)
            .ok_or(RegistryError::NotAPlayer(id))?;
        seat.ready = true;
        session.touch();

        if !session.has_ready_quorum() {
            debug!(session_id = %id, %player_id, "player ready");
            return Ok(ReadyOutcome::Waiting);
        }

        let players = session.player_ids();
        session.state = Some(GameState::start(session.game_type, &players, &mut self.rng));
        session.status = SessionStatus::Playing;
        session.sync_scores();
        session.begin_phase(&mut self.scheduler);
        info!(
            session_id = %id,
            game_type = %session.game_type,
            players = players.len(),
            "game started"
        );
        Ok(ReadyOutcome::Started)
    }

    /// Hands a player action to the game's rules and commits the result.
    ///
    /// # Errors
    /// `NotFound`, `NotActive`, `Finished`, `NotAPlayer`, or the game's
    /// own rejection wrapped in [`RegistryError::Logic`]. A rejected
    /// action leaves the session untouched.
    pub fn apply_action(
        &mut self,
        id: SessionId,
        player_id: PlayerId,
        action_type: &str,
        data: Value,
    ) -> Result<ActionOutcome, RegistryError> {
        let session = self.sessions.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        match session.status {
            SessionStatus::Playing => {}
            SessionStatus::Waiting => return Err(RegistryError::NotActive(id)),
            SessionStatus::Finished => return Err(RegistryError::Finished(id)),
        }
        if !session.contains(player_id) {
            return Err(RegistryError::NotAPlayer(id));
        }
        let state = session.state.as_ref().ok_or(RegistryError::NotActive(id))?;

        let ctx = ActionContext::new(session.phase_started_at.elapsed());
        let transition = state.apply(player_id, action_type, data, &ctx).inspect_err(|e| {
            debug!(session_id = %id, %player_id, action_type, error = %e, "action rejected");
        })?;

        session.touch();
        let grace = self.config.finished_grace;
        let (event, finished) = session.commit(transition, &mut self.scheduler, grace);
        Ok(ActionOutcome { event, finished })
    }

    // -----------------------------------------------------------------------
    // Cleanup
    // -----------------------------------------------------------------------

    /// Deletes every unfinished session idle longer than the configured
    /// timeout. Call every [`RegistryConfig::sweep_interval`].
    pub fn evict_stale(&mut self) -> Vec<EvictedSession> {
        let now = Instant::now();
        let idle_timeout = self.config.idle_timeout;
        let stale: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| !s.status.is_finished() && s.idle_for(now) > idle_timeout)
            .map(|s| s.id)
            .collect();

        stale
            .into_iter()
            .filter_map(|id| self.remove_session(id))
            .map(|session| {
                info!(session_id = %session.id, "stale session evicted");
                EvictedSession {
                    session_id: session.id,
                    players: session.player_ids(),
                }
            })
            .collect()
    }

    /// Drops a session together with its timers and any invite backed by
    /// it.
    pub(crate) fn remove_session(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        self.invites.retain(|_, invite| invite.session_id != id);
        Some(session)
    }
}

pub(crate) fn parse_game_type(raw: &str) -> Result<GameType, RegistryError> {
    raw.parse()
        .map_err(|_| RegistryError::UnknownGameType(raw.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: PlayerId = PlayerId(1);
    const GUEST: PlayerId = PlayerId(2);

    fn registry() -> Registry {
        Registry::with_rng(RegistryConfig::default(), StdRng::seed_from_u64(5)).0
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut reg = registry();
        let a = reg.create_session(HOST, "h", "ticTacToe", None).unwrap().id();
        reg.leave_session(a, HOST).unwrap();
        let b = reg.create_session(HOST, "h", "ticTacToe", None).unwrap().id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unknown_game_type() {
        let err = registry()
            .create_session(HOST, "h", "chess", None)
            .map(|s| s.id())
            .unwrap_err();
        assert_eq!(err, RegistryError::UnknownGameType("chess".into()));
    }

    #[test]
    fn test_leave_waiting_session_reassigns_host() {
        let mut reg = registry();
        let id = reg.create_session(HOST, "h", "triviaQuiz", None).unwrap().id();
        reg.join_session(id, GUEST, "g").unwrap();

        let outcome = reg.leave_session(id, HOST).unwrap();
        assert_eq!(outcome, LeaveOutcome::Left { remaining: vec![GUEST] });
        let session = reg.session(id).unwrap();
        assert_eq!(session.host_id(), GUEST);
        assert_eq!(session.host_name(), "g");
    }

    #[test]
    fn test_last_leaver_deletes() {
        let mut reg = registry();
        let id = reg.create_session(HOST, "h", "rps", None).unwrap().id();
        assert_eq!(reg.leave_session(id, HOST).unwrap(), LeaveOutcome::Deleted);
        assert!(reg.session(id).is_none());
        assert_eq!(reg.leave_session(id, HOST), Err(RegistryError::NotFound(id)));
    }

    #[test]
    fn test_action_before_start_is_not_active() {
        let mut reg = registry();
        let id = reg.create_session(HOST, "h", "ticTacToe", None).unwrap().id();
        let err = reg
            .apply_action(id, HOST, "place", serde_json::json!({ "cellIndex": 0 }))
            .unwrap_err();
        assert_eq!(err.tag(), "NotActive");
    }

    #[test]
    fn test_sessions_for_player() {
        let mut reg = registry();
        let a = reg.create_session(HOST, "h", "rps", None).unwrap().id();
        let b = reg.create_session(GUEST, "g", "rps", None).unwrap().id();
        reg.join_session(b, HOST, "h").unwrap();
        assert_eq!(reg.sessions_for(HOST), vec![a, b]);
        assert_eq!(reg.sessions_for(GUEST), vec![b]);
    }
}
