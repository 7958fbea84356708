//! One live session: its players, status, game state, and timers.

use std::collections::BTreeMap;
use std::time::Duration;

use arcade_games::{GameConfig, GameState, config_for};
use arcade_protocol::{
    GameType, PlayerId, PlayerView, ScoreEntry, Scoreboard, SessionId, SessionStatus,
    SessionSummary, SessionView,
};
use arcade_scheduler::{PendingTimer, Scheduler, SessionTimers, TimerSlot};
use tokio::time::Instant;

use crate::RegistryTimer;

/// A seat in a session. Order in [`Session::players`] is join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlayer {
    pub player_id: PlayerId,
    pub display_name: String,
    pub ready: bool,
    /// Mirrors the game's standings after every committed transition.
    pub score: u32,
}

impl SessionPlayer {
    pub(crate) fn new(player_id: PlayerId, display_name: &str) -> Self {
        Self {
            player_id,
            display_name: display_name.to_owned(),
            ready: false,
            score: 0,
        }
    }
}

/// A single mini-game instance among a fixed set of players.
#[derive(Debug)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) game_type: GameType,
    pub(crate) status: SessionStatus,
    pub(crate) host_id: PlayerId,
    pub(crate) config: GameConfig,
    /// Clamped capacity; immutable after creation.
    pub(crate) max_players: usize,
    pub(crate) players: Vec<SessionPlayer>,
    pub(crate) state: Option<GameState>,
    pub(crate) last_activity: Instant,
    /// When the current turn, round, or question began.
    pub(crate) phase_started_at: Instant,
    pub(crate) timers: SessionTimers,
    /// Grace-period removal after finishing. Not one of the phase slots.
    pub(crate) purge: Option<PendingTimer>,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        game_type: GameType,
        host_id: PlayerId,
        host_name: &str,
        requested_capacity: Option<usize>,
    ) -> Self {
        let config = config_for(game_type);
        let now = Instant::now();
        Self {
            id,
            game_type,
            status: SessionStatus::Waiting,
            host_id,
            max_players: config.capacity(requested_capacity),
            config,
            players: vec![SessionPlayer::new(host_id, host_name)],
            state: None,
            last_activity: now,
            phase_started_at: now,
            timers: SessionTimers::new(),
            purge: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn min_players(&self) -> usize {
        self.config.min_players
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn players(&self) -> &[SessionPlayer] {
        &self.players
    }

    /// The unredacted game state. Never send this to a client; use
    /// [`view`](Self::view).
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub fn timers(&self) -> &SessionTimers {
        &self.timers
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.player_id == player_id)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.player_id).collect()
    }

    pub fn host_name(&self) -> &str {
        self.players
            .iter()
            .find(|p| p.player_id == self.host_id)
            .map_or("", |p| p.display_name.as_str())
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// Every seat is ready and there are enough of them to start.
    pub fn has_ready_quorum(&self) -> bool {
        self.players.len() >= self.config.min_players && self.players.iter().all(|p| p.ready)
    }

    /// The player currently drawing, for a running draw-and-guess game.
    pub fn current_drawer(&self) -> Option<PlayerId> {
        if self.status != SessionStatus::Playing {
            return None;
        }
        self.state.as_ref()?.current_drawer()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            game_type: self.game_type,
            host_name: self.host_name().to_owned(),
            player_count: self.players.len(),
            max_players: self.max_players,
            status: self.status,
        }
    }

    /// The session as `viewer` may see it, with hidden game information
    /// stripped.
    pub fn view(&self, viewer: PlayerId) -> SessionView {
        SessionView {
            id: self.id,
            game_type: self.game_type,
            status: self.status,
            host_id: self.host_id,
            host_name: self.host_name().to_owned(),
            min_players: self.config.min_players,
            max_players: self.max_players,
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    player_id: p.player_id,
                    display_name: p.display_name.clone(),
                    ready: p.ready,
                    score: p.score,
                })
                .collect(),
            state: self.state.as_ref().map(|s| s.view_for(viewer)),
        }
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.players
            .iter()
            .map(|p| {
                let entry = ScoreEntry {
                    display_name: p.display_name.clone(),
                    score: p.score,
                };
                (p.player_id, entry)
            })
            .collect()
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub(crate) fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    pub(crate) fn sync_scores(&mut self) {
        let standings: BTreeMap<PlayerId, u32> = match &self.state {
            Some(state) => state.standings(),
            None => return,
        };
        for p in &mut self.players {
            p.score = standings.get(&p.player_id).copied().unwrap_or(0);
        }
    }

    /// Arms `slot` for `delay` if the game has one configured.
    pub(crate) fn arm(
        &mut self,
        slot: TimerSlot,
        delay: Option<Duration>,
        scheduler: &mut Scheduler<RegistryTimer>,
    ) {
        if let Some(delay) = delay {
            let event = RegistryTimer::Phase {
                session_id: self.id,
                slot,
            };
            self.timers.arm(slot, scheduler.schedule(delay, event));
        }
    }

    /// Starts the clock for a new turn, round, or question.
    pub(crate) fn begin_phase(&mut self, scheduler: &mut Scheduler<RegistryTimer>) {
        self.phase_started_at = Instant::now();
        let turn = self.config.turn_duration;
        self.arm(TimerSlot::Turn, turn, scheduler);
    }
}
