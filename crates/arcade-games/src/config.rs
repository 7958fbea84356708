//! Per-game configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Player limits and phase timings for one game type.
///
/// Each [`GameLogic`](crate::GameLogic) implementation returns its own
/// values from `game_config()`; the registry reads them at session
/// creation (capacity) and whenever it arms a phase timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Minimum players required before the ready check can start a game.
    pub min_players: usize,

    /// Maximum players a session of this type may hold.
    pub max_players: usize,

    /// Deadline for one unit of play (a turn, round, or question).
    /// `None` for games that only move when a player acts.
    pub turn_duration: Option<Duration>,

    /// How long a revealed answer stays on screen before the next unit.
    pub reveal_delay: Option<Duration>,

    /// Pause between a decided round and the next one.
    pub advance_delay: Option<Duration>,
}

impl GameConfig {
    /// Resolves a requested capacity against this game's limits.
    ///
    /// No request means the maximum; anything else is clamped into
    /// `[min_players, max_players]`.
    pub fn capacity(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.max_players)
            .clamp(self.min_players, self.max_players)
    }

    /// Returns `true` if the game has a server-driven deadline.
    pub fn is_timed(&self) -> bool {
        self.turn_duration.is_some()
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 2,
            turn_duration: None,
            reveal_delay: None,
            advance_delay: None,
        }
    }
}
