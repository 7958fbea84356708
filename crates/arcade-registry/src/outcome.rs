//! What registry operations report back to their caller.
//!
//! Outcomes carry just enough for the owner to address its broadcasts;
//! the full per-viewer session picture is always re-read through
//! [`Registry::view`](crate::Registry::view).

use arcade_protocol::{FinishReason, GameType, PlayerId, Scoreboard, SessionId, Winner};
use serde_json::Value;

/// Final result of a session, produced exactly once at finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub scores: Scoreboard,
    pub winner: Option<Winner>,
    pub reason: FinishReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The last player left; the session no longer exists.
    Deleted,
    /// The player left and the session carries on without them.
    Left { remaining: Vec<PlayerId> },
    /// The player left mid-game and the remaining players won by forfeit.
    Forfeited {
        remaining: Vec<PlayerId>,
        result: GameResult,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Marked ready; still waiting on other players.
    Waiting,
    /// This ready completed the quorum and the game is now running.
    Started,
}

/// An accepted game action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub event: Value,
    /// Present when the action ended the game.
    pub finished: Option<GameResult>,
}

/// A phase change forced by a timer.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    pub session_id: SessionId,
    /// The game's event, absent when the game simply ran out of rounds.
    pub event: Option<Value>,
    /// A new turn, round, or question began.
    pub next_unit: bool,
    pub finished: Option<GameResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteCreated {
    pub session_id: SessionId,
    pub game_type: GameType,
    /// Placeholder session of an earlier invite to the same target that
    /// this one replaced and discarded.
    pub superseded: Option<SessionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclineOutcome {
    pub inviter: PlayerId,
    /// The placeholder session was removed along with the invite.
    pub discarded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InviteExpired {
    pub session_id: SessionId,
    pub inviter: PlayerId,
    pub target: PlayerId,
    pub discarded: bool,
}

/// Result of feeding one scheduler expiry to the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerOutcome {
    Phase(PhaseOutcome),
    Purged(SessionId),
    InviteExpired(InviteExpired),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictedSession {
    pub session_id: SessionId,
    pub players: Vec<PlayerId>,
}
