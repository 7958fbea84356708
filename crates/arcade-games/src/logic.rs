//! The `GameLogic` trait: the contract every mini-game implements.
//!
//! A game is a set of associated functions over an owned state value. The
//! registry calls them at the right moments (ready quorum, player action,
//! phase deadline, advance delay) and commits whatever state comes back.
//! Nothing here mutates its input: every accepted transition returns a new
//! state.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use arcade_protocol::{PlayerId, Winner};
use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{GameConfig, LogicError};

/// Facts about the moment an action is applied.
///
/// `elapsed` is measured from the start of the current unit of play
/// (turn, round, or question). The registry computes it from its own
/// clock so the rules stay free of wall-clock reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionContext {
    pub elapsed: Duration,
}

impl ActionContext {
    pub fn new(elapsed: Duration) -> Self {
        Self { elapsed }
    }
}

/// What the registry must schedule after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Nothing changes in the schedule.
    None,
    /// The timed phase ended early or on its deadline. Cancel the turn
    /// deadline and advance after the reveal delay.
    Reveal,
    /// A round was decided. Cancel the turn deadline and advance after
    /// the advance delay.
    Advance,
}

/// The result of an accepted action or an expired deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S, E> {
    /// The new state, replacing the old one wholesale.
    pub state: S,
    /// Display-oriented description of what just happened.
    pub event: E,
    /// `Some` when this transition ends the game.
    pub game_over: Option<Winner>,
    pub follow_up: FollowUp,
}

impl<S, E> Transition<S, E> {
    pub fn new(state: S, event: E) -> Self {
        Self {
            state,
            event,
            game_over: None,
            follow_up: FollowUp::None,
        }
    }

    pub fn then(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = follow_up;
        self
    }

    pub fn finished(mut self, winner: Winner) -> Self {
        self.game_over = Some(winner);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.game_over.is_some()
    }

    /// Converts the state and event types, keeping the outcome.
    pub fn map<T, F>(
        self,
        state: impl FnOnce(S) -> T,
        event: impl FnOnce(E) -> F,
    ) -> Transition<T, F> {
        Transition {
            state: state(self.state),
            event: event(self.event),
            game_over: self.game_over,
            follow_up: self.follow_up,
        }
    }
}

/// The result of moving to the next unit of play.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance<S, E> {
    /// The next turn, round, or question has started.
    Next { state: S, event: E },
    /// Nothing is left to play.
    Finished(Winner),
}

impl<S, E> Advance<S, E> {
    pub fn map<T, F>(
        self,
        state: impl FnOnce(S) -> T,
        event: impl FnOnce(E) -> F,
    ) -> Advance<T, F> {
        match self {
            Self::Next { state: s, event: e } => Advance::Next {
                state: state(s),
                event: event(e),
            },
            Self::Finished(winner) => Advance::Finished(winner),
        }
    }
}

/// The core trait each mini-game implements.
///
/// Associated types:
/// - `State`: the full game state, serializable for snapshots
/// - `Action`: the closed set of moves a player can make
/// - `Event`: one-shot descriptions broadcast with each state update
///
/// Only `init`, `apply`, `standings` and `game_config` are required.
/// Server-paced games additionally override `begin`, `on_deadline`,
/// `advance`, and `redact` when they carry hidden information.
pub trait GameLogic {
    type State: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static;
    type Action: DeserializeOwned + Debug;
    type Event: Clone + Debug + PartialEq + Serialize;

    /// Player limits and phase timings for this game.
    fn game_config() -> GameConfig;

    /// Builds the initial state from the players in join order.
    fn init<R: Rng + ?Sized>(players: &[PlayerId], rng: &mut R) -> Self::State;

    /// Moves a freshly initialized state into its first unit of play.
    fn begin<R: Rng + ?Sized>(state: Self::State, _rng: &mut R) -> Self::State {
        state
    }

    /// Validates and applies one player action.
    ///
    /// # Errors
    /// Returns the [`LogicError`] describing why the action was refused.
    fn apply(
        state: &Self::State,
        actor: PlayerId,
        action: Self::Action,
        ctx: &ActionContext,
    ) -> Result<Transition<Self::State, Self::Event>, LogicError>;

    /// Called when the turn deadline expires. `None` means the deadline
    /// no longer applies to the current phase.
    fn on_deadline(
        _state: &Self::State,
        _ctx: &ActionContext,
    ) -> Option<Transition<Self::State, Self::Event>> {
        None
    }

    /// Called after a reveal or advance delay. `None` means the state is
    /// not waiting to advance.
    fn advance<R: Rng + ?Sized>(
        _state: &Self::State,
        _rng: &mut R,
    ) -> Option<Advance<Self::State, Self::Event>> {
        None
    }

    /// Current score per player.
    fn standings(state: &Self::State) -> BTreeMap<PlayerId, u32>;

    /// The state as `viewer` is allowed to see it.
    fn redact(state: &Self::State, _viewer: PlayerId) -> Self::State {
        state.clone()
    }

    /// The player currently drawing, for games that have one.
    fn current_drawer(_state: &Self::State) -> Option<PlayerId> {
        None
    }

    /// The secret choices offered to the current drawer.
    fn drawer_choices(_state: &Self::State) -> Option<Vec<String>> {
        None
    }
}

/// Parses a wire action into a game's typed action.
///
/// The action verb and its payload travel as separate fields; they are
/// joined into an adjacently tagged value so each game's `Action` enum can
/// use `#[serde(tag = "type", content = "data")]`.
///
/// # Errors
/// Returns [`LogicError::MalformedAction`] for an unknown verb or a
/// payload of the wrong shape.
pub fn parse_action<A: DeserializeOwned>(action_type: &str, data: Value) -> Result<A, LogicError> {
    let tagged = serde_json::json!({ "type": action_type, "data": data });
    serde_json::from_value(tagged).map_err(|e| LogicError::MalformedAction(e.to_string()))
}

/// The highest scorer, ties going to the earliest joiner.
pub fn top_scorer(players: &[PlayerId], scores: &BTreeMap<PlayerId, u32>) -> Winner {
    let mut best: Option<(PlayerId, u32)> = None;
    for &player in players {
        let score = scores.get(&player).copied().unwrap_or(0);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((player, score));
        }
    }
    best.map_or(Winner::Draw, |(player, _)| Winner::Player(player))
}

/// `100 + round(50 × fraction_left)`, with the fraction floored at zero.
pub(crate) fn speed_points(elapsed: Duration, window: Duration) -> u32 {
    let left = 1.0 - elapsed.as_secs_f64() / window.as_secs_f64();
    100 + (50.0 * left).round().max(0.0) as u32
}
