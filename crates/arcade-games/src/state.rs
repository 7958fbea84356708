//! Type-erased game state used by the registry.
//!
//! The registry holds sessions of all six game types in one map, so it
//! needs a single state type. [`GameState`] wraps each game's own state
//! and forwards every call to the matching [`GameLogic`] impl. Actions
//! arrive as a verb plus JSON payload and are parsed into the game's typed
//! action here; events leave as JSON.

use std::collections::BTreeMap;

use arcade_protocol::{GameType, PlayerId};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::{
    ActionContext, Advance, ConnectFour, ConnectFourState, DrawGuess, DrawGuessState, GameConfig,
    GameLogic, LogicError, RockPaperScissors, RpsState, TicTacToe, TicTacToeState, Transition,
    TriviaQuiz, TriviaState, WordScramble, WordScrambleState, parse_action,
};

/// Runs `$body` with `$s` bound to the inner state, `$g` aliased to the
/// game's logic type, and `$wrap` as the variant constructor.
macro_rules! each_game {
    ($value:expr, |$s:ident, $g:ident, $wrap:ident| $body:expr) => {
        match $value {
            GameState::TicTacToe($s) => {
                #[allow(unused)]
                type $g = TicTacToe;
                #[allow(unused)]
                let $wrap = GameState::TicTacToe;
                $body
            }
            GameState::RockPaperScissors($s) => {
                #[allow(unused)]
                type $g = RockPaperScissors;
                #[allow(unused)]
                let $wrap = GameState::RockPaperScissors;
                $body
            }
            GameState::ConnectFour($s) => {
                #[allow(unused)]
                type $g = ConnectFour;
                #[allow(unused)]
                let $wrap = GameState::ConnectFour;
                $body
            }
            GameState::DrawAndGuess($s) => {
                #[allow(unused)]
                type $g = DrawGuess;
                #[allow(unused)]
                let $wrap = GameState::DrawAndGuess;
                $body
            }
            GameState::WordScramble($s) => {
                #[allow(unused)]
                type $g = WordScramble;
                #[allow(unused)]
                let $wrap = GameState::WordScramble;
                $body
            }
            GameState::TriviaQuiz($s) => {
                #[allow(unused)]
                type $g = TriviaQuiz;
                #[allow(unused)]
                let $wrap = GameState::TriviaQuiz;
                $body
            }
        }
    };
}

/// The state of one running game, whatever its type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GameState {
    TicTacToe(TicTacToeState),
    RockPaperScissors(RpsState),
    ConnectFour(ConnectFourState),
    DrawAndGuess(DrawGuessState),
    WordScramble(WordScrambleState),
    TriviaQuiz(TriviaState),
}

/// Player limits and timings for `game_type`.
pub fn config_for(game_type: GameType) -> GameConfig {
    match game_type {
        GameType::TicTacToe => TicTacToe::game_config(),
        GameType::RockPaperScissors => RockPaperScissors::game_config(),
        GameType::ConnectFour => ConnectFour::game_config(),
        GameType::DrawAndGuess => DrawGuess::game_config(),
        GameType::WordScramble => WordScramble::game_config(),
        GameType::TriviaQuiz => TriviaQuiz::game_config(),
    }
}

fn started<G: GameLogic, R: Rng + ?Sized>(players: &[PlayerId], rng: &mut R) -> G::State {
    let state = G::init(players, rng);
    G::begin(state, rng)
}

fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

impl GameState {
    /// Initializes a game and moves it into its first unit of play.
    pub fn start<R: Rng + ?Sized>(game_type: GameType, players: &[PlayerId], rng: &mut R) -> Self {
        match game_type {
            GameType::TicTacToe => Self::TicTacToe(started::<TicTacToe, _>(players, rng)),
            GameType::RockPaperScissors => {
                Self::RockPaperScissors(started::<RockPaperScissors, _>(players, rng))
            }
            GameType::ConnectFour => Self::ConnectFour(started::<ConnectFour, _>(players, rng)),
            GameType::DrawAndGuess => Self::DrawAndGuess(started::<DrawGuess, _>(players, rng)),
            GameType::WordScramble => Self::WordScramble(started::<WordScramble, _>(players, rng)),
            GameType::TriviaQuiz => Self::TriviaQuiz(started::<TriviaQuiz, _>(players, rng)),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            Self::TicTacToe(_) => GameType::TicTacToe,
            Self::RockPaperScissors(_) => GameType::RockPaperScissors,
            Self::ConnectFour(_) => GameType::ConnectFour,
            Self::DrawAndGuess(_) => GameType::DrawAndGuess,
            Self::WordScramble(_) => GameType::WordScramble,
            Self::TriviaQuiz(_) => GameType::TriviaQuiz,
        }
    }

    /// Parses and applies one player action.
    ///
    /// # Errors
    /// [`LogicError::MalformedAction`] if the verb or payload does not fit
    /// this game, otherwise whatever the game's rules reject.
    pub fn apply(
        &self,
        actor: PlayerId,
        action_type: &str,
        data: Value,
        ctx: &ActionContext,
    ) -> Result<Transition<GameState, Value>, LogicError> {
        each_game!(self, |s, G, wrap| {
            let action = parse_action::<<G as GameLogic>::Action>(action_type, data)?;
            G::apply(s, actor, action, ctx).map(|t| t.map(wrap, to_json))
        })
    }

    pub fn on_deadline(&self, ctx: &ActionContext) -> Option<Transition<GameState, Value>> {
        each_game!(self, |s, G, wrap| G::on_deadline(s, ctx).map(|t| t.map(wrap, to_json)))
    }

    pub fn advance<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Advance<GameState, Value>> {
        each_game!(self, |s, G, wrap| G::advance(s, rng).map(|a| a.map(wrap, to_json)))
    }

    pub fn standings(&self) -> BTreeMap<PlayerId, u32> {
        each_game!(self, |s, G, wrap| G::standings(s))
    }

    /// The state as `viewer` may see it, as JSON.
    pub fn view_for(&self, viewer: PlayerId) -> Value {
        each_game!(self, |s, G, wrap| to_json(G::redact(s, viewer)))
    }

    pub fn current_drawer(&self) -> Option<PlayerId> {
        each_game!(self, |s, G, wrap| G::current_drawer(s))
    }

    pub fn drawer_choices(&self) -> Option<Vec<String>> {
        each_game!(self, |s, G, wrap| G::drawer_choices(s))
    }
}
