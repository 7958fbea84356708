//! Rule engines for the arcade mini-games.
//!
//! Every game is a set of pure transitions over an owned state value. No
//! module here touches sockets, clocks, or the session map: elapsed time
//! arrives in an [`ActionContext`] and randomness through an injected RNG.
//!
//! # Key types
//!
//! - [`GameLogic`]: the contract each game implements
//! - [`GameState`]: the six states behind one enum, used by the registry
//! - [`Transition`]: the result of an accepted action or a deadline
//! - [`GameConfig`]: player limits and phase timings per game type
//! - [`LogicError`]: typed rejections with stable tags

mod config;
mod connect_four;
mod draw_guess;
mod error;
mod logic;
mod rps;
mod state;
mod tic_tac_toe;
mod trivia;
mod word_scramble;

pub use config::GameConfig;
pub use connect_four::{ConnectFour, ConnectFourAction, ConnectFourEvent, ConnectFourState, Slot};
pub use draw_guess::{DrawGuess, DrawGuessAction, DrawGuessEvent, DrawGuessState, DrawPhase};
pub use error::LogicError;
pub use logic::{parse_action, top_scorer, ActionContext, Advance, FollowUp, GameLogic, Transition};
pub use rps::{Choice, RockPaperScissors, RoundResult, RpsAction, RpsEvent, RpsState};
pub use state::{GameState, config_for};
pub use tic_tac_toe::{Mark, TicTacToe, TicTacToeAction, TicTacToeEvent, TicTacToeState};
pub use trivia::{QuestionView, RevealResult, TriviaAction, TriviaEvent, TriviaPhase, TriviaQuiz, TriviaState};
pub use word_scramble::{
    ScramblePhase, WordScramble, WordScrambleAction, WordScrambleEvent, WordScrambleState,
};
