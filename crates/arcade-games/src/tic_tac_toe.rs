//! Tic-Tac-Toe: two players alternate on a 3×3 board.

use std::collections::BTreeMap;

use arcade_protocol::{PlayerId, Winner};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ActionContext, GameConfig, GameLogic, LogicError, Transition};

const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicTacToeState {
    /// Owner of each cell, row-major.
    pub board: [Option<PlayerId>; 9],
    /// `None` once the game is over.
    pub current_turn: Option<PlayerId>,
    pub symbols: BTreeMap<PlayerId, Mark>,
    pub winner: Option<Winner>,
    pub win_line: Option<[usize; 3]>,
}

impl TicTacToeState {
    fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        self.symbols.keys().copied().find(|p| *p != player)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
pub enum TicTacToeAction {
    Place { cell_index: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TicTacToeEvent {
    Place {
        player_id: PlayerId,
        cell_index: usize,
        symbol: Mark,
    },
}

pub struct TicTacToe;

impl GameLogic for TicTacToe {
    type State = TicTacToeState;
    type Action = TicTacToeAction;
    type Event = TicTacToeEvent;

    fn game_config() -> GameConfig {
        GameConfig::default()
    }

    fn init<R: Rng + ?Sized>(players: &[PlayerId], _rng: &mut R) -> TicTacToeState {
        TicTacToeState {
            board: [None; 9],
            current_turn: players.first().copied(),
            symbols: players.iter().copied().zip([Mark::X, Mark::O]).collect(),
            winner: None,
            win_line: None,
        }
    }

    fn apply(
        state: &TicTacToeState,
        actor: PlayerId,
        action: TicTacToeAction,
        _ctx: &ActionContext,
    ) -> Result<Transition<TicTacToeState, TicTacToeEvent>, LogicError> {
        let TicTacToeAction::Place { cell_index } = action;

        if state.winner.is_some() {
            return Err(LogicError::GameOver);
        }
        if state.current_turn != Some(actor) {
            return Err(LogicError::NotYourTurn);
        }
        let cell = usize::try_from(cell_index)
            .ok()
            .filter(|c| *c < 9)
            .ok_or(LogicError::InvalidCell)?;
        if state.board[cell].is_some() {
            return Err(LogicError::CellTaken);
        }

        let mut next = state.clone();
        next.board[cell] = Some(actor);

        let win_line = WIN_LINES
            .iter()
            .copied()
            .find(|line| line.iter().all(|&i| next.board[i] == Some(actor)));
        let full = next.board.iter().all(Option::is_some);

        next.winner = match (win_line, full) {
            (Some(_), _) => Some(Winner::Player(actor)),
            (None, true) => Some(Winner::Draw),
            (None, false) => None,
        };
        next.win_line = win_line;
        next.current_turn = match next.winner {
            Some(_) => None,
            None => state.opponent_of(actor),
        };

        let symbol = state.symbols.get(&actor).copied().unwrap_or(Mark::X);
        let winner = next.winner;
        let transition = Transition::new(
            next,
            TicTacToeEvent::Place {
                player_id: actor,
                cell_index: cell,
                symbol,
            },
        );
        Ok(match winner {
            Some(winner) => transition.finished(winner),
            None => transition,
        })
    }

    fn standings(state: &TicTacToeState) -> BTreeMap<PlayerId, u32> {
        state
            .symbols
            .keys()
            .map(|&p| (p, u32::from(state.winner == Some(Winner::Player(p)))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);

    fn fresh() -> TicTacToeState {
        TicTacToe::init(&[A, B], &mut StdRng::seed_from_u64(0))
    }

    fn place(state: &TicTacToeState, actor: PlayerId, cell: i64) -> Result<TicTacToeState, LogicError> {
        TicTacToe::apply(
            state,
            actor,
            TicTacToeAction::Place { cell_index: cell },
            &ActionContext::default(),
        )
        .map(|t| t.state)
    }

    #[test]
    fn test_first_joiner_is_x_and_moves_first() {
        let state = fresh();
        assert_eq!(state.current_turn, Some(A));
        assert_eq!(state.symbols[&A], Mark::X);
        assert_eq!(state.symbols[&B], Mark::O);
    }

    #[test]
    fn test_top_row_wins() {
        // X X X / O O _ / _ _ _
        let mut state = fresh();
        for (actor, cell) in [(A, 0), (B, 3), (A, 1), (B, 4)] {
            state = place(&state, actor, cell).unwrap();
        }
        let t = TicTacToe::apply(
            &state,
            A,
            TicTacToeAction::Place { cell_index: 2 },
            &ActionContext::default(),
        )
        .unwrap();
        assert_eq!(t.game_over, Some(Winner::Player(A)));
        assert_eq!(t.state.win_line, Some([0, 1, 2]));
        assert_eq!(t.state.current_turn, None);
        assert_eq!(TicTacToe::standings(&t.state)[&A], 1);
        assert_eq!(TicTacToe::standings(&t.state)[&B], 0);
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        // X O X / X O O / O X X
        let mut state = fresh();
        for (actor, cell) in [(A, 0), (B, 1), (A, 2), (B, 4), (A, 3), (B, 5), (A, 7), (B, 6)] {
            state = place(&state, actor, cell).unwrap();
        }
        let t = TicTacToe::apply(
            &state,
            A,
            TicTacToeAction::Place { cell_index: 8 },
            &ActionContext::default(),
        )
        .unwrap();
        assert_eq!(t.game_over, Some(Winner::Draw));
        assert_eq!(t.state.winner, Some(Winner::Draw));
        assert_eq!(t.state.win_line, None);
    }

    #[test]
    fn test_out_of_turn_is_rejected() {
        let state = fresh();
        assert_eq!(place(&state, B, 0), Err(LogicError::NotYourTurn));
        assert_eq!(place(&state, PlayerId(99), 0), Err(LogicError::NotYourTurn));
    }

    #[test]
    fn test_taken_and_invalid_cells() {
        let state = place(&fresh(), A, 4).unwrap();
        assert_eq!(place(&state, B, 4), Err(LogicError::CellTaken));
        assert_eq!(place(&state, B, 9), Err(LogicError::InvalidCell));
        assert_eq!(place(&state, B, -1), Err(LogicError::InvalidCell));
    }

    #[test]
    fn test_no_moves_after_game_over() {
        let mut state = fresh();
        for (actor, cell) in [(A, 0), (B, 3), (A, 1), (B, 4), (A, 2)] {
            state = place(&state, actor, cell).unwrap();
        }
        assert_eq!(place(&state, B, 5), Err(LogicError::GameOver));
    }

    #[test]
    fn test_apply_is_pure() {
        let state = place(&fresh(), A, 0).unwrap();
        let before = state.clone();
        let one = TicTacToe::apply(&state, B, TicTacToeAction::Place { cell_index: 8 }, &ActionContext::default());
        let two = TicTacToe::apply(&state, B, TicTacToeAction::Place { cell_index: 8 }, &ActionContext::default());
        assert_eq!(one, two);
        assert_eq!(state, before);
    }

    #[test]
    fn test_state_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(place(&fresh(), A, 0).unwrap()).unwrap();
        assert_eq!(json["board"][0], 1);
        assert_eq!(json["currentTurn"], 2);
        assert_eq!(json["symbols"]["1"], "X");
        assert!(json["winLine"].is_null());
    }
}
