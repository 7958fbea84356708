//! Connect Four: two players drop pieces into a 6×7 grid.

use std::collections::BTreeMap;

use arcade_protocol::{PlayerId, Winner};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ActionContext, GameConfig, GameLogic, LogicError, Transition};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    P1,
    P2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectFourState {
    /// `ROWS × COLS` cells, row 0 at the top.
    pub board: Vec<Option<PlayerId>>,
    pub current_turn: Option<PlayerId>,
    pub player_slots: BTreeMap<PlayerId, Slot>,
    pub winner: Option<Winner>,
    pub win_cells: Option<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ConnectFourAction {
    Drop { col: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ConnectFourEvent {
    Drop {
        player_id: PlayerId,
        row: usize,
        col: usize,
    },
}

pub struct ConnectFour;

impl GameLogic for ConnectFour {
    type State = ConnectFourState;
    type Action = ConnectFourAction;
    type Event = ConnectFourEvent;

    fn game_config() -> GameConfig {
        GameConfig::default()
    }

    fn init<R: Rng + ?Sized>(players: &[PlayerId], _rng: &mut R) -> ConnectFourState {
        ConnectFourState {
            board: vec![None; ROWS * COLS],
            current_turn: players.first().copied(),
            player_slots: players.iter().copied().zip([Slot::P1, Slot::P2]).collect(),
            winner: None,
            win_cells: None,
        }
    }

    fn apply(
        state: &ConnectFourState,
        actor: PlayerId,
        action: ConnectFourAction,
        _ctx: &ActionContext,
    ) -> Result<Transition<ConnectFourState, ConnectFourEvent>, LogicError> {
        let ConnectFourAction::Drop { col } = action;

        if state.winner.is_some() {
            return Err(LogicError::GameOver);
        }
        if state.current_turn != Some(actor) {
            return Err(LogicError::NotYourTurn);
        }
        let col = usize::try_from(col)
            .ok()
            .filter(|c| *c < COLS)
            .ok_or(LogicError::InvalidColumn)?;
        let row = (0..ROWS)
            .rev()
            .find(|r| state.board[r * COLS + col].is_none())
            .ok_or(LogicError::ColumnFull)?;

        let mut next = state.clone();
        next.board[row * COLS + col] = Some(actor);

        let win_cells = winning_cells(&next.board, row, col, actor);
        let full = next.board.iter().all(Option::is_some);

        next.winner = match (&win_cells, full) {
            (Some(_), _) => Some(Winner::Player(actor)),
            (None, true) => Some(Winner::Draw),
            (None, false) => None,
        };
        next.win_cells = win_cells;
        next.current_turn = match next.winner {
            Some(_) => None,
            None => state.player_slots.keys().copied().find(|p| *p != actor),
        };

        let winner = next.winner;
        let transition = Transition::new(
            next,
            ConnectFourEvent::Drop {
                player_id: actor,
                row,
                col,
            },
        );
        Ok(match winner {
            Some(winner) => transition.finished(winner),
            None => transition,
        })
    }

    fn standings(state: &ConnectFourState) -> BTreeMap<PlayerId, u32> {
        state
            .player_slots
            .keys()
            .map(|&p| (p, u32::from(state.winner == Some(Winner::Player(p)))))
            .collect()
    }
}

/// Looks outward from the placed piece along each axis, up to three steps
/// each way. Returns the first four cells of a line of four or more.
fn winning_cells(
    board: &[Option<PlayerId>],
    row: usize,
    col: usize,
    player: PlayerId,
) -> Option<Vec<usize>> {
    for (dr, dc) in DIRECTIONS {
        let mut line = vec![row * COLS + col];
        for sign in [1isize, -1] {
            for k in 1..=3isize {
                let r = row as isize + dr * sign * k;
                let c = col as isize + dc * sign * k;
                if r < 0 || r >= ROWS as isize || c < 0 || c >= COLS as isize {
                    break;
                }
                let idx = r as usize * COLS + c as usize;
                if board[idx] != Some(player) {
                    break;
                }
                line.push(idx);
            }
        }
        if line.len() >= 4 {
            line.truncate(4);
            return Some(line);
        }
    }
    None
}
