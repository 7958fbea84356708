//! Rock-Paper-Scissors, best of three.
//!
//! Both players pick simultaneously. A pick stays hidden from the opponent
//! until both are in, then the round is revealed and scored. Every revealed
//! round counts toward the three, ties included. The match ends when
//! someone reaches two round wins, or after round three on the round-win
//! count (equal counts are a draw).

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use arcade_protocol::{PlayerId, Winner};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ActionContext, Advance, FollowUp, GameConfig, GameLogic, LogicError, Transition};

const TOTAL_ROUNDS: u32 = 3;
const WINS_NEEDED: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    pub fn beats(self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors) | (Self::Paper, Self::Rock) | (Self::Scissors, Self::Paper)
        )
    }
}

impl FromStr for Choice {
    type Err = LogicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rock" => Ok(Self::Rock),
            "paper" => Ok(Self::Paper),
            "scissors" => Ok(Self::Scissors),
            _ => Err(LogicError::InvalidChoice),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub winner: Winner,
    pub p1_choice: Choice,
    pub p2_choice: Choice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpsState {
    pub round: u32,
    pub total_rounds: u32,
    /// Join order; the first entry is "p1" in round results.
    #[serde(skip)]
    pub players: Vec<PlayerId>,
    pub choices: BTreeMap<PlayerId, Option<Choice>>,
    /// Who has picked this round, visible to everyone.
    pub picked: BTreeSet<PlayerId>,
    pub revealed: bool,
    pub round_result: Option<RoundResult>,
    pub scores: BTreeMap<PlayerId, u32>,
    pub match_winner: Option<Winner>,
}

impl RpsState {
    fn pair(&self) -> Option<(PlayerId, PlayerId)> {
        match self.players.as_slice() {
            [p1, p2, ..] => Some((*p1, *p2)),
            _ => None,
        }
    }

    fn score(&self, player: PlayerId) -> u32 {
        self.scores.get(&player).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum RpsAction {
    Pick { choice: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RpsEvent {
    Picked {
        player_id: PlayerId,
    },
    Reveal {
        round_winner: Winner,
        p1_choice: Choice,
        p2_choice: Choice,
        p1: PlayerId,
        p2: PlayerId,
    },
    NextRound {
        round: u32,
    },
}

pub struct RockPaperScissors;

impl RockPaperScissors {
    /// Resets the picks for the following round.
    pub fn advance_round(state: &RpsState) -> RpsState {
        RpsState {
            round: state.round + 1,
            choices: state.players.iter().map(|&p| (p, None)).collect(),
            picked: BTreeSet::new(),
            revealed: false,
            round_result: None,
            ..state.clone()
        }
    }

    fn match_winner(state: &RpsState, p1: PlayerId, p2: PlayerId) -> Option<Winner> {
        if let Some(&leader) = state.players.iter().find(|&&p| state.score(p) >= WINS_NEEDED) {
            return Some(Winner::Player(leader));
        }
        if state.round < state.total_rounds {
            return None;
        }
        Some(match state.score(p1).cmp(&state.score(p2)) {
            std::cmp::Ordering::Greater => Winner::Player(p1),
            std::cmp::Ordering::Less => Winner::Player(p2),
            std::cmp::Ordering::Equal => Winner::Draw,
        })
    }
}

impl GameLogic for RockPaperScissors {
    type State = RpsState;
    type Action = RpsAction;
    type Event = RpsEvent;

    fn game_config() -> GameConfig {
        GameConfig {
            advance_delay: Some(std::time::Duration::from_millis(2500)),
            ..GameConfig::default()
        }
    }

    fn init<R: Rng + ?Sized>(players: &[PlayerId], _rng: &mut R) -> RpsState {
        let players: Vec<PlayerId> = players.iter().copied().take(2).collect();
        RpsState {
            round: 1,
            total_rounds: TOTAL_ROUNDS,
            choices: players.iter().map(|&p| (p, None)).collect(),
            picked: BTreeSet::new(),
            revealed: false,
            round_result: None,
            scores: players.iter().map(|&p| (p, 0)).collect(),
            match_winner: None,
            players,
        }
    }

    fn apply(
        state: &RpsState,
        actor: PlayerId,
        action: RpsAction,
        _ctx: &ActionContext,
    ) -> Result<Transition<RpsState, RpsEvent>, LogicError> {
        let RpsAction::Pick { choice } = action;

        if state.match_winner.is_some() {
            return Err(LogicError::MatchOver);
        }
        if state.revealed {
            return Err(LogicError::RoundRevealed);
        }
        match state.choices.get(&actor) {
            None => return Err(LogicError::NotAPlayer),
            Some(Some(_)) => return Err(LogicError::AlreadyPicked),
            Some(None) => {}
        }
        let choice: Choice = choice.parse()?;

        let mut next = state.clone();
        next.choices.insert(actor, Some(choice));
        next.picked.insert(actor);

        let (p1, p2) = state.pair().ok_or(LogicError::NotAPlayer)?;
        let (Some(c1), Some(c2)) = (
            next.choices.get(&p1).copied().flatten(),
            next.choices.get(&p2).copied().flatten(),
        ) else {
            return Ok(Transition::new(next, RpsEvent::Picked { player_id: actor }));
        };

        let round_winner = if c1 == c2 {
            Winner::Draw
        } else if c1.beats(c2) {
            Winner::Player(p1)
        } else {
            Winner::Player(p2)
        };
        if let Winner::Player(p) = round_winner {
            *next.scores.entry(p).or_insert(0) += 1;
        }
        next.revealed = true;
        next.round_result = Some(RoundResult {
            winner: round_winner,
            p1_choice: c1,
            p2_choice: c2,
        });
        next.match_winner = Self::match_winner(&next, p1, p2);

        let match_winner = next.match_winner;
        let transition = Transition::new(
            next,
            RpsEvent::Reveal {
                round_winner,
                p1_choice: c1,
                p2_choice: c2,
                p1,
                p2,
            },
        );
        Ok(match match_winner {
            Some(winner) => transition.finished(winner),
            None => transition.then(FollowUp::Advance),
        })
    }

    fn advance<R: Rng + ?Sized>(
        state: &RpsState,
        _rng: &mut R,
    ) -> Option<Advance<RpsState, RpsEvent>> {
        if !state.revealed || state.match_winner.is_some() {
            return None;
        }
        let next = Self::advance_round(state);
        let round = next.round;
        Some(Advance::Next {
            state: next,
            event: RpsEvent::NextRound { round },
        })
    }

    fn standings(state: &RpsState) -> BTreeMap<PlayerId, u32> {
        state.scores.clone()
    }

    /// Hides the opponent's pick until the round is revealed.
    fn redact(state: &RpsState, viewer: PlayerId) -> RpsState {
        if state.revealed {
            return state.clone();
        }
        let mut view = state.clone();
        for (player, choice) in view.choices.iter_mut() {
            if *player != viewer {
                *choice = None;
            }
        }
        view
    }
}
