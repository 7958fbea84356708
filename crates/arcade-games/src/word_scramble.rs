//! Word Scramble: everyone races to unscramble the same word.

use std::collections::BTreeMap;
use std::time::Duration;

use arcade_protocol::PlayerId;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::logic::speed_points;
use crate::{
    ActionContext, Advance, FollowUp, GameConfig, GameLogic, LogicError, Transition, top_scorer,
};

const ROUND: Duration = Duration::from_secs(30);
const TOTAL_ROUNDS: u32 = 5;

const WORD_LIST: &[&str] = &[
    "APPLE", "BRAVE", "CRANE", "DANCE", "EARTH", "FLAME", "GRACE", "HEART", "IMAGE", "JUNGLE",
    "KNIFE", "LEMON", "MAGIC", "NOBLE", "OCEAN", "PIANO", "QUEEN", "RIVER", "STONE", "TIGER",
    "UNITY", "VIVID", "WATER", "XENON", "YACHT", "ZEBRA", "BLAST", "CLOUD", "DREAM", "EAGLE",
    "FROST", "GLOBE", "HONEY", "INPUT", "JOKER", "KARMA", "LIGHT", "MONEY", "NIGHT", "ORBIT",
    "PIZZA", "QUICK", "RADIO", "SMILE", "TOWER", "URBAN", "VAPOR", "WITCH", "XYLEM", "YOUTH",
    "AMBER", "BEACH", "CEDAR", "DELTA", "ELITE", "FAIRY", "GRAND", "HORSE", "IONIC", "JEWEL",
    "LUNAR", "MAPLE", "NINJA", "ONION", "PIXEL", "RALLY", "SPINE", "TITAN", "ULTRA", "VIBES",
    "WINGS", "EXTRA", "YIELD", "ZONES", "BINGO", "CHESS", "DISCO", "FEAST", "GLOOM", "HASTE",
    "IVORY", "JAZZY", "KNACK", "LASER", "MANGO", "NERVE", "OASIS", "PROSE", "RIDGE", "SQUAD",
    "TRUCE", "USHER", "VAULT", "WORLD", "XEROX", "ZONAL", "BLAZE", "CAMEL", "DUNES", "EMBER",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScramblePhase {
    Idle,
    Active,
    RoundEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordScrambleState {
    pub round: u32,
    pub total_rounds: u32,
    pub scrambled: String,
    /// Secret until the round ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_word: Option<String>,
    pub round_winner: Option<PlayerId>,
    pub scores: BTreeMap<PlayerId, u32>,
    pub phase: ScramblePhase,
    #[serde(skip)]
    pub players: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum WordScrambleAction {
    Answer {
        #[serde(default)]
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WordScrambleEvent {
    Correct {
        player_id: PlayerId,
        word: String,
        points: u32,
    },
    TimeUp {
        word: String,
    },
    NextRound {
        round: u32,
    },
}

pub struct WordScramble;

impl WordScramble {
    /// Picks a new word and scrambles it for the next round.
    pub fn start_round<R: Rng + ?Sized>(state: &WordScrambleState, rng: &mut R) -> WordScrambleState {
        let word = WORD_LIST.choose(rng).copied().unwrap_or("ARCADE");
        WordScrambleState {
            round: state.round + 1,
            scrambled: scramble(word, rng),
            correct_word: Some(word.to_string()),
            round_winner: None,
            phase: ScramblePhase::Active,
            ..state.clone()
        }
    }
}

/// Shuffles the letters until the result differs from the source.
fn scramble<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let mut letters: Vec<char> = word.chars().collect();
    if letters.windows(2).all(|w| w[0] == w[1]) {
        return word.to_string();
    }
    loop {
        letters.shuffle(rng);
        let candidate: String = letters.iter().collect();
        if candidate != word {
            return candidate;
        }
    }
}

impl GameLogic for WordScramble {
    type State = WordScrambleState;
    type Action = WordScrambleAction;
    type Event = WordScrambleEvent;

    fn game_config() -> GameConfig {
        GameConfig {
            min_players: 2,
            max_players: 6,
            turn_duration: Some(ROUND),
            reveal_delay: None,
            advance_delay: Some(Duration::from_millis(2500)),
        }
    }

    fn init<R: Rng + ?Sized>(players: &[PlayerId], _rng: &mut R) -> WordScrambleState {
        WordScrambleState {
            round: 0,
            total_rounds: TOTAL_ROUNDS,
            scrambled: String::new(),
            correct_word: None,
            round_winner: None,
            scores: players.iter().map(|&p| (p, 0)).collect(),
            phase: ScramblePhase::Idle,
            players: players.to_vec(),
        }
    }

    fn begin<R: Rng + ?Sized>(state: WordScrambleState, rng: &mut R) -> WordScrambleState {
        Self::start_round(&state, rng)
    }

    fn apply(
        state: &WordScrambleState,
        actor: PlayerId,
        action: WordScrambleAction,
        ctx: &ActionContext,
    ) -> Result<Transition<WordScrambleState, WordScrambleEvent>, LogicError> {
        let WordScrambleAction::Answer { text } = action;

        if state.phase != ScramblePhase::Active {
            return Err(LogicError::RoundNotActive);
        }
        if state.round_winner.is_some() {
            return Err(LogicError::RoundAlreadyWon);
        }
        if !state.scores.contains_key(&actor) {
            return Err(LogicError::NotAPlayer);
        }
        let word = state.correct_word.clone().unwrap_or_default();
        if text.trim().to_uppercase() != word {
            return Err(LogicError::WrongAnswer);
        }

        let points = speed_points(ctx.elapsed, ROUND);
        let mut next = state.clone();
        *next.scores.entry(actor).or_insert(0) += points;
        next.round_winner = Some(actor);
        next.phase = ScramblePhase::RoundEnd;

        let last_round = state.round >= state.total_rounds;
        let winner = top_scorer(&next.players, &next.scores);
        let transition = Transition::new(
            next,
            WordScrambleEvent::Correct {
                player_id: actor,
                word,
                points,
            },
        );
        Ok(if last_round {
            transition.finished(winner)
        } else {
            transition.then(FollowUp::Advance)
        })
    }

    /// Time ran out with nobody solving it: reveal the word, no points.
    fn on_deadline(
        state: &WordScrambleState,
        _ctx: &ActionContext,
    ) -> Option<Transition<WordScrambleState, WordScrambleEvent>> {
        if state.phase != ScramblePhase::Active {
            return None;
        }
        let next = WordScrambleState {
            phase: ScramblePhase::RoundEnd,
            ..state.clone()
        };
        let word = state.correct_word.clone().unwrap_or_default();
        Some(Transition::new(next, WordScrambleEvent::TimeUp { word }).then(FollowUp::Advance))
    }

    fn advance<R: Rng + ?Sized>(
        state: &WordScrambleState,
        rng: &mut R,
    ) -> Option<Advance<WordScrambleState, WordScrambleEvent>> {
        if state.phase != ScramblePhase::RoundEnd {
            return None;
        }
        if state.round >= state.total_rounds {
            return Some(Advance::Finished(top_scorer(&state.players, &state.scores)));
        }
        let next = Self::start_round(state, rng);
        let round = next.round;
        Some(Advance::Next {
            state: next,
            event: WordScrambleEvent::NextRound { round },
        })
    }

    fn standings(state: &WordScrambleState) -> BTreeMap<PlayerId, u32> {
        state.scores.clone()
    }

    fn redact(state: &WordScrambleState, _viewer: PlayerId) -> WordScrambleState {
        if state.phase == ScramblePhase::RoundEnd {
            return state.clone();
        }
        WordScrambleState {
            correct_word: None,
            ..state.clone()
        }
    }
}
