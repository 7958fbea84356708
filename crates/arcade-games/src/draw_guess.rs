//! Draw & Guess.
//!
//! Players take turns drawing in a shuffled order. Each turn the drawer is
//! dealt three secret words and picks one; everyone else races to guess
//! it. A turn ends when every guesser has it or the deadline passes, then
//! the word is revealed to all and the next turn starts after a pause.

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

const TURN: Duration = Duration::from_secs(60);
const CHOICES_PER_TURN: usize = 3;
const MAX_ROUNDS: usize = 3;
const DRAWER_BONUS: u32 = 30;

const WORD_BANK: &[&str] = &[
    "apple", "banana", "castle", "dragon", "elephant", "flower", "guitar", "hammer", "island",
    "jungle", "kitten", "lantern", "mountain", "ninja", "ocean", "piano", "queen", "rainbow",
    "spaceship", "tornado", "umbrella", "volcano", "waterfall", "xylophone", "yacht", "zombie",
    "airplane", "balloon", "camera", "dolphin", "eagle", "forest", "galaxy", "hedgehog",
    "iceberg", "jellyfish", "kite", "lighthouse", "mushroom", "notebook", "octopus", "penguin",
    "quicksand", "rocket", "sandwich", "telescope", "unicorn", "vampire", "wizard", "xenon",
    "yogurt", "zipper", "bridge", "candle", "desert", "envelope", "firework", "grapes",
    "hurricane", "igloo", "jawbreaker", "kettle", "lollipop", "mirror", "noodle", "origami",
    "popcorn", "quilt", "rollercoaster", "sunflower", "treehouse", "underwater", "vortex",
    "windmill", "excavator", "yo-yo", "zeppelin", "anchor", "boulder", "cactus", "dandelion",
    "eclipse", "feather", "goblin", "hamster", "icicle", "juggle",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawPhase {
    Idle,
    Choosing,
    Drawing,
    RoundEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawGuessState {
    pub total_rounds: usize,
    pub phase: DrawPhase,
    pub drawer_order: Vec<PlayerId>,
    /// Turns started so far, including the current one.
    pub turns_played: usize,
    pub current_drawer_id: Option<PlayerId>,
    /// Secret: only the drawer sees these.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub word_choices: Vec<String>,
    /// Secret until the turn ends, except to the drawer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_word: Option<String>,
    pub word_hint: String,
    pub guessed_player_ids: Vec<PlayerId>,
    pub scores: BTreeMap<PlayerId, u32>,
    #[serde(skip)]
    pub players: Vec<PlayerId>,
}

impl DrawGuessState {
    fn total_turns(&self) -> usize {
        self.drawer_order.len() * self.total_rounds
    }

    fn is_exhausted(&self) -> bool {
        self.turns_played >= self.total_turns()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
pub enum DrawGuessAction {
    ChooseWord {
        word_index: i64,
    },
    Guess {
        #[serde(default)]
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DrawGuessEvent {
    WordChosen {
        drawer_id: PlayerId,
        word_length: usize,
    },
    WrongGuess {
        player_id: PlayerId,
        text: String,
    },
    CorrectGuess {
        player_id: PlayerId,
        points: u32,
        all_guessed: bool,
    },
    TimeUp {
        correct_word: Option<String>,
    },
    NextTurn {
        drawer_id: PlayerId,
    },
}

pub struct DrawGuess;

impl DrawGuess {
    /// Hands the pencil to the next drawer and deals fresh word choices.
    pub fn start_turn<R: Rng + ?Sized>(state: &DrawGuessState, rng: &mut R) -> DrawGuessState {
        let drawer = state
            .drawer_order
            .get(state.turns_played % state.drawer_order.len().max(1))
            .copied();
        DrawGuessState {
            turns_played: state.turns_played + 1,
            current_drawer_id: drawer,
            word_choices: WORD_BANK
                .choose_multiple(rng, CHOICES_PER_TURN)
                .map(|w| (*w).to_string())
                .collect(),
            correct_word: None,
            word_hint: String::new(),
            phase: DrawPhase::Choosing,
            guessed_player_ids: Vec::new(),
            ..state.clone()
        }
    }

    fn end_turn(state: &DrawGuessState) -> DrawGuessState {
        DrawGuessState {
            phase: DrawPhase::RoundEnd,
            ..state.clone()
        }
    }
}

/// One underscore per letter, spaces kept, letters separated by spaces.
fn make_hint(word: &str) -> String {
    word.chars()
        .map(|c| if c == ' ' { ' ' } else { '_' })
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
}

impl GameLogic for DrawGuess {
    type State = DrawGuessState;
    type Action = DrawGuessAction;
    type Event = DrawGuessEvent;

    fn game_config() -> GameConfig {
        GameConfig {
            min_players: 2,
            max_players: 8,
            turn_duration: Some(TURN),
            reveal_delay: Some(Duration::from_secs(3)),
            advance_delay: None,
        }
    }

    fn init<R: Rng + ?Sized>(players: &[PlayerId], rng: &mut R) -> DrawGuessState {
        let mut drawer_order = players.to_vec();
        drawer_order.shuffle(rng);
        DrawGuessState {
            total_rounds: MAX_ROUNDS.min(players.len()),
            phase: DrawPhase::Idle,
            drawer_order,
            turns_played: 0,
            current_drawer_id: None,
            word_choices: Vec::new(),
            correct_word: None,
            word_hint: String::new(),
            guessed_player_ids: Vec::new(),
            scores: players.iter().map(|&p| (p, 0)).collect(),
            players: players.to_vec(),
        }
    }

    fn begin<R: Rng + ?Sized>(state: DrawGuessState, rng: &mut R) -> DrawGuessState {
        Self::start_turn(&state, rng)
    }

    fn apply(
        state: &DrawGuessState,
        actor: PlayerId,
        action: DrawGuessAction,
        ctx: &ActionContext,
    ) -> Result<Transition<DrawGuessState, DrawGuessEvent>, LogicError> {
        match action {
            DrawGuessAction::ChooseWord { word_index } => {
                if state.phase != DrawPhase::Choosing {
                    return Err(LogicError::NotChoosingPhase);
                }
                if state.current_drawer_id != Some(actor) {
                    return Err(LogicError::NotDrawer);
                }
                let word = usize::try_from(word_index)
                    .ok()
                    .and_then(|i| state.word_choices.get(i))
                    .ok_or(LogicError::InvalidWordIndex)?;

                let next = DrawGuessState {
                    correct_word: Some(word.clone()),
                    word_hint: make_hint(word),
                    phase: DrawPhase::Drawing,
                    ..state.clone()
                };
                Ok(Transition::new(
                    next,
                    DrawGuessEvent::WordChosen {
                        drawer_id: actor,
                        word_length: word.chars().count(),
                    },
                ))
            }
            DrawGuessAction::Guess { text } => {
                if state.phase != DrawPhase::Drawing {
                    return Err(LogicError::NotDrawingPhase);
                }
                if state.current_drawer_id == Some(actor) {
                    return Err(LogicError::DrawerCannotGuess);
                }
                if !state.scores.contains_key(&actor) {
                    return Err(LogicError::NotAPlayer);
                }
                if state.guessed_player_ids.contains(&actor) {
                    return Err(LogicError::AlreadyGuessed);
                }

                let guess = text.trim().to_lowercase();
                let correct = state
                    .correct_word
                    .as_deref()
                    .map(|w| w.trim().to_lowercase())
                    .unwrap_or_default();
                if guess != correct {
                    return Ok(Transition::new(
                        state.clone(),
                        DrawGuessEvent::WrongGuess {
                            player_id: actor,
                            text,
                        },
                    ));
                }

                let points = speed_points(ctx.elapsed, TURN);
                let mut next = state.clone();
                *next.scores.entry(actor).or_insert(0) += points;
                if let Some(drawer) = state.current_drawer_id {
                    *next.scores.entry(drawer).or_insert(0) += DRAWER_BONUS;
                }
                next.guessed_player_ids.push(actor);

                let guessers = next.drawer_order.len().saturating_sub(1);
                let all_guessed = next.guessed_player_ids.len() >= guessers;
                let event = DrawGuessEvent::CorrectGuess {
                    player_id: actor,
                    points,
                    all_guessed,
                };
                if all_guessed {
                    Ok(Transition::new(Self::end_turn(&next), event).then(FollowUp::Reveal))
                } else {
                    Ok(Transition::new(next, event))
                }
            }
        }
    }

    /// The turn deadline covers both choosing and drawing.
    fn on_deadline(
        state: &DrawGuessState,
        _ctx: &ActionContext,
    ) -> Option<Transition<DrawGuessState, DrawGuessEvent>> {
        if !matches!(state.phase, DrawPhase::Choosing | DrawPhase::Drawing) {
            return None;
        }
        Some(
            Transition::new(
                Self::end_turn(state),
                DrawGuessEvent::TimeUp {
                    correct_word: state.correct_word.clone(),
                },
            )
            .then(FollowUp::Reveal),
        )
    }

    fn advance<R: Rng + ?Sized>(
        state: &DrawGuessState,
        rng: &mut R,
    ) -> Option<Advance<DrawGuessState, DrawGuessEvent>> {
        if state.phase != DrawPhase::RoundEnd {
            return None;
        }
        if state.is_exhausted() {
            return Some(Advance::Finished(top_scorer(&state.players, &state.scores)));
        }
        let next = Self::start_turn(state, rng);
        let drawer_id = next.current_drawer_id?;
        Some(Advance::Next {
            state: next,
            event: DrawGuessEvent::NextTurn { drawer_id },
        })
    }

    fn standings(state: &DrawGuessState) -> BTreeMap<PlayerId, u32> {
        state.scores.clone()
    }

    /// Non-drawers never see the word choices, and see the secret word only
    /// once the turn has ended.
    fn redact(state: &DrawGuessState, viewer: PlayerId) -> DrawGuessState {
        if state.current_drawer_id == Some(viewer) {
            return state.clone();
        }
        DrawGuessState {
            word_choices: Vec::new(),
            correct_word: if state.phase == DrawPhase::RoundEnd {
                state.correct_word.clone()
            } else {
                None
            },
            ..state.clone()
        }
    }

    fn current_drawer(state: &DrawGuessState) -> Option<PlayerId> {
        state.current_drawer_id
    }

    fn drawer_choices(state: &DrawGuessState) -> Option<Vec<String>> {
        (state.phase == DrawPhase::Choosing && !state.word_choices.is_empty())
            .then(|| state.word_choices.clone())
    }
}
