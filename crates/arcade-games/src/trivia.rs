//! Trivia Quiz: ten multiple-choice questions, answered concurrently.
//!
//! Answers are locked in silently. The question is revealed and scored
//! once everyone has answered or the deadline passes; faster correct
//! answers earn a bigger bonus.

use std::collections::BTreeMap;
use std::time::Duration;

use arcade_protocol::PlayerId;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::logic::speed_points;
use crate::{
    ActionContext, Advance, FollowUp, GameConfig, GameLogic, LogicError, Transition, top_scorer,
};

const QUESTION_TIME: Duration = Duration::from_secs(15);
const QUESTIONS_PER_GAME: usize = 10;
const OPTIONS: usize = 4;

#[derive(Debug, PartialEq, Eq)]
pub struct Question {
    pub text: &'static str,
    pub options: [&'static str; OPTIONS],
    pub answer: usize,
}

const fn q(text: &'static str, options: [&'static str; OPTIONS], answer: usize) -> Question {
    Question {
        text,
        options,
        answer,
    }
}

const QUESTION_BANK: &[Question] = &[
    q("What is the capital of France?", ["London", "Paris", "Berlin", "Madrid"], 1),
    q("How many sides does a hexagon have?", ["5", "6", "7", "8"], 1),
    q("Which planet is closest to the Sun?", ["Venus", "Earth", "Mars", "Mercury"], 3),
    q("What is the largest ocean?", ["Atlantic", "Indian", "Pacific", "Arctic"], 2),
    q("Who painted the Mona Lisa?", ["Picasso", "Da Vinci", "Rembrandt", "Van Gogh"], 1),
    q("How many colors are in a rainbow?", ["5", "6", "7", "8"], 2),
    q("What is the chemical symbol for gold?", ["Go", "Gd", "Au", "Ag"], 2),
    q("Which animal is the fastest on land?", ["Lion", "Cheetah", "Horse", "Gazelle"], 1),
    q("How many continents are there?", ["5", "6", "7", "8"], 2),
    q("What is the hardest natural substance?", ["Iron", "Quartz", "Diamond", "Ruby"], 2),
    q("Which country invented pizza?", ["France", "USA", "Italy", "Greece"], 2),
    q("How many strings does a standard guitar have?", ["4", "5", "6", "7"], 2),
    q("What is the longest river in the world?", ["Amazon", "Mississippi", "Nile", "Yangtze"], 2),
    q("Which element has the symbol \"O\"?", ["Osmium", "Oxygen", "Oganesson", "Oxide"], 1),
    q("How many players are on a soccer team?", ["9", "10", "11", "12"], 2),
    q("What year did the first iPhone launch?", ["2005", "2006", "2007", "2008"], 2),
    q(
        "Which gas makes up most of Earth's atmosphere?",
        ["Oxygen", "Nitrogen", "Carbon Dioxide", "Argon"],
        1,
    ),
    q("How many bones are in the human body?", ["196", "206", "216", "226"], 1),
    q(
        "What is the tallest mountain in the world?",
        ["K2", "Kangchenjunga", "Everest", "Lhotse"],
        2,
    ),
    q(
        "Which programming language is known as the \"language of the web\"?",
        ["Python", "Java", "JavaScript", "Ruby"],
        2,
    ),
    q("What is the square root of 144?", ["10", "11", "12", "13"], 2),
    q("Which country has the most natural lakes?", ["USA", "Russia", "Canada", "Brazil"], 2),
    q("What is the smallest planet in our solar system?", ["Mars", "Venus", "Mercury", "Pluto"], 2),
    q("How many teeth does an adult human have?", ["28", "30", "32", "34"], 2),
    q("Which ocean is the smallest?", ["Southern", "Arctic", "Indian", "Pacific"], 1),
    q("What is the capital of Japan?", ["Beijing", "Seoul", "Tokyo", "Bangkok"], 2),
    q("Who wrote Romeo and Juliet?", ["Dickens", "Shakespeare", "Twain", "Austen"], 1),
    q("How many hours are in a week?", ["148", "156", "168", "178"], 2),
    q("What color is a ruby?", ["Blue", "Green", "Red", "Yellow"], 2),
    q("Which planet has the most moons?", ["Jupiter", "Saturn", "Uranus", "Neptune"], 1),
    q("What is the largest continent?", ["Africa", "Americas", "Asia", "Europe"], 2),
    q("How many letters are in the English alphabet?", ["24", "25", "26", "27"], 2),
    q(
        "Which country is home to the kangaroo?",
        ["New Zealand", "South Africa", "Australia", "India"],
        2,
    ),
    q("What is water's chemical formula?", ["CO2", "H2O", "O2", "H2O2"], 1),
    q("How many players are on a basketball team?", ["4", "5", "6", "7"], 1),
    q("Which is the largest land animal?", ["Hippo", "Giraffe", "Elephant", "Rhino"], 2),
    q("What year did World War II end?", ["1943", "1944", "1945", "1946"], 2),
    q("How many sides does a pentagon have?", ["4", "5", "6", "7"], 1),
    q("What is the capital of Australia?", ["Sydney", "Melbourne", "Canberra", "Brisbane"], 2),
    q(
        "Which fruit is known as the \"king of fruits\"?",
        ["Mango", "Durian", "Pineapple", "Jackfruit"],
        1,
    ),
    q("How many keys does a standard piano have?", ["76", "80", "88", "92"], 2),
    q(
        "What is the speed of light (approx)?",
        ["200,000 km/s", "300,000 km/s", "400,000 km/s", "500,000 km/s"],
        1,
    ),
    q("Which animal sleeps standing up?", ["Elephant", "Giraffe", "Horse", "All of these"], 3),
    q(
        "What does \"HTML\" stand for?",
        [
            "Hyper Transfer Markup Language",
            "HyperText Markup Language",
            "High Text Making Language",
            "Hyper Text Making Links",
        ],
        1,
    ),
    q("How many hearts does an octopus have?", ["1", "2", "3", "4"], 2),
    q(
        "What is the capital of Brazil?",
        ["Rio de Janeiro", "São Paulo", "Brasília", "Salvador"],
        2,
    ),
    q(
        "Which element is liquid at room temperature (besides mercury)?",
        ["Bromine", "Chlorine", "Fluorine", "Iodine"],
        0,
    ),
    q("How many strings does a violin have?", ["3", "4", "5", "6"], 1),
    q("What is the most spoken language in the world?", ["English", "Spanish", "Mandarin", "Hindi"], 2),
    q("How many time zones does Russia span?", ["9", "10", "11", "12"], 2),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriviaPhase {
    Idle,
    Question,
    Reveal,
}

/// The part of a question every player may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub text: &'static str,
    pub options: [&'static str; OPTIONS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Answer {
    option_index: usize,
    elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealResult {
    pub is_correct: bool,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaState {
    pub question_index: Option<usize>,
    pub total_questions: usize,
    #[serde(skip)]
    questions: Vec<&'static Question>,
    pub current_question: Option<QuestionView>,
    /// Secret until the question is revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
    pub reveal_answer: bool,
    /// Who has locked in an answer, in answer order.
    pub answered: Vec<PlayerId>,
    #[serde(skip)]
    answers: BTreeMap<PlayerId, Answer>,
    pub reveal_results: BTreeMap<PlayerId, RevealResult>,
    pub scores: BTreeMap<PlayerId, u32>,
    pub phase: TriviaPhase,
    #[serde(skip)]
    players: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
pub enum TriviaAction {
    Answer { option_index: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TriviaEvent {
    Answered {
        player_id: PlayerId,
        all_answered: bool,
    },
    TimeUp {
        correct_index: Option<usize>,
    },
    NextQuestion {
        index: usize,
    },
}

pub struct TriviaQuiz;

impl TriviaQuiz {
    /// Moves to the next question, or `None` when all have been asked.
    pub fn start_question(state: &TriviaState) -> Option<TriviaState> {
        let index = state.question_index.map_or(0, |i| i + 1);
        if index >= state.total_questions {
            return None;
        }
        let question = state.questions.get(index)?;
        Some(TriviaState {
            question_index: Some(index),
            current_question: Some(QuestionView {
                text: question.text,
                options: question.options,
            }),
            correct_index: Some(question.answer),
            reveal_answer: false,
            answered: Vec::new(),
            answers: BTreeMap::new(),
            reveal_results: BTreeMap::new(),
            phase: TriviaPhase::Question,
            ..state.clone()
        })
    }

    /// Scores every locked-in answer and reveals the correct option.
    pub fn reveal_and_score(state: &TriviaState) -> TriviaState {
        let mut next = state.clone();
        for (&player, answer) in &state.answers {
            let is_correct = Some(answer.option_index) == state.correct_index;
            let points = if is_correct {
                speed_points(answer.elapsed, QUESTION_TIME)
            } else {
                0
            };
            *next.scores.entry(player).or_insert(0) += points;
            next.reveal_results
                .insert(player, RevealResult { is_correct, points });
        }
        next.reveal_answer = true;
        next.phase = TriviaPhase::Reveal;
        next
    }
}

impl GameLogic for TriviaQuiz {
    type State = TriviaState;
    type Action = TriviaAction;
    type Event = TriviaEvent;

    fn game_config() -> GameConfig {
        GameConfig {
            min_players: 2,
            max_players: 8,
            turn_duration: Some(QUESTION_TIME),
            reveal_delay: Some(Duration::from_secs(3)),
            advance_delay: None,
        }
    }

    fn init<R: Rng + ?Sized>(players: &[PlayerId], rng: &mut R) -> TriviaState {
        let questions: Vec<&'static Question> = QUESTION_BANK
            .choose_multiple(rng, QUESTIONS_PER_GAME)
            .collect();
        TriviaState {
            question_index: None,
            total_questions: questions.len(),
            questions,
            current_question: None,
            correct_index: None,
            reveal_answer: false,
            answered: Vec::new(),
            answers: BTreeMap::new(),
            reveal_results: BTreeMap::new(),
            scores: players.iter().map(|&p| (p, 0)).collect(),
            phase: TriviaPhase::Idle,
            players: players.to_vec(),
        }
    }

    fn begin<R: Rng + ?Sized>(state: TriviaState, _rng: &mut R) -> TriviaState {
        Self::start_question(&state).unwrap_or(state)
    }

    fn apply(
        state: &TriviaState,
        actor: PlayerId,
        action: TriviaAction,
        ctx: &ActionContext,
    ) -> Result<Transition<TriviaState, TriviaEvent>, LogicError> {
        let TriviaAction::Answer { option_index } = action;

        if state.phase != TriviaPhase::Question {
            return Err(LogicError::NotAcceptingAnswers);
        }
        if state.answers.contains_key(&actor) {
            return Err(LogicError::AlreadyAnswered);
        }
        if !state.scores.contains_key(&actor) {
            return Err(LogicError::NotAPlayer);
        }
        let option_index = usize::try_from(option_index)
            .ok()
            .filter(|i| *i < OPTIONS)
            .ok_or(LogicError::InvalidOption)?;

        let mut next = state.clone();
        next.answers.insert(
            actor,
            Answer {
                option_index,
                elapsed: ctx.elapsed,
            },
        );
        next.answered.push(actor);

        let all_answered = next.scores.keys().all(|p| next.answers.contains_key(p));
        let event = TriviaEvent::Answered {
            player_id: actor,
            all_answered,
        };
        if all_answered {
            Ok(Transition::new(Self::reveal_and_score(&next), event).then(FollowUp::Reveal))
        } else {
            Ok(Transition::new(next, event))
        }
    }

    fn on_deadline(
        state: &TriviaState,
        _ctx: &ActionContext,
    ) -> Option<Transition<TriviaState, TriviaEvent>> {
        if state.phase != TriviaPhase::Question {
            return None;
        }
        let revealed = Self::reveal_and_score(state);
        let correct_index = revealed.correct_index;
        Some(Transition::new(revealed, TriviaEvent::TimeUp { correct_index }).then(FollowUp::Reveal))
    }

    fn advance<R: Rng + ?Sized>(
        state: &TriviaState,
        _rng: &mut R,
    ) -> Option<Advance<TriviaState, TriviaEvent>> {
        if state.phase != TriviaPhase::Reveal {
            return None;
        }
        Some(match Self::start_question(state) {
            Some(next) => {
                let index = next.question_index.unwrap_or(0);
                Advance::Next {
                    state: next,
                    event: TriviaEvent::NextQuestion { index },
                }
            }
            None => Advance::Finished(top_scorer(&state.players, &state.scores)),
        })
    }

    fn standings(state: &TriviaState) -> BTreeMap<PlayerId, u32> {
        state.scores.clone()
    }

    fn redact(state: &TriviaState, _viewer: PlayerId) -> TriviaState {
        if state.reveal_answer {
            return state.clone();
        }
        TriviaState {
            correct_index: None,
            ..state.clone()
        }
    }
}
