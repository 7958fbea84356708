//! Timer-driven phases under a paused clock.
//!
//! With `start_paused`, awaiting the expiry channel lets Tokio jump the
//! clock straight to the next deadline.

use std::time::Duration;

use arcade_protocol::{PlayerId, SessionId, SessionStatus};
use arcade_registry::{
    Expired, ReadyOutcome, Registry, RegistryConfig, RegistryTimer, TimerOutcome, TimerSlot,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedReceiver;

const A: PlayerId = PlayerId(1);
const B: PlayerId = PlayerId(2);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Expiries = UnboundedReceiver<Expired<RegistryTimer>>;

fn registry() -> (Registry, Expiries) {
    Registry::with_rng(RegistryConfig::default(), StdRng::seed_from_u64(314))
}

fn started(reg: &mut Registry, game_type: &str) -> SessionId {
    let id = reg.create_session(A, "alice", game_type, None).unwrap().id();
    reg.join_session(id, B, "bob").unwrap();
    reg.set_ready(id, A).unwrap();
    assert_eq!(reg.set_ready(id, B).unwrap(), ReadyOutcome::Started);
    id
}

/// The unredacted state as JSON, for reading secrets in assertions.
fn full_state(reg: &Registry, id: SessionId) -> Value {
    serde_json::to_value(reg.session(id).unwrap().state().unwrap()).unwrap()
}

fn score(reg: &Registry, id: SessionId, player: PlayerId) -> u32 {
    reg.session(id)
        .unwrap()
        .players()
        .iter()
        .find(|p| p.player_id == player)
        .map(|p| p.score)
        .unwrap()
}

async fn next_phase(reg: &mut Registry, rx: &mut Expiries) -> arcade_registry::PhaseOutcome {
    let expired = rx.recv().await.expect("timer channel open");
    match reg.handle_timer(expired) {
        Some(TimerOutcome::Phase(phase)) => phase,
        other => panic!("expected a phase change, got {other:?}"),
    }
}

/// Lets spawned timer tasks deliver what is already due.
async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// Trivia
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn trivia_timeout_scores_only_the_answered_player() {
    let (mut reg, mut rx) = registry();
    let id = started(&mut reg, "triviaQuiz");
    assert!(reg.session(id).unwrap().timers().is_armed(TimerSlot::Turn));

    let correct = full_state(&reg, id)["correctIndex"].as_u64().unwrap();
    let out = reg
        .apply_action(id, A, "answer", json!({ "optionIndex": correct }))
        .unwrap();
    assert_eq!(out.event["allAnswered"], false);

    // Question deadline.
    let phase = next_phase(&mut reg, &mut rx).await;
    let event = phase.event.unwrap();
    assert_eq!(event["type"], "timeUp");
    assert_eq!(event["correctIndex"], correct);
    assert!(!phase.next_unit);
    assert!(phase.finished.is_none());
    assert_eq!(score(&reg, id, A), 150);
    assert_eq!(score(&reg, id, B), 0);
    assert!(reg.session(id).unwrap().timers().is_armed(TimerSlot::Reveal));

    // Reveal delay, then the next question.
    let phase = next_phase(&mut reg, &mut rx).await;
    assert!(phase.next_unit);
    assert_eq!(phase.event.unwrap()["type"], "nextQuestion");

    let state = reg.view(id, B).unwrap().state.unwrap();
    assert_eq!(state["questionIndex"], 1);
    assert_eq!(state["phase"], "question");
    assert_eq!(state["answered"], json!([]));
    assert!(state.get("correctIndex").is_none());
    assert!(reg.session(id).unwrap().timers().is_armed(TimerSlot::Turn));
}

#[tokio::test(start_paused = true)]
async fn all_answers_in_cancels_the_question_deadline() {
    let (mut reg, mut rx) = registry();
    let id = started(&mut reg, "triviaQuiz");

    reg.apply_action(id, A, "answer", json!({ "optionIndex": 0 })).unwrap();
    let out = reg
        .apply_action(id, B, "answer", json!({ "optionIndex": 1 }))
        .unwrap();
    assert_eq!(out.event["allAnswered"], true);

    let timers = reg.session(id).unwrap().timers();
    assert!(!timers.is_armed(TimerSlot::Turn));
    assert!(timers.is_armed(TimerSlot::Reveal));

    // The next expiry is the 3 s reveal, not the 15 s deadline.
    let started_at = tokio::time::Instant::now();
    let phase = next_phase(&mut reg, &mut rx).await;
    let waited = started_at.elapsed();
    assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(15));
    assert!(phase.next_unit);
}

#[tokio::test(start_paused = true)]
async fn deadline_that_lost_the_race_is_ignored() {
    let (mut reg, mut rx) = registry();
    let id = started(&mut reg, "triviaQuiz");

    // The deadline fires and queues, but is not handled yet.
    tokio::time::advance(Duration::from_secs(15)).await;
    settle().await;
    let late = rx.try_recv().expect("deadline queued");

    // Both answers land first.
    reg.apply_action(id, A, "answer", json!({ "optionIndex": 0 })).unwrap();
    reg.apply_action(id, B, "answer", json!({ "optionIndex": 0 })).unwrap();
    let before = reg.session(id).unwrap().state().cloned();

    assert_eq!(reg.handle_timer(late), None);
    assert_eq!(reg.session(id).unwrap().state().cloned(), before);
    assert!(reg.session(id).unwrap().timers().is_armed(TimerSlot::Reveal));
}

#[tokio::test(start_paused = true)]
async fn timer_queued_before_forfeit_is_ignored() {
    let (mut reg, mut rx) = registry();
    let id = started(&mut reg, "triviaQuiz");

    tokio::time::advance(Duration::from_secs(15)).await;
    settle().await;
    let late = rx.try_recv().expect("deadline queued");

    reg.leave_session(id, B).unwrap();
    assert_eq!(reg.handle_timer(late), None);
    assert_eq!(reg.session(id).unwrap().status(), SessionStatus::Finished);
}

#[tokio::test(start_paused = true)]
async fn trivia_runs_to_completion_on_timers_alone() {
    let (mut reg, mut rx) = registry();
    let id = started(&mut reg, "triviaQuiz");

    let mut questions_seen = 1;
    let result = loop {
        let phase = next_phase(&mut reg, &mut rx).await;
        if let Some(result) = phase.finished {
            break result;
        }
        if phase.next_unit {
            questions_seen += 1;
        }
    };

    assert_eq!(questions_seen, 10);
    // Nobody scored; the first joiner takes the tie.
    assert_eq!(result.winner, Some(arcade_protocol::Winner::Player(A)));
    assert_eq!(reg.session(id).unwrap().status(), SessionStatus::Finished);
    assert!(reg.session(id).unwrap().timers().is_empty());
}

// ---------------------------------------------------------------------------
// Word scramble
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn scramble_timeout_reveals_then_starts_next_round() {
    let (mut reg, mut rx) = registry();
    let id = started(&mut reg, "wordScramble");
    let word = full_state(&reg, id)["correctWord"].as_str().unwrap().to_owned();
    assert!(reg.view(id, A).unwrap().state.unwrap().get("correctWord").is_none());

    let phase = next_phase(&mut reg, &mut rx).await;
    let event = phase.event.unwrap();
    assert_eq!(event["type"], "timeUp");
    assert_eq!(event["word"], word.as_str());
    assert_eq!(reg.view(id, B).unwrap().state.unwrap()["correctWord"], word.as_str());
    assert!(reg.session(id).unwrap().timers().is_armed(TimerSlot::Advance));

    let phase = next_phase(&mut reg, &mut rx).await;
    assert!(phase.next_unit);
    let event = phase.event.unwrap();
    assert_eq!(event["type"], "nextRound");
    assert_eq!(event["round"], 2);
}

#[tokio::test(start_paused = true)]
async fn scramble_correct_answer_scores_by_speed() {
    let (mut reg, _rx) = registry();
    let id = started(&mut reg, "wordScramble");
    let word = full_state(&reg, id)["correctWord"].as_str().unwrap().to_lowercase();

    tokio::time::advance(Duration::from_secs(15)).await;
    let err = reg
        .apply_action(id, A, "answer", json!({ "text": "NOPE" }))
        .unwrap_err();
    assert_eq!(err.tag(), "WrongAnswer");

    let out = reg
        .apply_action(id, B, "answer", json!({ "text": format!("  {word} ") }))
        .unwrap();
    assert_eq!(out.event["type"], "correct");
    assert_eq!(out.event["points"], 125);
    assert_eq!(score(&reg, id, B), 125);

    let timers = reg.session(id).unwrap().timers();
    assert!(!timers.is_armed(TimerSlot::Turn));
    assert!(timers.is_armed(TimerSlot::Advance));
}

// ---------------------------------------------------------------------------
// Draw & guess
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn draw_guess_turn_rotation() {
    let (mut reg, mut rx) = registry();
    let id = started(&mut reg, "drawGuess");

    let (drawer, choices) = reg.drawer_info(id).unwrap();
    assert_eq!(choices.len(), 3);
    assert_eq!(reg.current_drawer(id), Some(drawer));
    let guesser = if drawer == A { B } else { A };
    assert!(reg.view(id, guesser).unwrap().state.unwrap().get("wordChoices").is_none());

    reg.apply_action(id, drawer, "chooseWord", json!({ "wordIndex": 1 })).unwrap();
    let secret = choices[1].clone();
    let out = reg
        .apply_action(id, guesser, "guess", json!({ "text": secret.to_uppercase() }))
        .unwrap();
    assert_eq!(out.event["type"], "correctGuess");
    assert_eq!(out.event["allGuessed"], true);
    assert_eq!(score(&reg, id, guesser), 150);
    assert_eq!(score(&reg, id, drawer), 30);

    let phase = next_phase(&mut reg, &mut rx).await;
    assert!(phase.next_unit);
    let event = phase.event.unwrap();
    assert_eq!(event["type"], "nextTurn");
    let (next_drawer, _) = reg.drawer_info(id).unwrap();
    assert_eq!(event["drawerId"], next_drawer.0);
    assert_ne!(next_drawer, drawer);
}
