//! The engine actor driven directly through its handle, no sockets.

use std::time::Duration;

use arcade::{Engine, EngineHandle};
use arcade_presence::Identity;
use arcade_protocol::{ClientMessage, FinishReason, PlayerId, ServerMessage, SessionId, Winner};
use arcade_registry::{Registry, RegistryConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver};

const ALICE: PlayerId = PlayerId(1);
const BOB: PlayerId = PlayerId(2);
const CAROL: PlayerId = PlayerId(3);

// =========================================================================
// Helpers
// =========================================================================

fn start_engine() -> EngineHandle {
    let (registry, expiries) =
        Registry::with_rng(RegistryConfig::default(), StdRng::seed_from_u64(11));
    let (engine, handle) = Engine::with_registry(registry, expiries);
    tokio::spawn(engine.run());
    handle
}

struct Player {
    id: PlayerId,
    inbox: UnboundedReceiver<ServerMessage>,
}

impl Player {
    /// Waits for the next message. Fails the test after a long timeout.
    async fn next(&mut self) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(3600), self.inbox.recv())
            .await
            .expect("message within timeout")
            .expect("outbox open")
    }

    /// Skips messages until one matches `pred`.
    async fn until(&mut self, pred: impl Fn(&ServerMessage) -> bool) -> ServerMessage {
        loop {
            let msg = self.next().await;
            if pred(&msg) {
                return msg;
            }
        }
    }

    /// Everything already queued, without waiting.
    fn drain(&mut self) -> Vec<ServerMessage> {
        std::iter::from_fn(|| self.inbox.try_recv().ok()).collect()
    }
}

async fn connect(engine: &EngineHandle, id: PlayerId, name: &str) -> Player {
    let (tx, inbox) = mpsc::unbounded_channel();
    engine
        .connect(Identity::new(id, name), tx)
        .await
        .expect("connect");
    let mut player = Player { id, inbox };
    assert!(matches!(player.next().await, ServerMessage::Welcome { player_id, .. } if player_id == id));
    assert!(matches!(player.next().await, ServerMessage::SessionList { .. }));
    player
}

fn send(engine: &EngineHandle, player: &Player, msg: ClientMessage) {
    engine.request(player.id, msg).expect("engine running");
}

async fn create(engine: &EngineHandle, host: &mut Player, game_type: &str) -> SessionId {
    send(
        engine,
        host,
        ClientMessage::Create {
            game_type: game_type.into(),
            max_players: None,
        },
    );
    match host.until(|m| matches!(m, ServerMessage::Created { .. })).await {
        ServerMessage::Created { session } => session.id,
        _ => unreachable!(),
    }
}

/// Alice hosts, Bob joins, both ready. Returns once both saw `started`.
async fn two_player_game(
    engine: &EngineHandle,
    alice: &mut Player,
    bob: &mut Player,
    game_type: &str,
) -> SessionId {
    let id = create(engine, alice, game_type).await;
    send(engine, bob, ClientMessage::Join { session_id: id });
    bob.until(|m| matches!(m, ServerMessage::Joined { .. })).await;
    send(engine, alice, ClientMessage::Ready { session_id: id });
    send(engine, bob, ClientMessage::Ready { session_id: id });
    alice.until(|m| matches!(m, ServerMessage::Started { .. })).await;
    bob.until(|m| matches!(m, ServerMessage::Started { .. })).await;
    id
}

fn is_error(code: &'static str) -> impl Fn(&ServerMessage) -> bool {
    move |m| matches!(m, ServerMessage::Error { code: c, .. } if c == code)
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_second_connection_for_same_player_is_rejected() {
    let engine = start_engine();
    let _alice = connect(&engine, ALICE, "alice").await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = engine
        .connect(Identity::new(ALICE, "alice again"), tx)
        .await
        .unwrap_err();
    assert_eq!(err.tag(), "AlreadyConnected");
}

#[tokio::test]
async fn test_create_broadcasts_lobby_to_everyone() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;

    let id = create(&engine, &mut alice, "wordScramble").await;
    match bob.next().await {
        ServerMessage::SessionList { sessions } => {
            assert_eq!(sessions.len(), 1);
            assert_eq!(sessions[0].id, id);
            assert_eq!(sessions[0].host_name, "alice");
        }
        other => panic!("expected session list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejections_reach_only_the_originator() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;

    send(
        &engine,
        &alice,
        ClientMessage::Create {
            game_type: "chess".into(),
            max_players: None,
        },
    );
    alice.until(is_error("UnknownGameType")).await;

    send(&engine, &alice, ClientMessage::Join { session_id: SessionId(404) });
    match alice.until(is_error("NotFound")).await {
        ServerMessage::Error { message, .. } => assert_eq!(message, "Game not found"),
        _ => unreachable!(),
    }

    // Round-trip something harmless so any stray error would be queued.
    send(&engine, &bob, ClientMessage::List);
    bob.until(|m| matches!(m, ServerMessage::SessionList { .. })).await;
    assert!(bob.drain().iter().all(|m| !matches!(m, ServerMessage::Error { .. })));
}

// =========================================================================
// Play
// =========================================================================

#[tokio::test]
async fn test_join_notifies_the_rest_of_the_session() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;

    let id = create(&engine, &mut alice, "ticTacToe").await;
    send(&engine, &bob, ClientMessage::Join { session_id: id });

    match bob.until(|m| matches!(m, ServerMessage::Joined { .. })).await {
        ServerMessage::Joined { session } => {
            assert_eq!(session.players.len(), 2);
            assert_eq!(session.host_name, "alice");
        }
        _ => unreachable!(),
    }
    match alice.until(|m| matches!(m, ServerMessage::PlayerJoined { .. })).await {
        ServerMessage::PlayerJoined {
            session_id,
            player_id,
            display_name,
        } => {
            assert_eq!(session_id, id);
            assert_eq!(player_id, BOB);
            assert_eq!(display_name, "bob");
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_tic_tac_toe_over_the_engine() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;
    let id = two_player_game(&engine, &mut alice, &mut bob, "ticTacToe").await;

    // Out of turn.
    send(
        &engine,
        &bob,
        ClientMessage::Action {
            session_id: id,
            action_type: "place".into(),
            data: json!({ "cellIndex": 4 }),
        },
    );
    bob.until(is_error("NotYourTurn")).await;

    for (player, cell) in [(ALICE, 0), (BOB, 3), (ALICE, 1), (BOB, 4), (ALICE, 2)] {
        engine
            .request(
                player,
                ClientMessage::Action {
                    session_id: id,
                    action_type: "place".into(),
                    data: json!({ "cellIndex": cell }),
                },
            )
            .unwrap();
    }

    match bob.until(|m| matches!(m, ServerMessage::GameOver { .. })).await {
        ServerMessage::GameOver {
            session_id,
            scores,
            winner,
            reason,
        } => {
            assert_eq!(session_id, id);
            assert_eq!(winner, Some(Winner::Player(ALICE)));
            assert_eq!(reason, FinishReason::Completed);
            assert_eq!(scores[&ALICE].score, 1);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_leaving_mid_game_forfeits() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;
    let id = two_player_game(&engine, &mut alice, &mut bob, "connectFour").await;

    send(&engine, &alice, ClientMessage::Leave { session_id: id });

    assert!(matches!(
        bob.until(|m| matches!(m, ServerMessage::PlayerLeft { .. })).await,
        ServerMessage::PlayerLeft { player_id, .. } if player_id == ALICE
    ));
    match bob.next().await {
        ServerMessage::GameOver { winner, reason, .. } => {
            assert_eq!(winner, Some(Winner::Player(BOB)));
            assert_eq!(reason, FinishReason::PlayerLeft);
        }
        other => panic!("expected game over, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_leaves_every_session() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;
    let id = two_player_game(&engine, &mut alice, &mut bob, "rps").await;

    engine.disconnect(ALICE);

    match bob.until(|m| matches!(m, ServerMessage::GameOver { .. })).await {
        ServerMessage::GameOver {
            session_id,
            winner,
            reason,
            ..
        } => {
            assert_eq!(session_id, id);
            assert_eq!(winner, Some(Winner::Player(BOB)));
            assert_eq!(reason, FinishReason::PlayerLeft);
        }
        _ => unreachable!(),
    }
    // Alice's outbox is closed once the engine lets go of it.
    loop {
        match alice.inbox.recv().await {
            Some(_) => continue,
            None => break,
        }
    }
}

// =========================================================================
// Draw & Guess confidentiality
// =========================================================================

#[tokio::test]
async fn test_word_choices_reach_only_the_drawer() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;
    let id = two_player_game(&engine, &mut alice, &mut bob, "drawGuess").await;

    // After `started` the drawer gets `drawerInfo`, then everyone gets the
    // lobby update.
    let mut drawers = Vec::new();
    for p in [&mut alice, &mut bob] {
        match p.next().await {
            ServerMessage::DrawerInfo {
                session_id,
                word_choices,
            } => {
                assert_eq!(session_id, id);
                assert_eq!(word_choices.len(), 3);
                drawers.push(p.id);
                assert!(matches!(p.next().await, ServerMessage::SessionList { .. }));
            }
            ServerMessage::SessionList { .. } => {}
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(drawers.len(), 1);
}

#[tokio::test]
async fn test_strokes_relay_from_the_drawer_only() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;
    let mut carol = connect(&engine, CAROL, "carol").await;

    let id = create(&engine, &mut alice, "drawGuess").await;
    send(&engine, &bob, ClientMessage::Join { session_id: id });
    bob.until(|m| matches!(m, ServerMessage::Joined { .. })).await;
    send(&engine, &carol, ClientMessage::Join { session_id: id });
    carol.until(|m| matches!(m, ServerMessage::Joined { .. })).await;
    for p in [&alice, &bob, &carol] {
        send(&engine, p, ClientMessage::Ready { session_id: id });
    }

    let mut drawer = None;
    for p in [&mut alice, &mut bob, &mut carol] {
        p.until(|m| matches!(m, ServerMessage::Started { .. })).await;
        if matches!(p.next().await, ServerMessage::DrawerInfo { .. }) {
            assert!(drawer.replace(p.id).is_none(), "two drawers");
            p.next().await;
        }
    }
    let drawer = drawer.expect("someone draws");
    let guesser = [ALICE, BOB, CAROL]
        .into_iter()
        .find(|&p| p != drawer)
        .expect("a guesser");

    engine
        .request(
            guesser,
            ClientMessage::DrawStroke {
                session_id: id,
                stroke: json!({ "x": 1 }),
            },
        )
        .unwrap();
    engine
        .request(
            drawer,
            ClientMessage::DrawStroke {
                session_id: id,
                stroke: json!({ "x": 2 }),
            },
        )
        .unwrap();

    // A `list` round trip flushes everything relayed before it.
    for p in [&mut alice, &mut bob, &mut carol] {
        send(&engine, p, ClientMessage::List);
        let mut strokes = Vec::new();
        loop {
            match p.next().await {
                ServerMessage::DrawStroke { stroke, .. } => strokes.push(stroke),
                ServerMessage::SessionList { .. } => break,
                _ => {}
            }
        }
        if p.id == drawer {
            assert!(strokes.is_empty());
        } else {
            assert_eq!(strokes, vec![json!({ "x": 2 })]);
        }
    }
}

// =========================================================================
// Invites
// =========================================================================

#[tokio::test]
async fn test_invite_to_offline_player_is_rejected() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    send(
        &engine,
        &alice,
        ClientMessage::Invite {
            target_id: BOB,
            game_type: "rps".into(),
        },
    );
    alice.until(is_error("PlayerOffline")).await;
}

#[tokio::test]
async fn test_invite_accept_and_decline() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;

    let invite = |engine: &EngineHandle| {
        engine
            .request(
                ALICE,
                ClientMessage::Invite {
                    target_id: BOB,
                    game_type: "connectFour".into(),
                },
            )
            .unwrap();
    };

    // Declined.
    invite(&engine);
    let declined_id = match alice.until(|m| matches!(m, ServerMessage::InviteSent { .. })).await {
        ServerMessage::InviteSent { session_id, .. } => session_id,
        _ => unreachable!(),
    };
    match bob.until(|m| matches!(m, ServerMessage::Invited { .. })).await {
        ServerMessage::Invited {
            session_id,
            inviter_id,
            inviter_name,
            label,
            ..
        } => {
            assert_eq!(session_id, declined_id);
            assert_eq!(inviter_id, ALICE);
            assert_eq!(inviter_name, "alice");
            assert_eq!(label, "Connect Four");
        }
        _ => unreachable!(),
    }
    send(&engine, &bob, ClientMessage::InviteDecline { session_id: declined_id });
    match alice.until(|m| matches!(m, ServerMessage::InviteDeclined { .. })).await {
        ServerMessage::InviteDeclined { decliner_name, .. } => assert_eq!(decliner_name, "bob"),
        _ => unreachable!(),
    }

    // Accepted.
    invite(&engine);
    let id = match bob.until(|m| matches!(m, ServerMessage::Invited { .. })).await {
        ServerMessage::Invited { session_id, .. } => session_id,
        _ => unreachable!(),
    };
    send(&engine, &bob, ClientMessage::InviteAccept { session_id: id });
    match bob.until(|m| matches!(m, ServerMessage::Joined { .. })).await {
        ServerMessage::Joined { session } => {
            assert_eq!(session.id, id);
            assert_eq!(session.host_id, ALICE);
        }
        _ => unreachable!(),
    }
    alice
        .until(|m| matches!(m, ServerMessage::PlayerJoined { player_id, .. } if *player_id == BOB))
        .await;
}

// =========================================================================
// Timers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_trivia_deadline_pushes_time_up_to_everyone() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let mut bob = connect(&engine, BOB, "bob").await;
    let id = two_player_game(&engine, &mut alice, &mut bob, "triviaQuiz").await;

    for p in [&mut alice, &mut bob] {
        match p
            .until(|m| matches!(m, ServerMessage::StateUpdate { event, .. } if event["type"] == "timeUp"))
            .await
        {
            ServerMessage::StateUpdate {
                session_id, state, ..
            } => {
                assert_eq!(session_id, id);
                let state = state.expect("state");
                assert_eq!(state["phase"], "reveal");
                assert!(state.get("correctIndex").is_some());
            }
            _ => unreachable!(),
        }
        match p
            .until(|m| matches!(m, ServerMessage::StateUpdate { event, .. } if event["type"] == "nextQuestion"))
            .await
        {
            ServerMessage::StateUpdate { state, .. } => {
                assert!(state.expect("state").get("correctIndex").is_none());
            }
            _ => unreachable!(),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_idle_session_is_swept_from_the_lobby() {
    let engine = start_engine();
    let mut alice = connect(&engine, ALICE, "alice").await;
    let _id = create(&engine, &mut alice, "ticTacToe").await;
    assert!(matches!(alice.next().await, ServerMessage::SessionList { ref sessions } if sessions.len() == 1));

    // Idle timeout is 10 minutes, the sweep runs every 5.
    match alice.next().await {
        ServerMessage::SessionList { sessions } => assert!(sessions.is_empty()),
        other => panic!("expected eviction broadcast, got {other:?}"),
    }
}
