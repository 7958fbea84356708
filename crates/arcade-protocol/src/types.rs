//! Core protocol types for the arcade wire format.
//!
//! Everything in this module travels between the engine and clients:
//! identity newtypes, the game catalogue, lobby summaries, session views,
//! and the two top-level message enums ([`ClientMessage`] inbound,
//! [`ServerMessage`] outbound).
//!
//! Messages are internally tagged JSON objects with camelCase field
//! names, e.g. `{ "type": "join", "sessionId": 3 }`, which is what the
//! browser client already speaks.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player, issued by the identity service.
///
/// Newtype over `u64` so a `SessionId` can never be passed where a player
/// is expected. `#[serde(transparent)]` keeps it a bare number on the
/// wire, and `Ord` lets it key the `BTreeMap`s used for scores so every
/// serialized map comes out in a stable order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for one game session.
///
/// Issued by the registry from a monotonically increasing counter and
/// never reused for the registry's lifetime, so a client holding a stale
/// id can only ever get `NotFound`, never someone else's game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// GameType
// ---------------------------------------------------------------------------

/// The six mini-games the engine can host.
///
/// A session's game type is fixed at creation. The serde names are the
/// short identifiers the client uses (`"rps"`, `"drawGuess"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameType {
    #[serde(rename = "ticTacToe")]
    TicTacToe,
    #[serde(rename = "rps")]
    RockPaperScissors,
    #[serde(rename = "connectFour")]
    ConnectFour,
    #[serde(rename = "drawGuess")]
    DrawAndGuess,
    #[serde(rename = "wordScramble")]
    WordScramble,
    #[serde(rename = "triviaQuiz")]
    TriviaQuiz,
}

impl GameType {
    /// Every game type, in catalogue order.
    pub const ALL: [GameType; 6] = [
        GameType::TicTacToe,
        GameType::RockPaperScissors,
        GameType::ConnectFour,
        GameType::DrawAndGuess,
        GameType::WordScramble,
        GameType::TriviaQuiz,
    ];

    /// The wire identifier, identical to the serde name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TicTacToe => "ticTacToe",
            Self::RockPaperScissors => "rps",
            Self::ConnectFour => "connectFour",
            Self::DrawAndGuess => "drawGuess",
            Self::WordScramble => "wordScramble",
            Self::TriviaQuiz => "triviaQuiz",
        }
    }

    /// Human-readable name shown in invite prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::TicTacToe => "Tic-Tac-Toe",
            Self::RockPaperScissors => "Rock Paper Scissors",
            Self::ConnectFour => "Connect Four",
            Self::DrawAndGuess => "Draw & Guess",
            Self::WordScramble => "Word Scramble",
            Self::TriviaQuiz => "Trivia Quiz",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownGameType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a session.
///
/// One-way only:
///
/// ```text
/// Waiting → Playing → Finished
/// ```
///
/// A `Waiting` session may also be deleted outright (last player left,
/// invite declined or expired) without ever visiting the later states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Playing,
    Finished,
}

impl SessionStatus {
    /// Returns `true` if players may still join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` while a game is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns `true` once the session has been finalized.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The only status this one may advance to.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` respects the one-way order.
    ///
    /// `Waiting → Finished` is allowed as well: a forfeit or eviction can
    /// finalize a session that never started.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target) || (self == Self::Waiting && target == Self::Finished)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who an outbound message is addressed to, relative to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every current member of the session.
    All,
    /// One specific player.
    Player(PlayerId),
    /// Every member except one (typically the actor, who got a direct reply).
    AllExcept(PlayerId),
}

impl Recipient {
    /// Returns `true` if `player` is addressed by this recipient.
    pub fn includes(&self, player: PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(p) => *p == player,
            Self::AllExcept(p) => *p != player,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The winner of a finished game: one player, or a draw.
///
/// On the wire this is either the player's numeric id or the string
/// `"draw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Player(PlayerId),
    Draw,
}

impl Serialize for Winner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Player(id) => serializer.serialize_u64(id.0),
            Self::Draw => serializer.serialize_str("draw"),
        }
    }
}

impl<'de> Deserialize<'de> for Winner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Ok(Self::Player(PlayerId(id))),
            Raw::Text(text) if text == "draw" => Ok(Self::Draw),
            Raw::Text(text) => text
                .parse::<u64>()
                .map(|id| Self::Player(PlayerId(id)))
                .map_err(|_| D::Error::custom(format!("invalid winner: {text}"))),
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(id) => write!(f, "{id}"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// One player's line on the final scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub display_name: String,
    pub score: u32,
}

/// Final scoreboard keyed by player id.
pub type Scoreboard = BTreeMap<PlayerId, ScoreEntry>;

/// Why a session was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinishReason {
    /// The game reached a terminal state by its own rules.
    Completed,
    /// An opponent left mid-game; the remaining players win by forfeit.
    PlayerLeft,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A lobby row: enough to decide whether to join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub game_type: GameType,
    pub host_name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub status: SessionStatus,
}

/// A player as shown inside a session view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub display_name: String,
    pub ready: bool,
    pub score: u32,
}

/// A full session snapshot rendered for one viewer.
///
/// `state` is the game state after redaction for that viewer, already in
/// JSON form; the protocol layer never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: SessionId,
    pub game_type: GameType,
    pub status: SessionStatus,
    pub host_id: PlayerId,
    pub host_name: String,
    pub min_players: usize,
    pub max_players: usize,
    pub players: Vec<PlayerView>,
    pub state: Option<Value>,
}

// ---------------------------------------------------------------------------
// ClientMessage: player → engine
// ---------------------------------------------------------------------------

/// Every message a client can send.
///
/// The sender's identity is never part of the payload: it comes from the
/// authenticated connection.
///
/// `game_type` stays a string here so an unknown game is reported as a
/// typed `UnknownGameType` rejection instead of a generic decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// First frame on every connection.
    Handshake { token: String },
    /// Keep-alive; echoed with the server clock.
    Heartbeat { client_time: u64 },
    /// Request the open-session list.
    List,
    /// Create a new session and become its host.
    Create {
        game_type: String,
        #[serde(default)]
        max_players: Option<usize>,
    },
    Join { session_id: SessionId },
    Leave { session_id: SessionId },
    Ready { session_id: SessionId },
    /// A game move. `action_type` is the game verb (`place`, `drop`,
    /// `pick`, `answer`, `guess`, `chooseWord`) and `data` its payload.
    Action {
        session_id: SessionId,
        action_type: String,
        #[serde(default)]
        data: Value,
    },
    /// Drawing data from the current Draw & Guess drawer, relayed as-is.
    DrawStroke { session_id: SessionId, stroke: Value },
    Invite { target_id: PlayerId, game_type: String },
    InviteAccept { session_id: SessionId },
    InviteDecline { session_id: SessionId },
}

// ---------------------------------------------------------------------------
// ServerMessage: engine → player
// ---------------------------------------------------------------------------

/// Every message the engine can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Handshake accepted.
    Welcome {
        player_id: PlayerId,
        display_name: String,
    },
    HeartbeatAck { client_time: u64, server_time: u64 },
    /// Open sessions, pushed to every lobby watcher on any change.
    SessionList { sessions: Vec<SessionSummary> },
    /// To the creator of a new session.
    Created { session: SessionView },
    /// To a player who just joined (directly or by accepting an invite).
    Joined { session: SessionView },
    PlayerJoined {
        session_id: SessionId,
        player_id: PlayerId,
        display_name: String,
    },
    PlayerLeft {
        session_id: SessionId,
        player_id: PlayerId,
    },
    PlayerReady {
        session_id: SessionId,
        player_id: PlayerId,
    },
    /// The ready quorum was reached; carries the initial redacted state.
    Started { session: SessionView },
    /// Draw & Guess only, addressed to the current drawer alone.
    DrawerInfo {
        session_id: SessionId,
        word_choices: Vec<String>,
    },
    /// After every accepted action and every timer-driven phase change.
    StateUpdate {
        session_id: SessionId,
        state: Option<Value>,
        event: Value,
    },
    /// Exactly once per session, at finalization.
    GameOver {
        session_id: SessionId,
        scores: Scoreboard,
        winner: Option<Winner>,
        reason: FinishReason,
    },
    /// A rejected request; only the originator receives it.
    Error { code: String, message: String },
    Invited {
        session_id: SessionId,
        game_type: GameType,
        inviter_id: PlayerId,
        inviter_name: String,
        label: String,
    },
    InviteSent {
        session_id: SessionId,
        game_type: GameType,
    },
    InviteDeclined {
        session_id: SessionId,
        decliner_name: String,
    },
    DrawStroke { session_id: SessionId, stroke: Value },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display() {
        assert_eq!(PlayerId(42).to_string(), "P-42");
        assert_eq!(SessionId(7).to_string(), "S-7");
    }

    #[test]
    fn test_player_id_serializes_transparently() {
        assert_eq!(serde_json::to_string(&PlayerId(9)).unwrap(), "9");
    }

    #[test]
    fn test_game_type_wire_names_round_trip_through_from_str() {
        for t in GameType::ALL {
            assert_eq!(t.as_str().parse::<GameType>().unwrap(), t);
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_game_type_from_str_rejects_unknown() {
        let err = "chess".parse::<GameType>().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownGameType(ref s) if s == "chess"));
    }

    #[test]
    fn test_status_transitions_are_one_way() {
        assert_eq!(SessionStatus::Waiting.next(), Some(SessionStatus::Playing));
        assert_eq!(SessionStatus::Playing.next(), Some(SessionStatus::Finished));
        assert_eq!(SessionStatus::Finished.next(), None);
        assert!(SessionStatus::Waiting.can_transition_to(SessionStatus::Finished));
        assert!(!SessionStatus::Finished.can_transition_to(SessionStatus::Waiting));
        assert!(!SessionStatus::Playing.can_transition_to(SessionStatus::Waiting));
    }

    #[test]
    fn test_status_predicates() {
        assert!(SessionStatus::Waiting.is_joinable());
        assert!(!SessionStatus::Playing.is_joinable());
        assert!(SessionStatus::Playing.is_active());
        assert!(SessionStatus::Finished.is_finished());
    }

    #[test]
    fn test_recipient_includes() {
        let me = PlayerId(1);
        let you = PlayerId(2);
        assert!(Recipient::All.includes(me));
        assert!(Recipient::Player(me).includes(me));
        assert!(!Recipient::Player(me).includes(you));
        assert!(!Recipient::AllExcept(me).includes(me));
        assert!(Recipient::AllExcept(me).includes(you));
    }

    #[test]
    fn test_winner_wire_format() {
        assert_eq!(serde_json::to_string(&Winner::Player(PlayerId(5))).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Winner::Draw).unwrap(), "\"draw\"");

        let w: Winner = serde_json::from_str("\"draw\"").unwrap();
        assert_eq!(w, Winner::Draw);
        let w: Winner = serde_json::from_str("5").unwrap();
        assert_eq!(w, Winner::Player(PlayerId(5)));
        let w: Winner = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(w, Winner::Player(PlayerId(12)));
        assert!(serde_json::from_str::<Winner>("\"nobody\"").is_err());
    }

    #[test]
    fn test_client_action_decodes_with_camel_case_fields() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"action","sessionId":3,"actionType":"place","data":{"cellIndex":4}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Action { session_id, action_type, data } => {
                assert_eq!(session_id, SessionId(3));
                assert_eq!(action_type, "place");
                assert_eq!(data["cellIndex"], 4);
            }
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn test_client_action_data_defaults_to_null() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"action","sessionId":3,"actionType":"pick"}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMessage::Action { data: Value::Null, .. }));
    }

    #[test]
    fn test_scoreboard_serializes_player_keys_as_strings() {
        let mut scores = Scoreboard::new();
        scores.insert(
            PlayerId(2),
            ScoreEntry { display_name: "bo".into(), score: 1 },
        );
        let json = serde_json::to_value(ServerMessage::GameOver {
            session_id: SessionId(1),
            scores,
            winner: Some(Winner::Player(PlayerId(2))),
            reason: FinishReason::PlayerLeft,
        })
        .unwrap();
        assert_eq!(json["scores"]["2"]["displayName"], "bo");
        assert_eq!(json["winner"], 2);
        assert_eq!(json["reason"], "playerLeft");
    }
}
