//! Error types for registry operations.

use arcade_games::LogicError;
use arcade_protocol::SessionId;

/// A rejected registry request. The session is never changed by a
/// rejected request.
///
/// Display strings are the player-facing messages; [`tag`](Self::tag)
/// is the stable code sent alongside them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Game not found")]
    NotFound(SessionId),

    #[error("Game already started")]
    AlreadyStarted(SessionId),

    #[error("Already in game")]
    AlreadyJoined(SessionId),

    #[error("Game full")]
    Full(SessionId),

    #[error("Game not active")]
    NotActive(SessionId),

    #[error("Not in game")]
    NotAPlayer(SessionId),

    /// Any mutation of a session that has already reached `Finished`.
    #[error("Game already finished")]
    Finished(SessionId),

    #[error("Invalid game type: {0}")]
    UnknownGameType(String),

    #[error("Invite expired or not found")]
    InviteNotFound(SessionId),

    #[error("Not invited to this game")]
    NotInvited(SessionId),

    #[error("Cannot invite yourself")]
    SelfInvite,

    /// The game's rules rejected the action.
    #[error(transparent)]
    Logic(#[from] LogicError),
}

impl RegistryError {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::AlreadyStarted(_) => "AlreadyStarted",
            Self::AlreadyJoined(_) => "AlreadyJoined",
            Self::Full(_) => "Full",
            Self::NotActive(_) => "NotActive",
            Self::NotAPlayer(_) => "NotAPlayer",
            Self::Finished(_) => "Finished",
            Self::UnknownGameType(_) => "UnknownGameType",
            Self::InviteNotFound(_) => "InviteNotFound",
            Self::NotInvited(_) => "NotInvited",
            Self::SelfInvite => "SelfInvite",
            Self::Logic(e) => e.tag(),
        }
    }
}
