//! Error types for the presence layer.

use arcade_protocol::PlayerId;

/// Errors raised while authenticating or tracking connected players.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The [`Authenticator`](crate::Authenticator) rejected the token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The player is not online.
    #[error("player {0} is not connected")]
    NotFound(PlayerId),

    /// The player already holds a live connection. A player may only be
    /// connected once at a time.
    #[error("player {0} is already connected")]
    AlreadyConnected(PlayerId),
}

impl PresenceError {
    /// Stable machine-readable tag sent to clients.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AuthFailed(_) => "AuthFailed",
            Self::NotFound(_) => "PlayerOffline",
            Self::AlreadyConnected(_) => "AlreadyConnected",
        }
    }
}
