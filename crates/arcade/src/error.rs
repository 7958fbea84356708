//! Unified error type for the arcade engine.

use arcade_presence::PresenceError;
use arcade_protocol::ProtocolError;
use arcade_registry::RegistryError;
use arcade_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ArcadeError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Authentication or presence failed.
    #[error(transparent)]
    Presence(#[from] PresenceError),

    /// A registry operation was rejected.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The engine task has stopped.
    #[error("engine is no longer running")]
    EngineClosed,
}

impl ArcadeError {
    /// Stable machine-readable tag, as sent in `error` messages.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TransportError",
            Self::Protocol(ProtocolError::UnknownGameType(_)) => "UnknownGameType",
            Self::Protocol(_) => "BadMessage",
            Self::Presence(e) => e.tag(),
            Self::Registry(e) => e.tag(),
            Self::EngineClosed => "Unavailable",
        }
    }
}
