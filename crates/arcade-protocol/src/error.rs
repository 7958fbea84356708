//! Error types for the protocol layer.
//!
//! Each arcade crate defines its own error enum, so a `ProtocolError`
//! always means the problem is in the shape of a message, not in game
//! rules or session bookkeeping.

/// Errors that can occur while encoding, decoding, or interpreting
/// wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or an
    /// unknown message `type`.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The game type name is not one of the six known games.
    #[error("unknown game type: {0}")]
    UnknownGameType(String),

    /// The message decoded fine but violates protocol rules, e.g. a
    /// non-handshake first frame.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
