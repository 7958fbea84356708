//! Wire protocol for the arcade engine.
//!
//! This crate defines the "language" spoken between players and the
//! engine:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`SessionView`],
//!   [`GameType`], ...): what travels on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   turned into frame bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! It knows nothing about connections, sessions, or game rules.
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → Engine (registry ops)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientMessage, FinishReason, GameType, PlayerId, PlayerView, Recipient, ScoreEntry,
    Scoreboard, ServerMessage, SessionId, SessionStatus, SessionSummary, SessionView, Winner,
};
