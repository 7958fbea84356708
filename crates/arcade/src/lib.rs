//! # Arcade
//!
//! An authoritative session engine for small real-time mini-games:
//! Tic-Tac-Toe, Rock-Paper-Scissors, Connect Four, Draw & Guess, Word
//! Scramble, and Trivia Quiz.
//!
//! Players connect over WebSocket, authenticate once, and then browse,
//! create, join, and play sessions. All game rules run on the server; a
//! single engine task owns every session so no two operations ever
//! interleave.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arcade::prelude::*;
//!
//! struct AnyoneAuth;
//!
//! impl Authenticator for AnyoneAuth {
//!     async fn authenticate(&self, token: &str) -> Result<Identity, PresenceError> {
//!         let id = token
//!             .parse()
//!             .map_err(|_| PresenceError::AuthFailed("expected a numeric id".into()))?;
//!         Ok(Identity::new(PlayerId(id), format!("player-{id}")))
//!     }
//! }
//!
//! # async fn start() -> Result<(), ArcadeError> {
//! let server = ArcadeServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(AnyoneAuth)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod dispatch;
mod engine;
mod error;
mod handler;
mod server;

pub use engine::{Engine, EngineHandle, Outbox};
pub use error::ArcadeError;
pub use server::{ArcadeServer, ArcadeServerBuilder, DEFAULT_READ_TIMEOUT};

/// Everything needed to stand up a server.
pub mod prelude {
    pub use crate::{ArcadeError, ArcadeServer, ArcadeServerBuilder};
    pub use arcade_presence::{Authenticator, Identity, PresenceError};
    pub use arcade_protocol::{
        ClientMessage, GameType, PlayerId, ServerMessage, SessionId, SessionStatus, Winner,
    };
    pub use arcade_registry::RegistryConfig;
}
