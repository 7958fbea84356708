//! Player identity and presence for the arcade engine.
//!
//! Two concerns live here:
//!
//! 1. **Authentication**: turning a handshake token into an [`Identity`]
//!    (player id plus display name) through the [`Authenticator`] trait.
//! 2. **Presence**: knowing who is online right now and how to reach
//!    them ([`Presence`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Engine (above)      ← addresses outbound messages through Presence
//!     ↕
//! Presence (this crate)  ← who is connected, under which name
//!     ↕
//! Protocol (below)    ← provides PlayerId
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod directory;
mod error;

pub use auth::{Authenticator, Identity};
pub use directory::{Online, Presence};
pub use error::PresenceError;
