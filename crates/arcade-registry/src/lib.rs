//! The session registry: every live mini-game session on the server.
//!
//! The [`Registry`] owns the session map and is the only thing that ever
//! mutates it. It drives each session through its lifecycle:
//!
//! ```text
//! create ──→ Waiting ──(all ready)──→ Playing ──(game over / forfeit)──→ Finished ──(grace)──→ purged
//!               │
//!               └──(last player leaves / idle / invite expires)──→ deleted
//! ```
//!
//! Game rules live in `arcade-games`; the registry only holds each
//! session's opaque [`GameState`](arcade_games::GameState) and replaces it
//! wholesale on every accepted transition. Phase deadlines come from
//! `arcade-scheduler`: the registry arms them, and the owner feeds each
//! expiry back through [`Registry::handle_timer`].
//!
//! The registry is synchronous and single-owner. Put it behind one task
//! and every operation, including timer callbacks, runs one at a time.

mod config;
mod error;
mod invite;
mod outcome;
mod phase;
mod registry;
mod session;

pub use arcade_scheduler::{Expired, TimerSlot};
pub use config::RegistryConfig;
pub use error::RegistryError;
pub use invite::Invite;
pub use outcome::{
    ActionOutcome, DeclineOutcome, EvictedSession, GameResult, InviteCreated, InviteExpired, LeaveOutcome,
    PhaseOutcome, ReadyOutcome, TimerOutcome,
};
pub use phase::RegistryTimer;
pub use registry::Registry;
pub use session::{Session, SessionPlayer};
