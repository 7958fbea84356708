//! The presence directory: every player currently connected.
//!
//! `Presence` is a plain map, not a concurrent one. It is owned by the
//! engine task, which serializes every access.

use std::collections::HashMap;

use arcade_protocol::PlayerId;
use tokio::time::Instant;

use crate::{Identity, PresenceError};

/// One connected player.
///
/// `H` is whatever the owner uses to reach the player, typically the
/// sending half of the connection's outbound channel.
#[derive(Debug)]
pub struct Online<H> {
    pub display_name: String,
    pub handle: H,
    pub connected_at: Instant,
}

/// Tracks which players are online and how to reach them.
#[derive(Debug)]
pub struct Presence<H> {
    players: HashMap<PlayerId, Online<H>>,
}

impl<H> Default for Presence<H> {
    fn default() -> Self {
        Self {
            players: HashMap::new(),
        }
    }
}

impl<H> Presence<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `identity` online, reachable through `handle`.
    ///
    /// # Errors
    /// [`PresenceError::AlreadyConnected`] if the player already has a
    /// live connection. The existing entry is left untouched.
    pub fn connect(&mut self, identity: Identity, handle: H) -> Result<(), PresenceError> {
        let player_id = identity.player_id;
        if self.players.contains_key(&player_id) {
            return Err(PresenceError::AlreadyConnected(player_id));
        }
        self.players.insert(
            player_id,
            Online {
                display_name: identity.display_name,
                handle,
                connected_at: Instant::now(),
            },
        );
        tracing::info!(%player_id, online = self.players.len(), "player online");
        Ok(())
    }

    /// Removes the player and returns their entry.
    ///
    /// # Errors
    /// [`PresenceError::NotFound`] if the player was not online.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Result<Online<H>, PresenceError> {
        let entry = self
            .players
            .remove(&player_id)
            .ok_or(PresenceError::NotFound(player_id))?;
        tracing::info!(%player_id, online = self.players.len(), "player offline");
        Ok(entry)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&Online<H>> {
        self.players.get(&player_id)
    }

    pub fn handle(&self, player_id: PlayerId) -> Option<&H> {
        self.players.get(&player_id).map(|p| &p.handle)
    }

    pub fn display_name(&self, player_id: PlayerId) -> Option<&str> {
        self.players.get(&player_id).map(|p| p.display_name.as_str())
    }

    pub fn is_online(&self, player_id: PlayerId) -> bool {
        self.players.contains_key(&player_id)
    }

    /// Handles of every online player, for lobby-wide broadcasts.
    pub fn handles(&self) -> impl Iterator<Item = (PlayerId, &H)> {
        self.players.iter().map(|(id, p)| (*id, &p.handle))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
