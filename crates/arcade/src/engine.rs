//! The engine actor: the single writer for every session.
//!
//! One Tokio task owns the [`Registry`] and the [`Presence`] directory.
//! Connection handlers talk to it through an [`EngineHandle`]; timer
//! expiries come back from the registry's scheduler on a second channel;
//! a periodic tick drives idle eviction. The task handles exactly one of
//! those at a time, so no operation ever observes another half-done.

use arcade_presence::{Identity, Presence, PresenceError};
use arcade_protocol::{ClientMessage, PlayerId, ServerMessage};
use arcade_registry::{Expired, Registry, RegistryConfig, RegistryTimer};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::ArcadeError;

/// Outbound channel to one connected player's writer task.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to the engine through its channel.
pub(crate) enum EngineCommand {
    /// A player finished the handshake.
    Connect {
        identity: Identity,
        outbox: Outbox,
        reply: oneshot::Sender<Result<(), PresenceError>>,
    },

    /// A request from a connected player.
    Request {
        player_id: PlayerId,
        msg: ClientMessage,
    },

    /// The player's connection is gone.
    Disconnect { player_id: PlayerId },
}

/// Handle to the running engine. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    /// Registers a connected player and their outbox.
    ///
    /// The engine answers on the outbox with `welcome` and the current
    /// session list.
    ///
    /// # Errors
    /// [`PresenceError::AlreadyConnected`] (wrapped) if the player is
    /// already online; [`ArcadeError::EngineClosed`] if the engine stopped.
    pub async fn connect(&self, identity: Identity, outbox: Outbox) -> Result<(), ArcadeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Connect {
                identity,
                outbox,
                reply,
            })
            .map_err(|_| ArcadeError::EngineClosed)?;
        rx.await.map_err(|_| ArcadeError::EngineClosed)??;
        Ok(())
    }

    /// Forwards a player request (fire-and-forget; replies arrive on the
    /// player's outbox).
    pub fn request(&self, player_id: PlayerId, msg: ClientMessage) -> Result<(), ArcadeError> {
        self.tx
            .send(EngineCommand::Request { player_id, msg })
            .map_err(|_| ArcadeError::EngineClosed)
    }

    /// Reports a closed connection. Synchronous so it can run in `Drop`.
    pub fn disconnect(&self, player_id: PlayerId) {
        if self
            .tx
            .send(EngineCommand::Disconnect { player_id })
            .is_err()
        {
            tracing::debug!(%player_id, "engine gone before disconnect");
        }
    }
}

/// The engine actor state. Runs inside a Tokio task via [`Engine::run`].
pub struct Engine {
    pub(crate) registry: Registry,
    pub(crate) presence: Presence<Outbox>,
    expiries: mpsc::UnboundedReceiver<Expired<RegistryTimer>>,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
}

impl Engine {
    /// Creates an engine with a fresh registry.
    pub fn new(config: RegistryConfig) -> (Self, EngineHandle) {
        let (registry, expiries) = Registry::new(config);
        Self::with_registry(registry, expiries)
    }

    /// Creates an engine around an existing registry, e.g. one seeded for
    /// deterministic tests.
    pub fn with_registry(
        registry: Registry,
        expiries: mpsc::UnboundedReceiver<Expired<RegistryTimer>>,
    ) -> (Self, EngineHandle) {
        let (tx, commands) = mpsc::unbounded_channel();
        let engine = Self {
            registry,
            presence: Presence::new(),
            expiries,
            commands,
        };
        (engine, EngineHandle { tx })
    }

    /// Runs the actor loop until every [`EngineHandle`] is dropped.
    pub async fn run(mut self) {
        let period = self.registry.config().sweep_interval;
        let mut sweep = tokio::time::interval_at(Instant::now() + period, period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(?period, "engine started");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(expired) = self.expiries.recv() => self.on_timer(expired),
                _ = sweep.tick() => self.on_sweep(),
            }
        }

        tracing::info!("engine stopped");
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Connect {
                identity,
                outbox,
                reply,
            } => {
                let result = self.on_connect(identity, outbox);
                let _ = reply.send(result);
            }
            EngineCommand::Request { player_id, msg } => self.on_request(player_id, msg),
            EngineCommand::Disconnect { player_id } => self.on_disconnect(player_id),
        }
    }

    fn on_connect(&mut self, identity: Identity, outbox: Outbox) -> Result<(), PresenceError> {
        let player_id = identity.player_id;
        let display_name = identity.display_name.clone();
        self.presence.connect(identity, outbox)?;
        self.send(
            player_id,
            ServerMessage::Welcome {
                player_id,
                display_name,
            },
        );
        self.send(
            player_id,
            ServerMessage::SessionList {
                sessions: self.registry.list_open_sessions(),
            },
        );
        Ok(())
    }

    /// Leaves every session the player occupies, then drops them from
    /// presence (which closes their outbox).
    fn on_disconnect(&mut self, player_id: PlayerId) {
        for session_id in self.registry.sessions_for(player_id) {
            self.leave(player_id, session_id);
        }
        if let Err(e) = self.presence.disconnect(player_id) {
            tracing::debug!(%player_id, error = %e, "disconnect for unknown player");
        }
    }

    fn on_sweep(&mut self) {
        let evicted = self.registry.evict_stale();
        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "idle sessions evicted");
            self.broadcast_lobby();
        }
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Sends to one player, if they are online.
    pub(crate) fn send(&self, player_id: PlayerId, msg: ServerMessage) {
        if let Some(outbox) = self.presence.handle(player_id) {
            if outbox.send(msg).is_err() {
                tracing::debug!(%player_id, "outbox closed, message dropped");
            }
        }
    }

    pub(crate) fn send_all(&self, players: &[PlayerId], msg: &ServerMessage) {
        for &player_id in players {
            self.send(player_id, msg.clone());
        }
    }

    /// Pushes the open-session list to every connected player.
    pub(crate) fn broadcast_lobby(&self) {
        let msg = ServerMessage::SessionList {
            sessions: self.registry.list_open_sessions(),
        };
        for (player_id, outbox) in self.presence.handles() {
            if outbox.send(msg.clone()).is_err() {
                tracing::debug!(%player_id, "outbox closed, lobby update dropped");
            }
        }
    }
}
