//! Per-connection handler: handshake, heartbeat, and request routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `handshake` → authenticate the token
//!   2. Register with the engine → it answers `welcome` on the outbox
//!   3. Spawn a writer that drains the outbox onto the socket
//!   4. Loop: receive frames → answer heartbeats, forward the rest

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arcade_presence::{Authenticator, Identity};
use arcade_protocol::{ClientMessage, Codec, PlayerId, ProtocolError, ServerMessage};
use arcade_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::ArcadeError;
use crate::engine::EngineHandle;
use crate::server::ServerState;

/// How long a fresh connection has to send its handshake.
pub(crate) const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that reports the disconnect to the engine when the handler
/// exits, however it exits.
struct PresenceGuard {
    player_id: PlayerId,
    engine: EngineHandle,
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        self.engine.disconnect(self.player_id);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, K>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, K>>,
) -> Result<(), ArcadeError>
where
    A: Authenticator,
    K: Codec + Clone,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Handshake ---
    let identity = perform_handshake(conn.as_ref(), &state).await?;
    let player_id = identity.player_id;

    // --- Step 2: Register ---
    let (outbox, inbox) = mpsc::unbounded_channel();
    if let Err(e) = state.engine.connect(identity, outbox.clone()).await {
        send_error(conn.as_ref(), &state.codec, &e).await?;
        return Err(e);
    }
    let guard = PresenceGuard {
        player_id,
        engine: state.engine.clone(),
    };
    tracing::info!(%conn_id, %player_id, "player connected");

    // --- Step 3: Writer ---
    let writer = tokio::spawn(write_outbox(
        Arc::clone(&conn),
        state.codec.clone(),
        inbox,
    ));

    // --- Step 4: Read loop ---
    loop {
        let data = match tokio::time::timeout(state.read_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode message");
                let _ = outbox.send(error_message(&ArcadeError::Protocol(e)));
                continue;
            }
        };

        match msg {
            ClientMessage::Heartbeat { client_time } => {
                let _ = outbox.send(ServerMessage::HeartbeatAck {
                    client_time,
                    server_time: unix_millis(),
                });
            }
            ClientMessage::Handshake { .. } => {
                let e = ProtocolError::InvalidMessage("already authenticated".into());
                let _ = outbox.send(error_message(&ArcadeError::Protocol(e)));
            }
            other => {
                if state.engine.request(player_id, other).is_err() {
                    tracing::warn!(%player_id, "engine stopped, closing connection");
                    break;
                }
            }
        }
    }

    // The engine drops its copy of the outbox on disconnect; the writer
    // ends on its own after flushing anything already queued.
    drop(outbox);
    drop(guard);
    let _ = writer.await;
    let _ = conn.close().await;
    Ok(())
}

/// Receives `handshake`, authenticates it, and returns the identity.
async fn perform_handshake<A, K>(
    conn: &WebSocketConnection,
    state: &ServerState<A, K>,
) -> Result<Identity, ArcadeError>
where
    A: Authenticator,
    K: Codec,
{
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into()),
    };

    let token = match state.codec.decode::<ClientMessage>(&data) {
        Ok(ClientMessage::Handshake { token }) => token,
        Ok(_) | Err(_) => {
            let e: ArcadeError =
                ProtocolError::InvalidMessage("first message must be handshake".into()).into();
            send_error(conn, &state.codec, &e).await?;
            return Err(e);
        }
    };

    match state.auth.authenticate(&token).await {
        Ok(identity) => Ok(identity),
        Err(e) => {
            let e = ArcadeError::Presence(e);
            send_error(conn, &state.codec, &e).await?;
            Err(e)
        }
    }
}

/// Drains a player's outbox onto their socket until the engine lets go
/// of it or the socket fails.
async fn write_outbox<K: Codec>(
    conn: Arc<WebSocketConnection>,
    codec: K,
    mut inbox: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(msg) = inbox.recv().await {
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode outbound message");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, writer stopping");
            break;
        }
    }
}

fn error_message(e: &ArcadeError) -> ServerMessage {
    ServerMessage::Error {
        code: e.tag().to_owned(),
        message: e.to_string(),
    }
}

/// Sends an `error` straight to the socket (before the writer exists).
async fn send_error<K: Codec>(
    conn: &WebSocketConnection,
    codec: &K,
    e: &ArcadeError,
) -> Result<(), ArcadeError> {
    let bytes = codec.encode(&error_message(e))?;
    conn.send(&bytes).await?;
    Ok(())
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
