//! `ArcadeServer` builder and accept loop.
//!
//! This is the entry point for running the arcade. It ties together all
//! the layers: transport → protocol → presence → engine → registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arcade_presence::Authenticator;
use arcade_protocol::{Codec, JsonCodec};
use arcade_registry::RegistryConfig;
use arcade_transport::{Transport, WebSocketTransport};

use crate::ArcadeError;
use crate::engine::{Engine, EngineHandle};
use crate::handler::handle_connection;

/// How long a connection may stay silent before it is dropped. Clients
/// keep it alive with `heartbeat`.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state passed to each connection handler task.
pub(crate) struct ServerState<A, K> {
    pub(crate) auth: A,
    pub(crate) codec: K,
    pub(crate) engine: EngineHandle,
    pub(crate) read_timeout: Duration,
}

/// Builder for configuring and starting an arcade server.
///
/// # Example
///
/// ```rust,ignore
/// let server = ArcadeServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(my_auth)
///     .await?;
/// server.run().await
/// ```
pub struct ArcadeServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
    read_timeout: Duration,
}

impl ArcadeServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            registry_config: RegistryConfig::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets eviction, grace, and invite timings.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Sets how long a connection may go without sending anything.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Binds the listener and prepares the engine.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<ArcadeServer<A, JsonCodec>, ArcadeError> {
        let transport = WebSocketTransport::bind(self.bind_addr.as_str()).await?;
        let (engine, handle) = Engine::new(self.registry_config);

        let state = Arc::new(ServerState {
            auth,
            codec: JsonCodec,
            engine: handle,
            read_timeout: self.read_timeout,
        });

        Ok(ArcadeServer {
            transport,
            engine,
            state,
        })
    }
}

impl Default for ArcadeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound arcade server.
///
/// Call [`run()`](Self::run) to start the engine and accept connections.
pub struct ArcadeServer<A, K> {
    transport: WebSocketTransport,
    engine: Engine,
    state: Arc<ServerState<A, K>>,
}

impl ArcadeServer<(), JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ArcadeServerBuilder {
        ArcadeServerBuilder::new()
    }
}

impl<A, K> ArcadeServer<A, K>
where
    A: Authenticator,
    K: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ArcadeError> {
        Ok(self.transport.local_addr()?)
    }

    /// Spawns the engine, then accepts connections forever, one handler
    /// task each.
    pub async fn run(mut self) -> Result<(), ArcadeError> {
        tokio::spawn(self.engine.run());
        tracing::info!("arcade server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
