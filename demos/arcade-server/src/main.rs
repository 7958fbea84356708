use arcade::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Accepts tokens of the form `<id>:<name>`. Development only: anyone can
/// claim any id.
struct DevTokenAuth;

impl Authenticator for DevTokenAuth {
    async fn authenticate(&self, token: &str) -> Result<Identity, PresenceError> {
        let (id, name) = token
            .split_once(':')
            .ok_or_else(|| PresenceError::AuthFailed("expected <id>:<name>".into()))?;
        let id: u64 = id
            .parse()
            .map_err(|_| PresenceError::AuthFailed("id must be a number".into()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(PresenceError::AuthFailed("name must not be empty".into()));
        }
        Ok(Identity::new(PlayerId(id), name))
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let bind = std::env::var("ARCADE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

    let server = ArcadeServer::builder()
        .bind(&bind)
        .registry_config(RegistryConfig::default())
        .build(DevTokenAuth)
        .await?;
    tracing::info!(addr = %server.local_addr()?, "arcade listening");

    server.run().await?;
    Ok(())
}
