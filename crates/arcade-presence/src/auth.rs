//! Authentication hook for validating player identity.
//!
//! The engine does not decide who a player is. The host world does (its
//! account system, a signed JWT, a dev token table). The engine only
//! defines the [`Authenticator`] trait and calls it once per connection
//! during the handshake.

use arcade_protocol::PlayerId;

use crate::PresenceError;

/// Who a connection belongs to, as established by the [`Authenticator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub player_id: PlayerId,
    /// Shown to other players in lobbies, scoreboards, and invites.
    pub display_name: String,
}

impl Identity {
    pub fn new(player_id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            player_id,
            display_name: display_name.into(),
        }
    }
}

/// Validates a client's handshake token and returns its identity.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use arcade_presence::{Authenticator, Identity, PresenceError};
/// use arcade_protocol::PlayerId;
///
/// /// Accepts tokens of the form `<id>:<name>`. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<Identity, PresenceError> {
///         let (id, name) = token
///             .split_once(':')
///             .ok_or_else(|| PresenceError::AuthFailed("expected <id>:<name>".into()))?;
///         let id: u64 = id
///             .parse()
///             .map_err(|_| PresenceError::AuthFailed("id must be a number".into()))?;
///         Ok(Identity::new(PlayerId(id), name))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Returns the identity behind `token`.
    ///
    /// # Errors
    /// [`PresenceError::AuthFailed`] when the token is invalid or expired.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Identity, PresenceError>> + Send;
}
