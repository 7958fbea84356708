//! Registry timing configuration.

use std::time::Duration;

/// Timeouts applied by the [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// A non-finished session untouched for this long is evicted.
    pub idle_timeout: Duration,

    /// How often the owner should call
    /// [`evict_stale`](crate::Registry::evict_stale).
    pub sweep_interval: Duration,

    /// How long a finished session stays visible so clients can render
    /// the final screen.
    pub finished_grace: Duration,

    /// Lifetime of an unanswered invite and its placeholder session.
    pub invite_ttl: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
            finished_grace: Duration::from_secs(60),
            invite_ttl: Duration::from_secs(30),
        }
    }
}
