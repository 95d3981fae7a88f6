//! Server configuration.
//!
//! [`ServerConfig`] is the single source of truth for runtime settings.  It is
//! built from CLI arguments in the binaries and from [`Default`] in tests.
//! There is no configuration file.

use std::net::SocketAddr;
use std::time::Duration;

use spider_core::domain::advertisement::{RETRACT_TIMEOUT, SERVICE_NAME, WEBSOCKET_PORT};

/// How long shutdown waits for closed sessions to leave the registry.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// All runtime configuration for a mock server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.  Unused by the RFCOMM variant.
    pub bind_addr: SocketAddr,

    /// Write `OK:`/`ERROR:` replies back to the client.
    pub send_acks: bool,

    /// Name published in the discovery record.
    pub service_name: String,

    /// Upper bound on advertisement retraction during shutdown.
    pub retract_timeout: Duration,

    /// Upper bound on waiting for cancelled sessions to finish during shutdown.
    pub drain_timeout: Duration,
}

impl Default for ServerConfig {
    /// | Field           | Default          |
    /// |-----------------|------------------|
    /// | bind_addr       | `0.0.0.0:8080`   |
    /// | send_acks       | `false`          |
    /// | service_name    | `robot-spider`   |
    /// | retract_timeout | 2 seconds        |
    /// | drain_timeout   | 500 ms           |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], WEBSOCKET_PORT)),
            send_acks: false,
            service_name: SERVICE_NAME.to_string(),
            retract_timeout: RETRACT_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
