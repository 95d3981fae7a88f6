//! robot-spider mock: WebSocket variant.
//!
//! Impersonates the hexapod so the control app can be tested without
//! hardware.  Listens for WebSocket clients on port 8080, advertises itself
//! over mDNS as `robot-spider.local`, and logs every command it receives.
//!
//! # Usage
//!
//! ```text
//! mock-robot-server [--acks]
//!
//! Options:
//!   --acks   Reply OK:<cmd> / ERROR:Unknown command '<text>' to each message
//! ```
//!
//! `ROBOT_SPIDER_ACKS=true` has the same effect as `--acks`.  Log verbosity
//! follows `RUST_LOG` (default `info`).

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use spider_mock::application::ServerState;
use spider_mock::domain::ServerConfig;
use spider_mock::infrastructure::run_websocket_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Mock Robot Server for Hexapod Control App
#[derive(Debug, Parser)]
#[command(name = "mock-robot-server", version)]
struct Cli {
    /// Send acknowledgment messages back to clients.
    #[arg(long, env = "ROBOT_SPIDER_ACKS")]
    acks: bool,
}

impl Cli {
    fn into_server_config(self) -> ServerConfig {
        ServerConfig {
            send_acks: self.acks,
            ..ServerConfig::default()
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config();
    let state = Arc::new(ServerState::new());

    // Ctrl+C only flips the state; the server runs its own shutdown sequence.
    let signal_state = Arc::clone(&state);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, initiating graceful shutdown");
                signal_state.begin_stopping();
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    if let Err(e) = run_websocket_server(config, state).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_disable_acks() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = Cli::parse_from(["mock-robot-server"]);

        // Assert
        assert!(!cli.acks);
    }

    #[test]
    fn test_cli_acks_flag_enables_acks() {
        let cli = Cli::parse_from(["mock-robot-server", "--acks"]);
        assert!(cli.acks);
    }

    #[test]
    fn test_cli_rejects_unknown_argument() {
        let result = Cli::try_parse_from(["mock-robot-server", "--verbose"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_into_server_config_carries_acks() {
        // Arrange
        let cli = Cli::parse_from(["mock-robot-server", "--acks"]);

        // Act
        let config = cli.into_server_config();

        // Assert
        assert!(config.send_acks);
    }

    #[test]
    fn test_into_server_config_keeps_fixed_port() {
        let config = Cli::parse_from(["mock-robot-server"]).into_server_config();
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.bind_addr.ip().is_unspecified());
    }
}
