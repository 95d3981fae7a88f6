//! robot-spider mock: Bluetooth Classic variant.
//!
//! Registers a Serial Port Profile record named `robot-spider` with BlueZ and
//! serves one RFCOMM client at a time.  Commands arrive as newline-separated
//! text; acknowledgments, when enabled, are written back one per line.
//!
//! ```text
//! mock-bluetooth-server [--acks]
//! ```
//!
//! Requires Linux, a powered adapter, and permission to talk to bluetoothd.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use spider_mock::application::ServerState;
use spider_mock::domain::ServerConfig;
use spider_mock::infrastructure::run_bluetooth_server;

/// Mock Bluetooth Robot Server for Hexapod Control App
#[derive(Debug, Parser)]
#[command(name = "mock-bluetooth-server", version)]
struct Cli {
    /// Send acknowledgment messages back to clients.
    #[arg(long, env = "ROBOT_SPIDER_ACKS")]
    acks: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig {
        send_acks: cli.acks,
        ..ServerConfig::default()
    };
    let state = Arc::new(ServerState::new());

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

    if let Err(e) = run_bluetooth_server(config, state).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_disable_acks() {
        assert!(!Cli::parse_from(["mock-bluetooth-server"]).acks);
    }

    #[test]
    fn test_cli_acks_flag_enables_acks() {
        assert!(Cli::parse_from(["mock-bluetooth-server", "--acks"]).acks);
    }
}
