//! Wiring for the two mock binaries.
//!
//! Both runners print the startup banner, create their transport, and hand
//! everything to [`serve`].  They return once the server has reached
//! `Stopped`; shutdown is requested through `state`.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use spider_core::domain::advertisement::MDNS_HOSTNAME;
use spider_core::AdvertisementRecord;

use crate::application::{publish, serve, ServerState, SessionPolicy, ShutdownReport};
use crate::domain::config::ServerConfig;
use crate::infrastructure::mdns::{local_ip, MdnsAdvertiser};
use crate::infrastructure::ws_transport::WsListener;

const BANNER_RULE: &str = "============================================================";

/// Runs the WebSocket variant: mDNS-advertised, concurrent sessions.
///
/// # Errors
///
/// Returns an error only if the WebSocket port cannot be bound.  Failing to
/// advertise is logged and tolerated.
pub async fn run_websocket_server(
    config: ServerConfig,
    state: Arc<ServerState>,
) -> anyhow::Result<ShutdownReport> {
    let address = local_ip();
    let port = config.bind_addr.port();
    let record = AdvertisementRecord {
        instance_name: config.service_name.clone(),
        ..AdvertisementRecord::robot_spider(address, port)
    };

    info!("{BANNER_RULE}");
    info!("Mock Hexapod Robot Server");
    info!("{BANNER_RULE}");
    info!("Local IP: {address}");
    info!("WebSocket Port: {port}");
    info!("mDNS Service Name: {}", record.full_name());
    info!("mDNS Hostname: {MDNS_HOSTNAME}");
    info!("Send Acknowledgments: {}", config.send_acks);
    info!("{BANNER_RULE}");

    let listener = WsListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    let advertiser = publish(Box::new(MdnsAdvertiser::new()), &record).await;

    info!("Server is running on ws://{}! Waiting for connections...", listener.local_addr());
    info!("Press Ctrl+C to stop");

    Ok(serve(listener, state, SessionPolicy::Concurrent, advertiser, &config).await)
}

/// Runs the Bluetooth variant: SPP record, one client at a time.
///
/// # Errors
///
/// Returns an error if the adapter is unavailable or the profile cannot be
/// registered.
#[cfg(all(feature = "bluetooth", target_os = "linux"))]
pub async fn run_bluetooth_server(
    config: ServerConfig,
    state: Arc<ServerState>,
) -> anyhow::Result<ShutdownReport> {
    use spider_core::domain::advertisement::SPP_UUID;

    use crate::infrastructure::rfcomm::RfcommListener;

    info!("{BANNER_RULE}");
    info!("Mock Hexapod Bluetooth Robot Server");
    info!("{BANNER_RULE}");
    info!("Service Name: {}", config.service_name);
    info!("Service UUID: {SPP_UUID}");
    info!("Send Acknowledgments: {}", config.send_acks);
    info!("{BANNER_RULE}");

    let listener = RfcommListener::register(&config.service_name)
        .await
        .context("failed to start Bluetooth server; make sure Bluetooth is enabled and bluetoothd is running")?;

    info!("Listening for RFCOMM connections on {}", listener.adapter_address());
    info!("Server is running! Waiting for connections...");
    info!("Press Ctrl+C to stop");

    // The SPP record is owned by the listener and withdrawn when it closes.
    Ok(serve(listener, state, SessionPolicy::Serial, None, &config).await)
}
