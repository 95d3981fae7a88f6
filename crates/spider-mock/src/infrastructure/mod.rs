//! Infrastructure layer: concrete transports, the mDNS advertiser, and the
//! server wiring used by the binaries.

pub mod mdns;
#[cfg(all(feature = "bluetooth", target_os = "linux"))]
pub mod rfcomm;
pub mod server;
pub mod stream_transport;
pub mod ws_transport;

#[cfg(all(feature = "bluetooth", target_os = "linux"))]
pub use server::run_bluetooth_server;
pub use server::run_websocket_server;
