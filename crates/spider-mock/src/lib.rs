//! spider-mock library crate.
//!
//! Mock servers that impersonate the robot-spider hexapod so the control app
//! can be exercised without hardware.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Control app (WebSocket text frames │ RFCOMM byte stream)
//!         ↕
//! [spider-mock]
//!   ├── domain/           ServerConfig
//!   ├── application/      ServerState, session handler, acceptor,
//!   │                     shutdown coordinator, transport/advertiser traits
//!   └── infrastructure/
//!         ├── ws_transport/     WebSocket listener (tokio-tungstenite)
//!         ├── stream_transport/ newline-framed byte streams
//!         ├── rfcomm/           Bluetooth SPP listener (bluer, feature `bluetooth`)
//!         ├── mdns/             robot-spider.local advertisement, local IP (mdns-sd)
//!         └── server/           wiring for the two binaries
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` is written once against the `CommandListener`,
//!   `CommandConnection`, and `ServiceAdvertiser` traits.
//! - `infrastructure` provides the concrete transports and advertiser.

/// Domain layer: configuration (no I/O).
pub mod domain;

/// Application layer: the connection-handling and command-protocol engine.
pub mod application;

/// Infrastructure layer: transports, mDNS, and server wiring.
pub mod infrastructure;
