//! Transport seam: the listener/connection capability the engine is written against.
//!
//! Two concrete transports implement these traits in the infrastructure layer:
//!
//! - WebSocket over TCP (`WsListener` / `WsConnection`)
//! - Bluetooth RFCOMM serial link (`RfcommListener` / `StreamConnection`)
//!
//! The session handler and shutdown coordinator never see a socket type.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a transport.
///
/// At startup these are fatal; inside a session they end only that session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The listening endpoint could not be created.
    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(String),
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
    /// The connection was used before its handshake or after `close`.
    #[error("connection is not open")]
    NotOpen,
    /// The listener was closed or its source of connections is exhausted.
    #[error("listener closed")]
    ListenerClosed,
}

/// A freshly accepted connection and the identifier of its peer.
pub struct Accepted<C> {
    pub connection: C,
    /// Transport-specific peer string: `ip:port` or a Bluetooth address.
    pub peer: String,
}

/// Something that hands out client connections.
#[async_trait]
pub trait CommandListener: Send {
    type Connection: CommandConnection + 'static;

    /// Waits for the next client.  Must be cancel-safe: the acceptor races it
    /// against the shutdown token.
    async fn accept(&mut self) -> Result<Accepted<Self::Connection>, TransportError>;

    /// Stops listening.  Idempotent.
    async fn close(&mut self);
}

/// One client connection carrying text messages.
#[async_trait]
pub trait CommandConnection: Send {
    /// Completes any protocol upgrade before messages flow.
    async fn handshake(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Reads the next message.  `Ok(None)` means the peer closed the connection.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;

    /// Writes one reply message.
    async fn send(&mut self, text: &str) -> Result<(), TransportError>;

    /// Releases the connection.  Idempotent; errors are swallowed.
    async fn close(&mut self);
}
