//! WebSocket transport: TCP listener plus lazily upgraded connections.
//!
//! `accept` only takes the TCP connection; the HTTP upgrade runs inside the
//! session via [`CommandConnection::handshake`], so a slow client never
//! stalls the accept loop.

use std::mem;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{accept_async, WebSocketStream};
use tracing::{debug, info};

use crate::application::transport::{
    Accepted, CommandConnection, CommandListener, TransportError,
};

/// Bound on sending our close frame to a peer that may have stopped reading.
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

// ── Listener ──────────────────────────────────────────────────────────────────

/// Accepts TCP connections that will be upgraded to WebSocket sessions.
pub struct WsListener {
    inner: Option<TcpListener>,
    local_addr: SocketAddr,
}

impl WsListener {
    /// Binds the listening socket.
    ///
    /// # Errors
    ///
    /// [`TransportError::Bind`] if the address is in use or not permitted.
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                endpoint: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            inner: Some(listener),
            local_addr,
        })
    }

    /// The bound address; differs from the requested one when port 0 was used.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl CommandListener for WsListener {
    type Connection = WsConnection;

    async fn accept(&mut self) -> Result<Accepted<WsConnection>, TransportError> {
        let listener = self.inner.as_ref().ok_or(TransportError::ListenerClosed)?;
        let (stream, peer) = listener.accept().await?;
        // Commands are tiny and latency-sensitive.
        stream.set_nodelay(true).ok();
        Ok(Accepted {
            connection: WsConnection::pending(stream),
            peer: peer.to_string(),
        })
    }

    async fn close(&mut self) {
        if self.inner.take().is_some() {
            info!("WebSocket listener on {} closed", self.local_addr);
        }
    }
}

// ── Connection ────────────────────────────────────────────────────────────────

enum WsState {
    /// TCP accepted, upgrade not yet performed.
    Pending(TcpStream),
    Open(WebSocketStream<TcpStream>),
    Closed,
}

/// One client WebSocket.  One text frame per command, one per reply.
pub struct WsConnection {
    state: WsState,
}

impl WsConnection {
    fn pending(stream: TcpStream) -> Self {
        Self {
            state: WsState::Pending(stream),
        }
    }
}

#[async_trait]
impl CommandConnection for WsConnection {
    async fn handshake(&mut self) -> Result<(), TransportError> {
        match mem::replace(&mut self.state, WsState::Closed) {
            WsState::Pending(stream) => {
                let ws = accept_async(stream)
                    .await
                    .map_err(|e| TransportError::WebSocket(format!("handshake failed: {e}")))?;
                self.state = WsState::Open(ws);
                Ok(())
            }
            open @ WsState::Open(_) => {
                self.state = open;
                Ok(())
            }
            WsState::Closed => Err(TransportError::NotOpen),
        }
    }

    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        let WsState::Open(ws) = &mut self.state else {
            return Err(TransportError::NotOpen);
        };

        loop {
            match ws.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(WsMessage::Binary(bytes))) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!("peer sent close frame: {frame:?}");
                    return Ok(None);
                }
                // Pongs are queued by tungstenite itself.
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                None
                | Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed))
                | Some(Err(WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake))) => {
                    return Ok(None)
                }
                Some(Err(e)) => return Err(TransportError::WebSocket(e.to_string())),
            }
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        let WsState::Open(ws) = &mut self.state else {
            return Err(TransportError::NotOpen);
        };
        ws.send(WsMessage::text(text))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn close(&mut self) {
        if let WsState::Open(mut ws) = mem::replace(&mut self.state, WsState::Closed) {
            match timeout(CLOSE_TIMEOUT, ws.close(None)).await {
                Ok(Ok(())) | Ok(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {}
                Ok(Err(e)) => debug!("error closing WebSocket: {e}"),
                Err(_) => debug!("peer did not take the close frame in time"),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
