//! Session handler: the lifetime of one client connection.
//!
//! A session reads one message at a time from the connection it owns:
//!
//! 1. Canonicalize the text (trim + lower-case).
//! 2. Classify it with [`validate_command`].
//! 3. Valid: bump the shared counter and log `COMMAND: <NAME> from <peer>`.
//!    Invalid: log a warning.
//! 4. When acknowledgments are enabled, write back `OK:<cmd>` or
//!    `ERROR:Unknown command '<text>'`.
//!
//! Nothing is read until [`establish`] has completed the transport's upgrade;
//! only then is the peer registered and counted as a client.
//!
//! The loop ends when the peer closes, the transport fails, or the session's
//! cancellation token fires.  Every pending read and write is raced against the
//! token, so shutdown never waits for a silent client.  On every exit path the
//! connection is closed exactly once.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use spider_core::{acknowledgment, canonicalize, validate_command, Validation};

use crate::application::state::{ServerState, SessionHandle};
use crate::application::transport::{CommandConnection, TransportError};

/// Why a session ended without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed the connection.
    PeerClosed,
    /// The server stopped or the coordinator closed the session.
    Cancelled,
}

/// Classifies and logs one raw message, returning the reply to write (if any).
///
/// This is the per-message step of the session loop with the I/O stripped out.
/// Only valid commands increment the shared counter.
pub fn process_message(
    raw: &str,
    peer: &str,
    state: &ServerState,
    send_acks: bool,
) -> Option<String> {
    let candidate = canonicalize(raw);
    let validation = validate_command(&candidate);

    match &validation {
        Validation::Valid(cmd) => {
            let total = state.record_command();
            info!(command = cmd.as_str(), total, "COMMAND: {} from {peer}", cmd.log_name());
        }
        Validation::Invalid(text) => {
            warn!("Invalid command '{text}' from {peer}");
        }
    }

    send_acks.then(|| acknowledgment(&validation))
}

/// Completes the connection's protocol upgrade, racing it against `shutdown`.
///
/// Returns `false` if the peer never became a client (the upgrade failed or
/// the server began stopping first); the connection is closed in that case.
pub async fn establish<C: CommandConnection>(
    connection: &mut C,
    peer: &str,
    shutdown: &CancellationToken,
) -> bool {
    let result = tokio::select! {
        biased;
        _ = shutdown.cancelled() => None,
        result = connection.handshake() => Some(result),
    };

    match result {
        Some(Ok(())) => return true,
        Some(Err(e)) => debug!("handshake with {peer} failed: {e}"),
        None => debug!("shutdown began before {peer} completed its handshake"),
    }
    connection.close().await;
    false
}

/// Runs a session to completion and closes its connection.
///
/// The connection must already be established (see [`establish`]).
///
/// # Errors
///
/// Returns the transport error that ended the session, if any.  The connection
/// has already been closed when this returns, whatever the outcome.
pub async fn run_session<C: CommandConnection>(
    mut connection: C,
    session: &SessionHandle,
    state: &ServerState,
    send_acks: bool,
) -> Result<SessionEnd, TransportError> {
    let outcome = drive(&mut connection, session, state, send_acks).await;
    connection.close().await;
    outcome
}

async fn drive<C: CommandConnection>(
    connection: &mut C,
    session: &SessionHandle,
    state: &ServerState,
    send_acks: bool,
) -> Result<SessionEnd, TransportError> {
    let peer = session.peer.as_str();

    loop {
        let received = tokio::select! {
            biased;
            _ = session.token.cancelled() => return Ok(SessionEnd::Cancelled),
            result = connection.recv() => result?,
        };

        let Some(raw) = received else {
            return Ok(SessionEnd::PeerClosed);
        };

        if let Some(reply) = process_message(&raw, peer, state, send_acks) {
            tokio::select! {
                biased;
                _ = session.token.cancelled() => return Ok(SessionEnd::Cancelled),
                result = connection.send(&reply) => result?,
            }
            debug!("Sent ACK to {peer}: {reply}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
