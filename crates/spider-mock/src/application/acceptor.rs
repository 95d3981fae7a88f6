//! Connection acceptor: the accept loop and per-session supervision.
//!
//! The loop races `listener.accept()` against the server's shutdown token, so
//! it wakes immediately on Ctrl+C instead of polling a flag.  Each accepted
//! connection gets a supervised session, which registers the peer once its
//! transport handshake has succeeded:
//!
//! - [`SessionPolicy::Concurrent`]: the session is spawned as its own Tokio
//!   task and the loop goes straight back to accepting (WebSocket variant).
//! - [`SessionPolicy::Serial`]: the session runs to completion before the next
//!   accept (RFCOMM variant, one peer at a time).
//!
//! Supervision catches both errors and panics from the session body, logs
//! them, and always removes the session from the registry.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tracing::{error, info, warn};

use crate::application::session::{establish, run_session, SessionEnd};
use crate::application::state::ServerState;
use crate::application::transport::{Accepted, CommandConnection, CommandListener, TransportError};

/// Back-off after a failed accept so a persistent error does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// How sessions are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    /// One spawned task per client; unlimited simultaneous clients.
    Concurrent,
    /// One client at a time, handled inline by the accept loop.
    Serial,
}

/// Accepts clients until shutdown is requested or the listener is exhausted.
///
/// Exhaustion (the listener reporting it is closed) begins shutdown so the
/// coordinator can finish the job.
pub async fn run_acceptor<L: CommandListener>(
    listener: &mut L,
    state: &Arc<ServerState>,
    policy: SessionPolicy,
    send_acks: bool,
) {
    let shutdown = state.shutdown_token().clone();

    loop {
        if policy == SessionPolicy::Serial {
            info!("Waiting for client connection...");
        }

        let accepted = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("shutdown requested; stopping accept loop");
                break;
            }
            result = listener.accept() => result,
        };

        match accepted {
            Ok(Accepted { connection, peer }) => {
                let task = supervise_session(connection, peer, Arc::clone(state), send_acks);
                match policy {
                    SessionPolicy::Concurrent => {
                        tokio::spawn(task);
                    }
                    SessionPolicy::Serial => task.await,
                }
            }
            Err(TransportError::ListenerClosed) => {
                warn!("listener closed; no more clients will be accepted");
                state.begin_stopping();
                break;
            }
            Err(e) => {
                if state.is_running() {
                    error!("accept error: {e}");
                }
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }
}

/// Establishes the connection, registers the client, runs its session, logs
/// how it ended, and removes it from the registry.
async fn supervise_session<C: CommandConnection + 'static>(
    mut connection: C,
    peer: String,
    state: Arc<ServerState>,
    send_acks: bool,
) {
    if !establish(&mut connection, &peer, state.shutdown_token()).await {
        return;
    }

    let session = state.register_session(peer.clone()).await;
    info!("Client connected: {peer}");
    info!(
        "Total connected clients: {}",
        state.active_session_count().await
    );

    let outcome = AssertUnwindSafe(run_session(connection, &session, &state, send_acks))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(SessionEnd::PeerClosed)) => info!("Client disconnected: {peer}"),
        Ok(Ok(SessionEnd::Cancelled)) => info!("Closed connection to {peer}"),
        Ok(Err(e)) => warn!("Client {peer} disconnected with error: {e}"),
        Err(_) => error!("Error handling client {peer}: session task panicked"),
    }

    let remaining = state.unregister_session(session.id).await;
    info!("Total connected clients: {remaining}");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
