//! Process-wide server state shared by the acceptor, every session, and the
//! shutdown coordinator.
//!
//! # Synchronisation
//!
//! | Field            | Primitive                    | Mutated by                 |
//! |------------------|------------------------------|----------------------------|
//! | phase            | `std::sync::Mutex`           | signal task, coordinator   |
//! | shutdown token   | `CancellationToken`          | signal task, coordinator   |
//! | command counter  | `AtomicU64`                  | every session              |
//! | active sessions  | `tokio::sync::Mutex<HashMap>`| acceptor, every session    |
//! | live / at-stop   | `AtomicUsize`                | registry updates, stop     |
//!
//! The phase lock is never held across an `.await`.  The live-session count is
//! only written while the registry lock is held, so it always equals the
//! registry size as of the last completed update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identifies one session in the registry.
pub type SessionId = Uuid;

/// Lifecycle of the server.
///
/// ```text
/// Running ──► Stopping ──► Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    Stopping,
    Stopped,
}

/// Registry entry for a connected client.
#[derive(Debug)]
struct ActiveSession {
    peer: String,
    connected_at: Instant,
    token: CancellationToken,
}

/// What a session task needs to know about itself.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub peer: String,
    /// Cancelled when the server stops or the coordinator closes this session.
    pub token: CancellationToken,
}

/// Shared state; wrap in an `Arc` and hand a clone to every task.
#[derive(Debug)]
pub struct ServerState {
    phase: Mutex<ShutdownPhase>,
    shutdown: CancellationToken,
    command_count: AtomicU64,
    sessions: tokio::sync::Mutex<HashMap<SessionId, ActiveSession>>,
    /// Registry size, readable without the async lock.
    live_sessions: AtomicUsize,
    /// Registry size at the moment `Running → Stopping` happened.
    open_at_stop: AtomicUsize,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(ShutdownPhase::Running),
            shutdown: CancellationToken::new(),
            command_count: AtomicU64::new(0),
            sessions: tokio::sync::Mutex::new(HashMap::new()),
            live_sessions: AtomicUsize::new(0),
            open_at_stop: AtomicUsize::new(0),
        }
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The running flag: true until shutdown begins.
    pub fn is_running(&self) -> bool {
        self.phase() == ShutdownPhase::Running
    }

    /// Moves `Running → Stopping` and cancels the shutdown token.
    ///
    /// The transitioning call records how many sessions were open, before the
    /// cancellation lets any of them unregister.  Returns `true` only for that
    /// call.
    pub fn begin_stopping(&self) -> bool {
        let transitioned = {
            let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
            if *phase == ShutdownPhase::Running {
                *phase = ShutdownPhase::Stopping;
                self.open_at_stop
                    .store(self.live_sessions.load(Ordering::SeqCst), Ordering::SeqCst);
                true
            } else {
                false
            }
        };
        self.shutdown.cancel();
        transitioned
    }

    pub(crate) fn mark_stopped(&self) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = ShutdownPhase::Stopped;
    }

    /// Sessions that were open when shutdown began; 0 while still running.
    pub fn sessions_open_at_stop(&self) -> usize {
        self.open_at_stop.load(Ordering::SeqCst)
    }

    /// Token cancelled once shutdown begins.  The accept loop waits on it.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Counts one valid command and returns the new total.
    pub fn record_command(&self) -> u64 {
        self.command_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of valid commands processed across all sessions, ever.
    pub fn command_count(&self) -> u64 {
        self.command_count.load(Ordering::Relaxed)
    }

    /// Adds a session for `peer` and returns its handle.
    ///
    /// If shutdown already began, the returned token is already cancelled and the
    /// session ends before reading anything.
    pub async fn register_session(&self, peer: impl Into<String>) -> SessionHandle {
        let handle = SessionHandle {
            id: Uuid::new_v4(),
            peer: peer.into(),
            token: self.shutdown.child_token(),
        };
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            handle.id,
            ActiveSession {
                peer: handle.peer.clone(),
                connected_at: Instant::now(),
                token: handle.token.clone(),
            },
        );
        self.live_sessions.store(sessions.len(), Ordering::SeqCst);
        handle
    }

    /// Removes a session and returns how many remain.  Removing twice is harmless.
    pub async fn unregister_session(&self, id: SessionId) -> usize {
        let mut sessions = self.sessions.lock().await;
        if let Some(entry) = sessions.remove(&id) {
            tracing::debug!(
                "session {} for {} lasted {:?}",
                id,
                entry.peer,
                entry.connected_at.elapsed()
            );
        }
        self.live_sessions.store(sessions.len(), Ordering::SeqCst);
        sessions.len()
    }

    pub async fn active_session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Peers of all active sessions, in no particular order.
    pub async fn active_peers(&self) -> Vec<String> {
        self.sessions
            .lock()
            .await
            .values()
            .map(|s| s.peer.clone())
            .collect()
    }

    /// Cancels every registered session's token and returns how many there were.
    pub async fn close_all_sessions(&self) -> usize {
        let sessions = self.sessions.lock().await;
        for entry in sessions.values() {
            entry.token.cancel();
        }
        sessions.len()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
