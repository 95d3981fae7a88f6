//! Shutdown coordinator: orderly termination of a running server.
//!
//! # State machine
//!
//! ```text
//! Running ──(Ctrl+C or accept loop exhausted)──► Stopping ──► Stopped
//! ```
//!
//! Actions performed on the way to `Stopped`, in order:
//!
//! 1. Clear the running flag (cancel the shutdown token).
//! 2. Close every active session and wait, bounded, for them to unregister.
//! 3. Retract the discovery record, bounded by the retraction timeout.
//! 4. Close the listening endpoint.
//! 5. Log the total number of commands processed.
//!
//! Every step is best-effort.  A failing or hanging step is logged and the
//! coordinator moves on, so `Stopped` is always reached.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::application::advertiser::ServiceAdvertiser;
use crate::application::state::{ServerState, ShutdownPhase};
use crate::application::transport::CommandListener;

/// Poll interval while waiting for closed sessions to unregister.
const DRAIN_POLL: Duration = Duration::from_millis(10);

/// What happened to the discovery record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetractionOutcome {
    /// Nothing was registered (no advertiser, or registration had failed).
    NotAdvertised,
    Retracted,
    /// The advertiser reported an error; the record expires via its TTL.
    Failed,
    /// The advertiser did not answer in time; the record expires via its TTL.
    TimedOut,
}

/// Summary produced by a completed shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub total_commands: u64,
    /// Sessions that were open when shutdown began.
    pub sessions_closed: usize,
    /// Sessions still registered after the drain timeout.
    pub sessions_left_open: usize,
    pub retraction: RetractionOutcome,
}

/// Drives the `Running → Stopping → Stopped` transition.
pub struct ShutdownCoordinator {
    state: Arc<ServerState>,
    advertiser: Option<Box<dyn ServiceAdvertiser>>,
    retract_timeout: Duration,
    drain_timeout: Duration,
    report: Option<ShutdownReport>,
}

impl ShutdownCoordinator {
    /// `advertiser` is the handle returned by [`publish`](crate::application::publish),
    /// `None` if nothing was advertised.
    pub fn new(
        state: Arc<ServerState>,
        advertiser: Option<Box<dyn ServiceAdvertiser>>,
        retract_timeout: Duration,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            state,
            advertiser,
            retract_timeout,
            drain_timeout,
            report: None,
        }
    }

    /// Runs the shutdown sequence and returns its report.
    ///
    /// Calling it again returns the first report without repeating any step.
    pub async fn shutdown<L>(&mut self, listener: &mut L) -> ShutdownReport
    where
        L: CommandListener + ?Sized,
    {
        if let Some(report) = &self.report {
            debug!("shutdown already completed");
            return report.clone();
        }

        info!("Shutting down server...");

        // 1. Running → Stopping.  No-op if the signal handler got here first.
        self.state.begin_stopping();

        // 2. Close sessions.  Cancelling the shutdown token already reached every
        //    session token; this also covers sessions registered since.
        let sessions_closed = self.state.sessions_open_at_stop();
        let cancelled = self.state.close_all_sessions().await;
        debug!("{cancelled} session(s) still registered after stop was requested");
        let sessions_left_open = drain_sessions(&self.state, self.drain_timeout).await;

        // 3. Withdraw the discovery record.
        let retraction = self.retract_advertisement().await;

        // 4. Stop listening.
        listener.close().await;

        // 5. Summary.
        let total_commands = self.state.command_count();
        info!("Total commands processed: {total_commands}");

        self.state.mark_stopped();
        debug_assert_eq!(self.state.phase(), ShutdownPhase::Stopped);
        info!("Server stopped");

        let report = ShutdownReport {
            total_commands,
            sessions_closed,
            sessions_left_open,
            retraction,
        };
        self.report = Some(report.clone());
        report
    }

    async fn retract_advertisement(&mut self) -> RetractionOutcome {
        let Some(mut advertiser) = self.advertiser.take() else {
            return RetractionOutcome::NotAdvertised;
        };

        match timeout(self.retract_timeout, advertiser.retract()).await {
            Ok(Ok(())) => {
                info!("mDNS service unregistered");
                RetractionOutcome::Retracted
            }
            Ok(Err(e)) => {
                warn!("mDNS cleanup error (service will expire): {e}");
                RetractionOutcome::Failed
            }
            Err(_) => {
                warn!("mDNS unregistration timed out (service will expire naturally)");
                RetractionOutcome::TimedOut
            }
        }
    }
}

/// Waits until the session registry is empty or `drain_timeout` passes.
/// Returns how many sessions are still registered.
async fn drain_sessions(state: &ServerState, drain_timeout: Duration) -> usize {
    let deadline = Instant::now() + drain_timeout;
    loop {
        let remaining = state.active_session_count().await;
        if remaining == 0 {
            return 0;
        }
        if Instant::now() >= deadline {
            let peers = state.active_peers().await;
            warn!(
                "{remaining} session(s) did not finish within {drain_timeout:?}: {}",
                peers.join(", ")
            );
            return remaining;
        }
        sleep(DRAIN_POLL).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::advertiser::{AdvertiseError, MockServiceAdvertiser};
    use crate::application::transport::{Accepted, CommandConnection, TransportError};
    use async_trait::async_trait;
    use spider_core::AdvertisementRecord;

    // ── Test doubles ──────────────────────────────────────────────────────────

    struct NeverConnection;

    #[async_trait]
    impl CommandConnection for NeverConnection {
        async fn recv(&mut self) -> Result<Option<String>, TransportError> {
            std::future::pending().await
        }
        async fn send(&mut self, _text: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn close(&mut self) {}
    }

    #[derive(Default)]
    struct RecordingListener {
        close_calls: usize,
    }

    #[async_trait]
    impl CommandListener for RecordingListener {
        type Connection = NeverConnection;

        async fn accept(&mut self) -> Result<Accepted<NeverConnection>, TransportError> {
            std::future::pending().await
        }

        async fn close(&mut self) {
            self.close_calls += 1;
        }
    }

    /// An advertiser whose retraction never completes.
    struct HangingAdvertiser;

    #[async_trait]
    impl ServiceAdvertiser for HangingAdvertiser {
        async fn register(&mut self, _record: &AdvertisementRecord) -> Result<(), AdvertiseError> {
            Ok(())
        }
        async fn retract(&mut self) -> Result<(), AdvertiseError> {
            std::future::pending().await
        }
    }

    fn coordinator(
        state: &Arc<ServerState>,
        advertiser: Option<Box<dyn ServiceAdvertiser>>,
    ) -> ShutdownCoordinator {
        ShutdownCoordinator::new(
            Arc::clone(state),
            advertiser,
            Duration::from_secs(2),
            Duration::from_millis(500),
        )
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_shutdown_without_advertiser_reaches_stopped() {
        // Arrange
        let state = Arc::new(ServerState::new());
        state.record_command();
        state.record_command();
        let mut listener = RecordingListener::default();

        // Act
        let report = coordinator(&state, None).shutdown(&mut listener).await;

        // Assert
        assert_eq!(state.phase(), ShutdownPhase::Stopped);
        assert_eq!(report.total_commands, 2);
        assert_eq!(report.retraction, RetractionOutcome::NotAdvertised);
        assert_eq!(listener.close_calls, 1);
    }

    #[tokio::test]
    async fn test_shutdown_retracts_advertisement_once() {
        let state = Arc::new(ServerState::new());
        let mut mock = MockServiceAdvertiser::new();
        mock.expect_retract().times(1).returning(|| Ok(()));
        let mut coord = coordinator(&state, Some(Box::new(mock)));
        let mut listener = RecordingListener::default();

        let first = coord.shutdown(&mut listener).await;
        let second = coord.shutdown(&mut listener).await;

        assert_eq!(first.retraction, RetractionOutcome::Retracted);
        assert_eq!(first, second, "second call returns the first report");
        assert_eq!(listener.close_calls, 1);
    }

    #[tokio::test]
    async fn test_retraction_failure_is_not_fatal() {
        let state = Arc::new(ServerState::new());
        let mut mock = MockServiceAdvertiser::new();
        mock.expect_retract()
            .times(1)
            .returning(|| Err(AdvertiseError::Retract("daemon gone".into())));
        let mut listener = RecordingListener::default();

        let report = coordinator(&state, Some(Box::new(mock)))
            .shutdown(&mut listener)
            .await;

        assert_eq!(report.retraction, RetractionOutcome::Failed);
        assert_eq!(state.phase(), ShutdownPhase::Stopped);
        assert_eq!(listener.close_calls, 1, "listener closes even after a failed step");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_retraction_is_abandoned_after_timeout() {
        // Arrange
        let state = Arc::new(ServerState::new());
        let mut listener = RecordingListener::default();
        let started = Instant::now();

        // Act
        let report = coordinator(&state, Some(Box::new(HangingAdvertiser)))
            .shutdown(&mut listener)
            .await;

        // Assert: bounded by the 2 s retraction timeout plus a small constant
        let elapsed = started.elapsed();
        assert_eq!(report.retraction, RetractionOutcome::TimedOut);
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_millis(2_600), "took {elapsed:?}");
        assert_eq!(state.phase(), ShutdownPhase::Stopped);
    }

    /// Registers `n` sessions whose tasks unregister once their token fires.
    async fn spawn_cancellable_sessions(
        state: &Arc<ServerState>,
        n: usize,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let mut tasks = Vec::new();
        for i in 0..n {
            let handle = state.register_session(format!("peer-{i}")).await;
            let s = Arc::clone(state);
            tasks.push(tokio::spawn(async move {
                handle.token.cancelled().await;
                s.unregister_session(handle.id).await;
            }));
        }
        tasks
    }

    #[tokio::test]
    async fn test_shutdown_cancels_open_sessions() {
        // Arrange: three sessions that unregister themselves once cancelled
        let state = Arc::new(ServerState::new());
        let tasks = spawn_cancellable_sessions(&state, 3).await;
        let mut listener = RecordingListener::default();

        // Act
        let report = coordinator(&state, None).shutdown(&mut listener).await;

        // Assert
        assert_eq!(report.sessions_closed, 3);
        assert_eq!(report.sessions_left_open, 0);
        assert_eq!(state.active_session_count().await, 0);
        for t in tasks {
            t.await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_session_does_not_block_shutdown() {
        // Arrange: a session that is registered but never unregisters
        let state = Arc::new(ServerState::new());
        state.register_session("stuck").await;
        let mut listener = RecordingListener::default();

        // Act
        let report = coordinator(&state, None).shutdown(&mut listener).await;

        // Assert
        assert_eq!(report.sessions_left_open, 1);
        assert_eq!(state.phase(), ShutdownPhase::Stopped);
    }

    #[tokio::test]
    async fn test_sessions_ended_by_ctrl_c_are_still_reported_closed() {
        // Arrange: Ctrl+C stops the server and every session unregisters
        // before the coordinator gets to run
        let state = Arc::new(ServerState::new());
        let tasks = spawn_cancellable_sessions(&state, 3).await;
        state.begin_stopping();
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(state.active_session_count().await, 0);
        let mut listener = RecordingListener::default();

        // Act
        let report = coordinator(&state, None).shutdown(&mut listener).await;

        // Assert
        assert_eq!(report.sessions_closed, 3);
        assert_eq!(report.sessions_left_open, 0);
    }

    #[test]
    fn test_shutdown_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let state = Arc::new(ServerState::new());
        let mut coord = coordinator(&state, Some(Box::new(HangingAdvertiser)));
        let mut listener = RecordingListener::default();

        assert_send(&coord.shutdown(&mut listener));
    }
}
