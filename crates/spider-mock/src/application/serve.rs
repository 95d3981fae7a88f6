//! Top-level server run: accept until stopped, then shut down in order.

use std::sync::Arc;

use crate::application::acceptor::{run_acceptor, SessionPolicy};
use crate::application::advertiser::ServiceAdvertiser;
use crate::application::shutdown::{ShutdownCoordinator, ShutdownReport};
use crate::application::state::ServerState;
use crate::application::transport::CommandListener;
use crate::domain::config::ServerConfig;

/// Serves clients from `listener` until shutdown is requested through `state`
/// (or the listener is exhausted), then runs the shutdown sequence.
///
/// `advertiser` is whatever [`publish`](crate::application::publish) returned.
pub async fn serve<L: CommandListener>(
    mut listener: L,
    state: Arc<ServerState>,
    policy: SessionPolicy,
    advertiser: Option<Box<dyn ServiceAdvertiser>>,
    config: &ServerConfig,
) -> ShutdownReport {
    run_acceptor(&mut listener, &state, policy, config.send_acks).await;

    let mut coordinator = ShutdownCoordinator::new(
        Arc::clone(&state),
        advertiser,
        config.retract_timeout,
        config.drain_timeout,
    );
    coordinator.shutdown(&mut listener).await
}
