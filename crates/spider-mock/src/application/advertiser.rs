//! Service advertiser seam.
//!
//! The WebSocket variant publishes an mDNS record so the control app finds the
//! mock as `robot-spider.local`.  Discoverability is a convenience, not a
//! requirement: if registration fails the server keeps serving and clients
//! connect by IP instead.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

use spider_core::AdvertisementRecord;

/// Errors raised while publishing or withdrawing a discovery record.
///
/// Never fatal: callers log them as warnings.
#[derive(Debug, Error)]
pub enum AdvertiseError {
    #[error("registration failed: {0}")]
    Register(String),
    #[error("retraction failed: {0}")]
    Retract(String),
    #[error("no record is registered")]
    NotRegistered,
}

/// Publishes one discovery record for the lifetime of the server.
///
/// `register` is called at most once; `retract` is called at most once, and
/// only after a successful `register`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceAdvertiser: Send {
    async fn register(&mut self, record: &AdvertisementRecord) -> Result<(), AdvertiseError>;

    /// Withdraws the record.  May take arbitrarily long; the shutdown
    /// coordinator bounds it with a timeout.
    async fn retract(&mut self) -> Result<(), AdvertiseError>;
}

/// Registers `record` with `advertiser`.
///
/// Returns the advertiser on success so it can be retracted at shutdown, or
/// `None` when registration failed and the server continues undiscoverable.
pub async fn publish(
    mut advertiser: Box<dyn ServiceAdvertiser>,
    record: &AdvertisementRecord,
) -> Option<Box<dyn ServiceAdvertiser>> {
    match advertiser.register(record).await {
        Ok(()) => {
            info!("mDNS service registered as '{}'", record.full_name());
            info!("  Hostname: {}", record.host_name);
            Some(advertiser)
        }
        Err(e) => {
            error!("Failed to register mDNS service: {e}");
            warn!("Server will run without mDNS advertisement");
            None
        }
    }
}
