//! Multicast DNS advertisement of `robot-spider.local` (mdns-sd).
//!
//! mdns-sd runs its own responder thread and talks to callers through
//! blocking channels, so unregistration is waited on from
//! `spawn_blocking`.  The wait is also capped here so the blocking thread
//! never outlives the runtime by much.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use async_trait::async_trait;
use mdns_sd::{ServiceDaemon, ServiceInfo, UnregisterStatus};
use tracing::debug;

use spider_core::domain::advertisement::RETRACT_TIMEOUT;
use spider_core::AdvertisementRecord;

use crate::application::advertiser::{AdvertiseError, ServiceAdvertiser};

/// Best guess at the address LAN peers reach us on.
///
/// Connecting a UDP socket sends nothing; it only makes the OS pick the
/// outbound interface.  Falls back to loopback when there is no route.
pub fn local_ip() -> IpAddr {
    fn probe() -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(("8.8.8.8", 80))?;
        Ok(socket.local_addr()?.ip())
    }

    probe().unwrap_or_else(|e| {
        debug!("could not determine local IP ({e}); using loopback");
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    })
}

/// Builds the mdns-sd record for `record`.
pub fn service_info(record: &AdvertisementRecord) -> Result<ServiceInfo, AdvertiseError> {
    let ip = record.address.to_string();
    ServiceInfo::new(
        &record.service_type,
        &record.instance_name,
        &record.absolute_host_name(),
        ip.as_str(),
        record.port,
        HashMap::<String, String>::new(),
    )
    .map_err(|e| AdvertiseError::Register(e.to_string()))
}

/// [`ServiceAdvertiser`] backed by an mdns-sd daemon.
#[derive(Default)]
pub struct MdnsAdvertiser {
    registered: Option<(ServiceDaemon, String)>,
}

impl MdnsAdvertiser {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceAdvertiser for MdnsAdvertiser {
    async fn register(&mut self, record: &AdvertisementRecord) -> Result<(), AdvertiseError> {
        let info = service_info(record)?;
        let fullname = info.get_fullname().to_string();

        let daemon = ServiceDaemon::new().map_err(|e| AdvertiseError::Register(e.to_string()))?;
        if let Err(e) = daemon.register(info) {
            daemon.shutdown().ok();
            return Err(AdvertiseError::Register(e.to_string()));
        }

        self.registered = Some((daemon, fullname));
        Ok(())
    }

    async fn retract(&mut self) -> Result<(), AdvertiseError> {
        let (daemon, fullname) = self.registered.take().ok_or(AdvertiseError::NotRegistered)?;

        tokio::task::spawn_blocking(move || {
            let outcome = daemon
                .unregister(&fullname)
                .map_err(|e| AdvertiseError::Retract(e.to_string()))
                .and_then(|rx| {
                    rx.recv_timeout(RETRACT_TIMEOUT)
                        .map_err(|e| AdvertiseError::Retract(e.to_string()))
                })
                .and_then(|status| match status {
                    UnregisterStatus::OK => Ok(()),
                    other => Err(AdvertiseError::Retract(format!("{fullname}: {other:?}"))),
                });
            daemon.shutdown().ok();
            outcome
        })
        .await
        .map_err(|e| AdvertiseError::Retract(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spider_core::domain::advertisement::WEBSOCKET_PORT;

    fn record() -> AdvertisementRecord {
        AdvertisementRecord::robot_spider(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42)), WEBSOCKET_PORT)
    }

    #[test]
    fn test_service_info_uses_robot_spider_names() {
        // Act
        let info = service_info(&record()).unwrap();

        // Assert
        assert_eq!(info.get_fullname(), "robot-spider._http._tcp.local.");
        assert_eq!(info.get_hostname(), "robot-spider.local.");
        assert_eq!(info.get_port(), 8080);
    }

    #[test]
    fn test_service_info_carries_the_address() {
        let info = service_info(&record()).unwrap();
        assert!(info
            .get_addresses()
            .contains(&IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42))));
    }

    #[test]
    fn test_local_ip_is_ipv4() {
        assert!(local_ip().is_ipv4());
    }

    #[tokio::test]
    async fn test_retract_without_register_is_not_registered() {
        let mut advertiser = MdnsAdvertiser::new();
        assert!(matches!(
            advertiser.retract().await,
            Err(AdvertiseError::NotRegistered)
        ));
    }
}
