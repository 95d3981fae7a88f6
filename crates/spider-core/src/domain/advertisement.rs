//! Discovery constants and the published service record.
//!
//! The WebSocket variant of the mock announces itself over multicast DNS so the
//! control app can reach it as `robot-spider.local` instead of a raw IP.  The
//! Bluetooth variant is found through its Serial Port Profile record instead.

use std::net::IpAddr;
use std::time::Duration;

/// Human-readable name shared by both variants.
pub const SERVICE_NAME: &str = "robot-spider";

/// Host name the control app resolves.
pub const MDNS_HOSTNAME: &str = "robot-spider.local";

/// DNS-SD service type the record is published under.
pub const MDNS_SERVICE_TYPE: &str = "_http._tcp.local.";

/// Fixed WebSocket port.
pub const WEBSOCKET_PORT: u16 = 8080;

/// Standard Serial Port Profile service class UUID.
pub const SPP_UUID: &str = "00001101-0000-1000-8000-00805F9B34FB";

/// Upper bound on how long shutdown waits for the record to be withdrawn.
///
/// After this the record is abandoned and expires through its own TTL.
pub const RETRACT_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything needed to publish one discoverable service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementRecord {
    /// Instance name, e.g. `robot-spider`.
    pub instance_name: String,
    /// Service type, e.g. `_http._tcp.local.`.
    pub service_type: String,
    /// Host name without the trailing dot, e.g. `robot-spider.local`.
    pub host_name: String,
    pub port: u16,
    /// Address peers should connect to.
    pub address: IpAddr,
}

impl AdvertisementRecord {
    /// Builds the robot-spider record for `address` and `port`.
    pub fn robot_spider(address: IpAddr, port: u16) -> Self {
        Self {
            instance_name: SERVICE_NAME.to_string(),
            service_type: MDNS_SERVICE_TYPE.to_string(),
            host_name: MDNS_HOSTNAME.to_string(),
            port,
            address,
        }
    }

    /// Fully qualified instance name: `robot-spider._http._tcp.local.`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.instance_name, self.service_type)
    }

    /// Host name in absolute form with the trailing dot multicast DNS requires.
    pub fn absolute_host_name(&self) -> String {
        if self.host_name.ends_with('.') {
            self.host_name.clone()
        } else {
            format!("{}.", self.host_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn record() -> AdvertisementRecord {
        AdvertisementRecord::robot_spider(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)), WEBSOCKET_PORT)
    }

    #[test]
    fn test_robot_spider_record_uses_discovery_constants() {
        let rec = record();
        assert_eq!(rec.instance_name, "robot-spider");
        assert_eq!(rec.service_type, "_http._tcp.local.");
        assert_eq!(rec.host_name, "robot-spider.local");
        assert_eq!(rec.port, 8080);
    }

    #[test]
    fn test_full_name_joins_instance_and_type() {
        assert_eq!(record().full_name(), "robot-spider._http._tcp.local.");
    }

    #[test]
    fn test_absolute_host_name_appends_single_dot() {
        let mut rec = record();
        assert_eq!(rec.absolute_host_name(), "robot-spider.local.");

        rec.host_name = "robot-spider.local.".to_string();
        assert_eq!(rec.absolute_host_name(), "robot-spider.local.");
    }

    #[test]
    fn test_retract_timeout_is_two_seconds() {
        assert_eq!(RETRACT_TIMEOUT, Duration::from_secs(2));
    }
}
