//! The four discovery checks.
//!
//! Each check returns the detail lines to print on success, or a
//! [`ProbeError`] describing why it failed.  Checks never panic and never
//! abort the run; the caller reports every outcome.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use mdns_sd::{ServiceDaemon, ServiceEvent};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Overall bound on the ping child process.
pub const PING_TIMEOUT: Duration = Duration::from_secs(3);

/// Why a check failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{host} resolved, but not to any IPv4 address")]
    NoIpv4 { host: String },
    #[error("service browse failed: {0}")]
    Browse(String),
    #[error("no {service_type} services found")]
    NothingFound { service_type: String },
    #[error("ping command not found")]
    PingMissing,
    #[error("ping failed (exit status {0})")]
    PingFailed(String),
    #[error("ping timed out")]
    PingTimedOut,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Failures that mean the check could not run at all.
    pub fn is_skip(&self) -> bool {
        matches!(self, ProbeError::PingMissing)
    }
}

/// What to probe.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub hostname: String,
    pub port: u16,
    pub service_type: String,
    pub browse_window: Duration,
}

/// Result of one named check.
#[derive(Debug)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub result: Result<Vec<String>, ProbeError>,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// The checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Resolve,
    Lookup,
    Browse,
    Ping,
}

impl Check {
    pub const ALL: [Check; 4] = [Check::Resolve, Check::Lookup, Check::Browse, Check::Ping];

    pub fn name(self) -> &'static str {
        match self {
            Check::Resolve => "DNS/mDNS Resolution",
            Check::Lookup => "getaddrinfo() lookup",
            Check::Browse => "mDNS Service Discovery",
            Check::Ping => "Ping Test",
        }
    }

    pub async fn run(self, config: &ProbeConfig) -> CheckOutcome {
        let result = match self {
            Check::Resolve => resolve_name(&config.hostname).await,
            Check::Lookup => detailed_lookup(&config.hostname, config.port).await,
            Check::Browse => browse_services(&config.service_type, config.browse_window).await,
            Check::Ping => ping(&config.hostname).await,
        };
        CheckOutcome {
            name: self.name(),
            result,
        }
    }
}

// ── Check 1 ───────────────────────────────────────────────────────────────────

/// Resolves `host` through the system resolver and reports its first IPv4 address.
pub async fn resolve_name(host: &str) -> Result<Vec<String>, ProbeError> {
    let addrs = lookup(host, 0).await?;
    let ip = first_ipv4(addrs.iter().map(SocketAddr::ip)).ok_or_else(|| ProbeError::NoIpv4 {
        host: host.to_string(),
    })?;
    Ok(vec![format!("{host} → {ip}")])
}

// ── Check 2 ───────────────────────────────────────────────────────────────────

/// Resolves `host:port` and lists every IPv4 socket address.
pub async fn detailed_lookup(host: &str, port: u16) -> Result<Vec<String>, ProbeError> {
    let v4 = ipv4_only(lookup(host, port).await?);
    if v4.is_empty() {
        return Err(ProbeError::NoIpv4 {
            host: host.to_string(),
        });
    }

    let mut lines = vec![format!("Found {} result(s)", v4.len())];
    lines.extend(v4.iter().map(|addr| format!("→ {addr}")));
    Ok(lines)
}

async fn lookup(host: &str, port: u16) -> Result<Vec<SocketAddr>, ProbeError> {
    tokio::net::lookup_host((host, port))
        .await
        .map(Iterator::collect)
        .map_err(|source| ProbeError::Resolve {
            host: host.to_string(),
            source,
        })
}

pub fn first_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Option<IpAddr> {
    addrs.into_iter().find(IpAddr::is_ipv4)
}

/// IPv4 entries only, duplicates removed, order kept.
pub fn ipv4_only(addrs: Vec<SocketAddr>) -> Vec<SocketAddr> {
    let mut seen = Vec::new();
    for addr in addrs.into_iter().filter(SocketAddr::is_ipv4) {
        if !seen.contains(&addr) {
            seen.push(addr);
        }
    }
    seen
}

// ── Check 3 ───────────────────────────────────────────────────────────────────

/// A resolved service instance seen while browsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundService {
    pub fullname: String,
    pub addresses: Vec<IpAddr>,
    pub port: u16,
}

impl FoundService {
    pub fn describe(&self) -> Vec<String> {
        let addresses: Vec<String> = self.addresses.iter().map(IpAddr::to_string).collect();
        vec![
            format!("Found: {}", self.fullname),
            format!("  Addresses: {}", addresses.join(", ")),
            format!("  Port: {}", self.port),
        ]
    }
}

/// Browses `service_type` for `window` and reports every resolved instance.
pub async fn browse_services(
    service_type: &str,
    window: Duration,
) -> Result<Vec<String>, ProbeError> {
    let ty = service_type.to_string();
    let found = tokio::task::spawn_blocking(move || browse_blocking(&ty, window))
        .await
        .map_err(|e| ProbeError::Browse(e.to_string()))??;

    if found.is_empty() {
        return Err(ProbeError::NothingFound {
            service_type: service_type.to_string(),
        });
    }

    let mut lines: Vec<String> = found.iter().flat_map(FoundService::describe).collect();
    lines.push(format!("Found {} service(s)", found.len()));
    Ok(lines)
}

fn browse_blocking(service_type: &str, window: Duration) -> Result<Vec<FoundService>, ProbeError> {
    let daemon = ServiceDaemon::new().map_err(|e| ProbeError::Browse(e.to_string()))?;
    let events = daemon
        .browse(service_type)
        .map_err(|e| ProbeError::Browse(e.to_string()))?;

    let deadline = Instant::now() + window;
    let mut found = BTreeMap::new();
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match events.recv_timeout(left) {
            Ok(ServiceEvent::ServiceResolved(info)) => {
                let mut addresses: Vec<IpAddr> = info.get_addresses().iter().copied().collect();
                addresses.sort();
                let service = FoundService {
                    fullname: info.get_fullname().to_string(),
                    addresses,
                    port: info.get_port(),
                };
                found.insert(service.fullname.clone(), service);
            }
            Ok(other) => debug!("browse event: {other:?}"),
            // Timed out (window over) or the daemon went away.
            Err(_) => break,
        }
    }

    daemon.stop_browse(service_type).ok();
    daemon.shutdown().ok();
    Ok(found.into_values().collect())
}

// ── Check 4 ───────────────────────────────────────────────────────────────────

/// Sends one ICMP echo with the system `ping` (`-c 1 -W 2`), bounded by
/// [`PING_TIMEOUT`].
pub async fn ping(host: &str) -> Result<Vec<String>, ProbeError> {
    let child = Command::new("ping")
        .args(["-c", "1", "-W", "2", host])
        .kill_on_drop(true)
        .output();

    let output = match timeout(PING_TIMEOUT, child).await {
        Err(_) => return Err(ProbeError::PingTimedOut),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => return Err(ProbeError::PingMissing),
        Ok(result) => result?,
    };

    if !output.status.success() {
        return Err(ProbeError::PingFailed(output.status.to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = vec![format!("{host} is pingable")];
    lines.extend(reply_lines(&stdout));
    Ok(lines)
}

/// The `bytes from` lines of ping output, trimmed.
pub fn reply_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| line.contains("bytes from"))
        .map(|line| line.trim().to_string())
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_first_ipv4_skips_ipv6() {
        let addrs = [
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 7)),
        ];
        assert_eq!(first_ipv4(addrs), Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 7))));
    }

    #[test]
    fn test_first_ipv4_none_for_ipv6_only() {
        assert_eq!(first_ipv4([IpAddr::V6(Ipv6Addr::LOCALHOST)]), None);
    }

    #[test]
    fn test_ipv4_only_dedupes_and_keeps_order() {
        // Arrange: getaddrinfo often repeats entries per socket type
        let a: SocketAddr = "10.0.0.2:8080".parse().unwrap();
        let b: SocketAddr = "10.0.0.1:8080".parse().unwrap();
        let v6: SocketAddr = "[::1]:8080".parse().unwrap();

        // Act
        let out = ipv4_only(vec![a, v6, b, a]);

        // Assert
        assert_eq!(out, vec![a, b]);
    }

    #[test]
    fn test_reply_lines_extracts_bytes_from() {
        let stdout = "PING robot-spider.local (192.168.1.20): 56 data bytes\n\
                      64 bytes from 192.168.1.20: icmp_seq=0 ttl=64 time=3.1 ms\n\
                      \n--- robot-spider.local ping statistics ---\n";
        assert_eq!(
            reply_lines(stdout),
            vec!["64 bytes from 192.168.1.20: icmp_seq=0 ttl=64 time=3.1 ms"]
        );
    }

    #[test]
    fn test_found_service_describe() {
        let service = FoundService {
            fullname: "robot-spider._http._tcp.local.".into(),
            addresses: vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))],
            port: 8080,
        };
        assert_eq!(
            service.describe(),
            vec![
                "Found: robot-spider._http._tcp.local.",
                "  Addresses: 192.168.1.20",
                "  Port: 8080",
            ]
        );
    }

    #[test]
    fn test_checks_run_in_report_order() {
        let names: Vec<&str> = Check::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "DNS/mDNS Resolution",
                "getaddrinfo() lookup",
                "mDNS Service Discovery",
                "Ping Test",
            ]
        );
    }

    #[test]
    fn test_ping_missing_is_a_skip() {
        assert!(ProbeError::PingMissing.is_skip());
        assert!(!ProbeError::PingTimedOut.is_skip());
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let lines = resolve_name("localhost").await.unwrap();
        assert_eq!(lines, vec!["localhost → 127.0.0.1"]);
    }

    #[tokio::test]
    async fn test_detailed_lookup_localhost_lists_port() {
        let lines = detailed_lookup("localhost", 8080).await.unwrap();
        assert!(lines.iter().any(|l| l == "→ 127.0.0.1:8080"), "{lines:?}");
    }

    #[tokio::test]
    async fn test_resolve_invalid_name_fails() {
        let result = resolve_name("no-such-host.invalid").await;
        assert!(matches!(result, Err(ProbeError::Resolve { .. })));
    }
}
