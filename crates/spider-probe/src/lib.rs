//! spider-probe library crate.
//!
//! Answers "can the control app find the mock?" by running, in order:
//!
//! 1. Name resolution of `robot-spider.local` through the system resolver.
//! 2. A detailed `host:port` lookup listing every IPv4 address.
//! 3. A multicast DNS browse for `_http._tcp.local.` instances.
//! 4. A single `ping` to the host.
//!
//! Each check passes or fails independently; the `mdns-probe` binary prints
//! a summary and exits 0 if at least one passed.

pub mod checks;
pub mod report;

pub use checks::{Check, CheckOutcome, ProbeConfig, ProbeError};
pub use report::{Summary, Verdict};
