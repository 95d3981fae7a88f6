//! # spider-core
//!
//! Shared library for the robot-spider mock containing the command vocabulary,
//! the acknowledgment wire format, and the discovery constants.
//!
//! This crate is used by both the mock servers and the discovery probe.
//! It has zero dependencies on async runtimes, sockets, or OS APIs.
//!
//! # Architecture overview
//!
//! The mock impersonates a hexapod robot so a control app can be exercised
//! without hardware.  The app sends one short text command at a time (for
//! example `forward`) and, when acknowledgments are enabled, the mock answers
//! with `OK:forward` or `ERROR:Unknown command '...'`.
//!
//! - **`domain`** – The closed [`Command`] enumeration, the pure validator, and
//!   the [`AdvertisementRecord`] published for discovery.
//!
//! - **`protocol`** – How text travels: the acknowledgment strings and the
//!   reassembly of byte-stream reads into individual messages.

pub mod domain;
pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `spider_core::validate_command` instead of the longer module path.
pub use domain::advertisement::AdvertisementRecord;
pub use domain::command::{canonicalize, validate_command, Command, UnknownCommand, Validation};
pub use protocol::ack::acknowledgment;
pub use protocol::framing::LineDecoder;
