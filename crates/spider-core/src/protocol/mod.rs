//! Protocol module: acknowledgment strings and byte-stream message framing.

pub mod ack;
pub mod framing;

pub use ack::acknowledgment;
pub use framing::LineDecoder;
