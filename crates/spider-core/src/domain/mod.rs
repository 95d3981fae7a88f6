//! Domain types: the command vocabulary and the discovery record.

pub mod advertisement;
pub mod command;

pub use advertisement::AdvertisementRecord;
pub use command::{Command, Validation};
