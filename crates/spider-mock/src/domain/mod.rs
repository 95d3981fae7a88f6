//! Domain layer for spider-mock.
//!
//! Pure configuration types with no dependency on sockets or the async runtime.

pub mod config;

pub use config::ServerConfig;
