//! Acknowledgment replies.
//!
//! When the server runs with acknowledgments enabled, every message gets exactly
//! one reply:
//!
//! | Message class | Reply                              |
//! |---------------|------------------------------------|
//! | valid         | `OK:<command>`                     |
//! | invalid       | `ERROR:Unknown command '<text>'`   |
//!
//! With acknowledgments disabled nothing is written back at all.

use crate::domain::command::Validation;

/// Prefix of a positive acknowledgment.
pub const OK_PREFIX: &str = "OK:";

/// Prefix of a negative acknowledgment.
pub const ERROR_PREFIX: &str = "ERROR:";

/// Formats the reply for a classified message.
///
/// # Example
///
/// ```rust
/// use spider_core::{acknowledgment, validate_command};
///
/// assert_eq!(acknowledgment(&validate_command("forward")), "OK:forward");
/// assert_eq!(
///     acknowledgment(&validate_command("spin")),
///     "ERROR:Unknown command 'spin'"
/// );
/// ```
pub fn acknowledgment(validation: &Validation) -> String {
    match validation {
        Validation::Valid(cmd) => format!("{OK_PREFIX}{cmd}"),
        Validation::Invalid(text) => format!("{ERROR_PREFIX}Unknown command '{text}'"),
    }
}
