//! The robot command vocabulary and its validator.
//!
//! The hexapod understands exactly five movement commands.  Everything a client
//! sends is first canonicalized (trimmed and lower-cased) by the session and then
//! classified by [`validate_command`]:
//!
//! ```text
//! "  FoRwArD\n"  ──canonicalize──►  "forward"  ──validate──►  Valid(Forward)
//! "spin"         ──canonicalize──►  "spin"     ──validate──►  Invalid("spin")
//! ```
//!
//! Validation is a pure function: no state, no side effects, and the same input
//! always produces the same output.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One of the five movement commands the robot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Bring the legs into the standing pose.
    Init,
    Forward,
    Backward,
    Left,
    Right,
}

impl Command {
    /// Every command, in declaration order.
    pub const ALL: [Command; 5] = [
        Command::Init,
        Command::Forward,
        Command::Backward,
        Command::Left,
        Command::Right,
    ];

    /// Returns the canonical lower-case wire name (`"forward"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::Forward => "forward",
            Command::Backward => "backward",
            Command::Left => "left",
            Command::Right => "right",
        }
    }

    /// Returns the upper-case name used in command log lines (`"FORWARD"`).
    pub fn log_name(self) -> &'static str {
        match self {
            Command::Init => "INIT",
            Command::Forward => "FORWARD",
            Command::Backward => "BACKWARD",
            Command::Left => "LEFT",
            Command::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Command::from_str`] when the text is not one of the five commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    /// Matches the whole string, ignoring ASCII case.  No trimming is applied.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The text named one of the five commands.
    Valid(Command),
    /// Anything else; carries the text exactly as it was passed in.
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }
}

/// Classifies `input` as a [`Command`] or as invalid text.
///
/// Matching is exact and case-insensitive against the closed vocabulary.
/// There are no aliases or prefix matches, and surrounding whitespace is *not*
/// removed here: callers canonicalize first with [`canonicalize`].
///
/// # Example
///
/// ```rust
/// use spider_core::{validate_command, Command, Validation};
///
/// assert_eq!(validate_command("FoRwArD"), Validation::Valid(Command::Forward));
/// assert_eq!(validate_command("jump"), Validation::Invalid("jump".to_string()));
/// ```
pub fn validate_command(input: &str) -> Validation {
    match input.parse::<Command>() {
        Ok(cmd) => Validation::Valid(cmd),
        Err(UnknownCommand(text)) => Validation::Invalid(text),
    }
}

/// Trims surrounding whitespace and lower-cases a raw message.
pub fn canonicalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
