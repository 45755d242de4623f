//! Error types for pom.
//!
//! Only two things can go wrong: the startup configuration is unusable, or a
//! desktop notification could not be delivered. Everything the session
//! controller does is infallible once a [`crate::session::SessionConfig`]
//! exists.

use thiserror::Error;

/// Malformed or missing startup values. Fatal, reported before the timer runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "expected either no arguments or exactly three (work duration, break duration, cycles), got {0}"
    )]
    ArgumentCount(usize),

    #[error("{field} must be a positive integer")]
    NotPositive { field: &'static str },
}

/// A best-effort notification that did not make it to the desktop.
///
/// Logged and dropped; never retried and never fatal.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to hand notification to a worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("desktop notification failed: {0}")]
    Delivery(String),
}
