//! Error types shared by the retry and throttle wrappers.

use std::fmt::Debug;
use std::hash::Hash;

/// Invalid construction parameters. Raised when a policy is built, never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// Attempt count must be at least 1.
    #[error("attempt count must be > 0, not {0}")]
    InvalidAttemptCount(i64),
    /// Durations must be finite and non-negative.
    #[error("{name} must be a finite, non-negative number of seconds, not {value}")]
    InvalidDuration { name: &'static str, value: f64 },
}

/// The process-interrupt marker: a wait was cut short by a tripped
/// [`InterruptToken`](crate::control::InterruptToken).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("interrupted")]
pub struct Interrupted;

/// Classification hooks a wrapped callable's error must provide.
///
/// `Kind` is the identifier matched against a policy's retryable set. An
/// error reporting `is_interrupt()` is never retried or collected.
pub trait Failure {
    type Kind: Copy + Eq + Hash + Debug;

    fn kind(&self) -> Self::Kind;

    fn is_interrupt(&self) -> bool {
        false
    }
}

impl Failure for Interrupted {
    type Kind = ();

    fn kind(&self) -> Self::Kind {}

    fn is_interrupt(&self) -> bool {
        true
    }
}
