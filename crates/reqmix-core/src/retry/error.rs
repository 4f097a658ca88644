//! Errors surfaced by the retry loop.

use std::fmt;

/// Every error raised across an exhausted attempt sequence, oldest first.
///
/// Never empty: it is only built after at least one failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateFailure<E> {
    errors: Vec<E>,
}

impl<E> AggregateFailure<E> {
    pub(super) fn new(errors: Vec<E>) -> Self {
        debug_assert!(!errors.is_empty());
        Self { errors }
    }

    /// Number of failed attempts.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// The error from the final attempt.
    pub fn last(&self) -> Option<&E> {
        self.errors.last()
    }

    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }
}

impl<E: fmt::Display> fmt::Display for AggregateFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed after {} attempts", self.errors.len())?;
        if let Some(last) = self.errors.last() {
            write!(f, "; last error: {}", last)?;
        }
        Ok(())
    }
}

impl<E> std::error::Error for AggregateFailure<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .last()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Outcome of a retried call that did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The error's kind is outside the retryable set; returned as raised.
    #[error(transparent)]
    Unretryable(E),
    /// All attempts failed with retryable errors.
    #[error(transparent)]
    Exhausted(AggregateFailure<E>),
    /// An interrupt stopped the sequence. Carries the callable's own error when
    /// the interrupt came from the callable rather than from a wait.
    #[error("interrupted")]
    Interrupted(Option<E>),
}

impl<E> RetryError<E> {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, RetryError::Interrupted(_))
    }

    /// The most recent error raised by the wrapped callable, if any.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Unretryable(e) => Some(e),
            RetryError::Exhausted(agg) => agg.last(),
            RetryError::Interrupted(e) => e.as_ref(),
        }
    }

    /// Every error the callable raised during the call, oldest first.
    pub fn into_errors(self) -> Vec<E> {
        match self {
            RetryError::Unretryable(e) => vec![e],
            RetryError::Exhausted(agg) => agg.into_errors(),
            RetryError::Interrupted(e) => e.into_iter().collect(),
        }
    }
}

impl<E> From<crate::error::Interrupted> for RetryError<E> {
    fn from(_: crate::error::Interrupted) -> Self {
        RetryError::Interrupted(None)
    }
}
