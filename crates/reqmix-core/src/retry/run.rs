//! Retry loop: run a closure until success, an unretryable error, or exhaustion.

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use super::error::{AggregateFailure, RetryError};
use super::policy::RetryPolicy;
use crate::error::Failure;
use crate::resolve::Attribute;

impl<K: Copy + Eq + Hash + fmt::Debug> RetryPolicy<K> {
    /// Runs `f` up to the resolved attempt count on behalf of `instance`.
    ///
    /// Interrupts propagate at once. An error whose kind is not retryable is
    /// returned as-is. After the last failed attempt every collected error is
    /// returned in a single [`AggregateFailure`].
    pub fn run<S, T, E, F>(&self, instance: &S, f: F) -> Result<T, RetryError<E>>
    where
        S: Attribute<u32> + Attribute<Duration> + ?Sized,
        E: Failure<Kind = K> + fmt::Debug,
        F: FnMut() -> Result<T, E>,
    {
        self.run_inner(instance, f, |attempts, last| {
            tracing::error!(attempts, last_error = ?last, "call failed after {} attempts", attempts);
        })
    }

    pub(super) fn run_inner<S, T, E, F, L>(
        &self,
        instance: &S,
        mut f: F,
        on_exhausted: L,
    ) -> Result<T, RetryError<E>>
    where
        S: Attribute<u32> + Attribute<Duration> + ?Sized,
        E: Failure<Kind = K> + fmt::Debug,
        F: FnMut() -> Result<T, E>,
        L: FnOnce(u32, Option<&E>),
    {
        let attempts = self.attempts_for(instance);
        let delay = self.delay_for(instance);
        let mut errors = Vec::new();

        for attempt in 1..=attempts {
            if self.clock.interrupted() {
                return Err(RetryError::Interrupted(None));
            }
            let err = match f() {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            if err.is_interrupt() {
                return Err(RetryError::Interrupted(Some(err)));
            }
            let kind = err.kind();
            if !self.should_retry(&kind) {
                tracing::debug!(attempt, ?kind, "error kind not retryable");
                return Err(RetryError::Unretryable(err));
            }
            tracing::debug!(attempt, attempts, ?kind, error = ?err, "attempt failed");
            errors.push(err);

            if attempt == attempts {
                on_exhausted(attempts, errors.last());
                return Err(RetryError::Exhausted(AggregateFailure::new(errors)));
            }
            if !delay.is_zero() {
                self.clock.sleep(delay)?;
            }
        }

        unreachable!("retry loop returns on or before the last attempt")
    }
}
