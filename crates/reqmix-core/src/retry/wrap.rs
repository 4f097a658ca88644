//! [`Retry`]: an [`Operation`] whose every invocation goes through a [`RetryPolicy`].

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use super::error::RetryError;
use super::policy::RetryPolicy;
use crate::error::Failure;
use crate::operation::{HasName, Operation};
use crate::resolve::Attribute;

#[derive(Debug, Clone)]
pub struct Retry<O, K> {
    inner: O,
    policy: RetryPolicy<K>,
}

/// Wrap `inner` so each invocation is retried according to `policy`.
pub fn wrap_with_retry<O, K>(inner: O, policy: RetryPolicy<K>) -> Retry<O, K> {
    Retry { inner, policy }
}

impl<O, K> Retry<O, K> {
    pub fn policy(&self) -> &RetryPolicy<K> {
        &self.policy
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: HasName, K> HasName for Retry<O, K> {
    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl<S, A, O, K> Operation<S, A> for Retry<O, K>
where
    S: Attribute<u32> + Attribute<Duration> + fmt::Debug + ?Sized,
    A: fmt::Debug + ?Sized,
    O: Operation<S, A>,
    O::Error: Failure<Kind = K> + fmt::Debug,
    K: Copy + Eq + Hash + fmt::Debug,
{
    type Output = O::Output;
    type Error = RetryError<O::Error>;

    fn invoke(&self, instance: &S, args: &A) -> Result<Self::Output, Self::Error> {
        self.policy.run_inner(
            instance,
            || self.inner.invoke(instance, args),
            |attempts, last| {
                tracing::error!(
                    operation = self.inner.name(),
                    attempts,
                    ?instance,
                    ?args,
                    last_error = ?last,
                    "failed to complete {} after {:03} attempts",
                    self.inner.name(),
                    attempts
                );
            },
        )
    }
}
