//! [`Throttled`]: an [`Operation`] gated by a [`ThrottleGate`].

use std::time::Duration;

use super::gate::ThrottleGate;
use crate::error::Interrupted;
use crate::operation::{HasName, Operation};
use crate::resolve::Attribute;

#[derive(Debug)]
pub struct Throttled<O> {
    inner: O,
    gate: ThrottleGate,
}

/// Wrap `inner` so consecutive invocations are spaced by `gate`'s interval.
pub fn wrap_with_throttle<O>(inner: O, gate: ThrottleGate) -> Throttled<O> {
    Throttled { inner, gate }
}

impl<O> Throttled<O> {
    pub fn gate(&self) -> &ThrottleGate {
        &self.gate
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: HasName> HasName for Throttled<O> {
    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl<S, A, O> Operation<S, A> for Throttled<O>
where
    S: Attribute<Duration> + ?Sized,
    A: ?Sized,
    O: Operation<S, A>,
    O::Error: From<Interrupted>,
{
    type Output = O::Output;
    type Error = O::Error;

    fn invoke(&self, instance: &S, args: &A) -> Result<Self::Output, Self::Error> {
        self.gate.run(instance, || self.inner.invoke(instance, args))
    }
}
