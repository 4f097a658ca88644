//! Callables that the retry and throttle wrappers can wrap and be wrapped by.
//!
//! An [`Operation`] is invoked with an explicit calling instance and an
//! argument value. Wrappers are operations themselves, so they stack:
//! `wrap_with_throttle(wrap_with_retry(named("fetch", f), policy), gate)`.

/// Wrappers report the name of the callable they ultimately wrap.
pub trait HasName {
    fn name(&self) -> &str;
}

/// A named callable taking `(instance, args)`.
pub trait Operation<S: ?Sized, A: ?Sized>: HasName {
    type Output;
    type Error;

    fn invoke(&self, instance: &S, args: &A) -> Result<Self::Output, Self::Error>;
}

/// Fix the calling instance, yielding something callable with arguments only.
pub fn bind<'a, O, S: ?Sized>(operation: &'a O, instance: &'a S) -> Bound<'a, O, S> {
    Bound {
        operation,
        instance,
    }
}

/// A plain function lifted into an [`Operation`].
#[derive(Debug, Clone)]
pub struct Named<F> {
    name: String,
    func: F,
}

/// Give `func` a name so wrappers can report it.
pub fn named<F>(name: impl Into<String>, func: F) -> Named<F> {
    Named {
        name: name.into(),
        func,
    }
}

impl<F> HasName for Named<F> {
    fn name(&self) -> &str {
        &self.name
    }
}

impl<S, A, T, E, F> Operation<S, A> for Named<F>
where
    S: ?Sized,
    A: ?Sized,
    F: Fn(&S, &A) -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn invoke(&self, instance: &S, args: &A) -> Result<T, E> {
        (self.func)(instance, args)
    }
}

/// An operation bound to one calling instance.
pub struct Bound<'a, O, S: ?Sized> {
    operation: &'a O,
    instance: &'a S,
}

impl<'a, O, S: ?Sized> Bound<'a, O, S> {
    pub fn call<A: ?Sized>(&self, args: &A) -> Result<O::Output, O::Error>
    where
        O: Operation<S, A>,
    {
        self.operation.invoke(self.instance, args)
    }
}

impl<'a, O: HasName, S: ?Sized> HasName for Bound<'a, O, S> {
    fn name(&self) -> &str {
        self.operation.name()
    }
}
