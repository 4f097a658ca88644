//! Settings that are either fixed or looked up on the calling instance.
//!
//! A wrapper is built once but may be invoked on behalf of many instances, so
//! attempt counts, delays and intervals can be sourced per call: the wrapper
//! asks the instance for a named attribute and falls back to a default when
//! the instance has no value for it.

use std::time::Duration;

/// Named attribute lookup on a calling instance.
///
/// Implement once per value type the instance exposes. Returning `None` means
/// "no such attribute", and the setting's fallback is used.
pub trait Attribute<T> {
    fn attribute(&self, name: &str) -> Option<T>;
}

/// Free functions have no instance; every lookup falls back.
impl<T> Attribute<T> for () {
    fn attribute(&self, _name: &str) -> Option<T> {
        None
    }
}

impl<T, S: Attribute<T> + ?Sized> Attribute<T> for &S {
    fn attribute(&self, name: &str) -> Option<T> {
        (**self).attribute(name)
    }
}

/// A value resolved at each invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting<T> {
    /// Always this value.
    Fixed(T),
    /// `instance.attribute(name)`, or `fallback` when absent.
    Attribute { name: &'static str, fallback: T },
}

impl<T: Clone> Setting<T> {
    pub fn attribute(name: &'static str, fallback: T) -> Self {
        Setting::Attribute { name, fallback }
    }

    pub fn resolve<S: Attribute<T> + ?Sized>(&self, instance: &S) -> T {
        match self {
            Setting::Fixed(value) => value.clone(),
            Setting::Attribute { name, fallback } => instance
                .attribute(name)
                .unwrap_or_else(|| fallback.clone()),
        }
    }

    /// The value used when the instance supplies nothing.
    pub fn default_value(&self) -> &T {
        match self {
            Setting::Fixed(value) => value,
            Setting::Attribute { fallback, .. } => fallback,
        }
    }
}

impl<T> From<T> for Setting<T> {
    fn from(value: T) -> Self {
        Setting::Fixed(value)
    }
}

impl Default for Setting<Duration> {
    fn default() -> Self {
        Setting::Fixed(Duration::ZERO)
    }
}
