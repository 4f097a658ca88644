use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::RetryConfig;
use crate::error::ConfigurationError;
use crate::resolve::{Attribute, Setting};

/// Bounded retry with an allow-list of error kinds and a fixed delay between
/// failed attempts.
///
/// `K` is the error-kind identifier reported by [`Failure::kind`](crate::error::Failure::kind).
/// An empty retryable set means every kind is retried (interrupts never are).
#[derive(Clone)]
pub struct RetryPolicy<K> {
    /// Maximum number of attempts (including the first).
    max_attempts: Setting<u32>,
    retryable: HashSet<K>,
    /// Wait between a failed attempt and the next one.
    delay: Setting<Duration>,
    pub(super) clock: Arc<dyn Clock>,
}

impl<K: fmt::Debug> fmt::Debug for RetryPolicy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("retryable", &self.retryable)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl<K: Eq + Hash> RetryPolicy<K> {
    /// Policy with a fixed attempt count, retrying every kind, no delay.
    pub fn new(max_attempts: u32) -> Result<Self, ConfigurationError> {
        Self::with_attempts(Setting::Fixed(max_attempts))
    }

    /// Policy whose attempt count may be looked up on the calling instance.
    ///
    /// The fixed value (or the fallback, for attribute settings) must be at
    /// least 1. Values read from an instance are clamped to 1 at call time.
    pub fn with_attempts(max_attempts: Setting<u32>) -> Result<Self, ConfigurationError> {
        let n = *max_attempts.default_value();
        if n == 0 {
            return Err(ConfigurationError::InvalidAttemptCount(0));
        }
        Ok(Self {
            max_attempts,
            retryable: HashSet::new(),
            delay: Setting::default(),
            clock: Arc::new(SystemClock::new()),
        })
    }

    /// Build from the `[retry]` config section.
    pub fn from_config(cfg: &RetryConfig) -> Result<Self, ConfigurationError> {
        let n = u32::try_from(cfg.max_attempts)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigurationError::InvalidAttemptCount(cfg.max_attempts))?;
        let delay = secs_to_duration("delay_secs", cfg.delay_secs)?;
        Ok(Self::new(n)?.with_delay(delay))
    }

    /// Restrict retries to these kinds. An empty collection keeps "retry all".
    pub fn retry_on<I: IntoIterator<Item = K>>(mut self, kinds: I) -> Self {
        self.retryable = kinds.into_iter().collect();
        self
    }

    pub fn with_delay(mut self, delay: impl Into<Setting<Duration>>) -> Self {
        self.delay = delay.into();
        self
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether an error of this kind may be retried.
    pub fn should_retry(&self, kind: &K) -> bool {
        self.retryable.is_empty() || self.retryable.contains(kind)
    }

    pub fn retryable_kinds(&self) -> &HashSet<K> {
        &self.retryable
    }

    /// Attempt count for a call made on behalf of `instance`.
    pub fn attempts_for<S: Attribute<u32> + ?Sized>(&self, instance: &S) -> u32 {
        self.max_attempts.resolve(instance).max(1)
    }

    pub fn delay_for<S: Attribute<Duration> + ?Sized>(&self, instance: &S) -> Duration {
        self.delay.resolve(instance)
    }
}

/// Convert seconds from config into a `Duration`, rejecting negatives and NaN.
pub fn secs_to_duration(name: &'static str, secs: f64) -> Result<Duration, ConfigurationError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| ConfigurationError::InvalidDuration { name, value: secs })
}
