use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::config::ThrottleConfig;
use crate::error::{ConfigurationError, Interrupted};
use crate::resolve::{Attribute, Setting};
use crate::retry::secs_to_duration;

/// Minimum-interval gate between the end of one call and the start of the next.
///
/// The wait is computed lazily at call time against the moment the previous
/// call returned, so time spent inside a slow call counts toward the gap.
/// The first call never waits.
///
/// The timestamp sits behind a mutex for memory safety only. Two threads
/// entering the same gate at once can both proceed without waiting for each
/// other; callers that need strict spacing across threads must serialise.
pub struct ThrottleGate {
    interval: Setting<Duration>,
    last_completion: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ThrottleGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottleGate")
            .field("interval", &self.interval)
            .field("last_completion", &self.last_completion())
            .finish_non_exhaustive()
    }
}

impl ThrottleGate {
    pub fn new(interval: impl Into<Setting<Duration>>) -> Self {
        Self {
            interval: interval.into(),
            last_completion: Mutex::new(None),
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Build from the `[throttle]` config section.
    pub fn from_config(cfg: &ThrottleConfig) -> Result<Self, ConfigurationError> {
        Ok(Self::new(secs_to_duration("interval_secs", cfg.interval_secs)?))
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn interval(&self) -> &Setting<Duration> {
        &self.interval
    }

    /// When the gated call last returned, if ever.
    pub fn last_completion(&self) -> Option<Instant> {
        *self.lock()
    }

    /// How long the next call on behalf of `instance` would wait.
    pub fn remaining<S: Attribute<Duration> + ?Sized>(&self, instance: &S) -> Duration {
        let interval = self.interval.resolve(instance);
        match self.last_completion() {
            None => Duration::ZERO,
            Some(last) => {
                let elapsed = self.clock.now().saturating_duration_since(last);
                interval.saturating_sub(elapsed)
            }
        }
    }

    pub fn is_ready<S: Attribute<Duration> + ?Sized>(&self, instance: &S) -> bool {
        self.remaining(instance).is_zero()
    }

    /// Wait out the remaining interval, run `f`, then stamp the completion
    /// time whether `f` succeeded or not. `f`'s result is returned unchanged.
    pub fn run<S, T, E, F>(&self, instance: &S, f: F) -> Result<T, E>
    where
        S: Attribute<Duration> + ?Sized,
        E: From<Interrupted>,
        F: FnOnce() -> Result<T, E>,
    {
        let wait = self.remaining(instance);
        if !wait.is_zero() {
            tracing::trace!(wait_ms = wait.as_millis() as u64, "throttling call");
            self.clock.sleep(wait)?;
        }

        let result = f();
        self.record_completion();
        result
    }

    fn record_completion(&self) {
        let now = self.clock.now();
        let mut last = self.lock();
        // Keep the stamp non-decreasing if calls overlap.
        *last = Some(last.map_or(now, |prev| prev.max(now)));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.last_completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
