//! Time source used by the retry and throttle wrappers.
//!
//! Both wrappers only ever need "what time is it" and "block for this long".
//! [`SystemClock`] does that with the standard library; [`ManualClock`] keeps
//! virtual time so timing behaviour can be asserted without real sleeps.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::control::InterruptToken;
use crate::error::Interrupted;

/// Longest single `thread::sleep` before the interrupt token is re-checked.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`. Returns `Err(Interrupted)` if
    /// the wait was cut short by an interrupt.
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted>;

    /// True once an interrupt has been requested. Checked before each attempt.
    fn interrupted(&self) -> bool {
        false
    }
}

/// Wall clock with blocking sleeps, optionally watching an interrupt token.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    token: Option<InterruptToken>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps become interruptible: tripping `token` wakes them within one slice.
    pub fn with_interrupt(token: InterruptToken) -> Self {
        Self { token: Some(token) }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let Some(token) = &self.token else {
            std::thread::sleep(duration);
            return Ok(());
        };
        // A duration past the end of `Instant`'s range only ends on interrupt.
        let deadline = Instant::now().checked_add(duration);
        loop {
            if token.is_tripped() {
                return Err(Interrupted);
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    (deadline - now).min(SLEEP_SLICE)
                }
                None => SLEEP_SLICE,
            };
            std::thread::sleep(slice);
        }
    }

    fn interrupted(&self) -> bool {
        self.token.as_ref().is_some_and(InterruptToken::is_tripped)
    }
}

#[derive(Debug)]
struct ManualState {
    now: Instant,
    sleeps: Vec<Duration>,
}

/// Deterministic clock: `sleep` advances virtual time instead of blocking.
///
/// Clones share the same timeline, so a test can keep one handle while the
/// wrapper under test owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
    token: Option<InterruptToken>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: Instant::now(),
                sleeps: Vec::new(),
            })),
            token: None,
        }
    }

    pub fn with_interrupt(mut self, token: InterruptToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Move virtual time forward without recording a sleep (time spent "working").
    pub fn advance(&self, by: Duration) {
        self.lock().now += by;
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.lock().sleeps.iter().sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        if self.interrupted() {
            return Err(Interrupted);
        }
        let mut state = self.lock();
        state.sleeps.push(duration);
        if let Some(now) = state.now.checked_add(duration) {
            state.now = now;
        }
        Ok(())
    }

    fn interrupted(&self) -> bool {
        self.token.as_ref().is_some_and(InterruptToken::is_tripped)
    }
}
