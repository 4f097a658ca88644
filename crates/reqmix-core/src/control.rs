//! Interrupt tokens for cancelling a retry or throttle wait.
//!
//! A token is shared between whoever wants to stop work (a signal handler, a
//! supervisor thread) and the clock that performs the waits. Once tripped,
//! every interruptible sleep returns [`Interrupted`](crate::error::Interrupted)
//! and the attempt loops unwind without making further calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptToken {
    flag: Arc<AtomicBool>,
}

impl InterruptToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that all waits observing this token stop.
    pub fn trip(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Clear the flag so new work may proceed.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    pub fn is_tripped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
