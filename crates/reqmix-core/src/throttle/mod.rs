//! Minimum-interval throttling between consecutive calls.

mod gate;
mod wrap;

pub use gate::ThrottleGate;
pub use wrap::{wrap_with_throttle, Throttled};
