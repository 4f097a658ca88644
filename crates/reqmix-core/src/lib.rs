//! Retry and throttle wrappers for request-style callables.
//!
//! - [`retry`]: bounded retry filtered by error kind, with a delay between attempts.
//! - [`throttle`]: lazy minimum interval between the end of one call and the start of the next.
//! - [`resolve`]: settings read from the calling instance with a fallback.
//!
//! Wrappers compose as [`Operation`]s. The usual stacking is throttle outside
//! retry, so the interval is paid once per call rather than once per attempt.

pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod logging;
pub mod operation;
pub mod resolve;
pub mod retry;
pub mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use control::InterruptToken;
pub use error::{ConfigurationError, Failure, Interrupted};
pub use operation::{bind, named, Bound, HasName, Named, Operation};
pub use resolve::{Attribute, Setting};
pub use retry::{wrap_with_retry, AggregateFailure, Retry, RetryError, RetryPolicy};
pub use throttle::{wrap_with_throttle, ThrottleGate, Throttled};
