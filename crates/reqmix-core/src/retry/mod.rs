//! Bounded retry.
//!
//! A [`RetryPolicy`] runs a callable until it succeeds, raises an error whose
//! kind is outside the retryable set, or runs out of attempts. Collected
//! errors live only for one call, so a policy can be shared freely.

mod error;
mod policy;
mod run;
mod wrap;

pub use error::{AggregateFailure, RetryError};
pub use policy::RetryPolicy;
pub use policy::secs_to_duration;
pub use wrap::{wrap_with_retry, Retry};
