//! Throttled, retried HTTP requests over a shared curl session.
//!
//! ```no_run
//! use reqmix_http::{MixinOptions, RequestMixin, RequestOptions};
//!
//! reqmix_core::logging::init_logging_or_stderr();
//! let mixin = RequestMixin::new(MixinOptions::default())?;
//! let requester = mixin.requester();
//! let page = requester.make_text_request("https://example.com/", RequestOptions::new())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod method;
pub mod mixin;
pub mod response;
pub mod session;

pub use error::{classify, ErrorKind, RequestError, UnknownMethod};
pub use method::Method;
pub use mixin::{
    MixinOptions, RequestArgs, RequestFailure, RequestMixin, RequestOptions, Requester,
    ATTEMPT_COUNT_ATTR, REQUEST_DELAY_ATTR, RETRY_DELAY_ATTR,
};
pub use response::Response;
pub use session::{Outgoing, Session, SessionHandle};
