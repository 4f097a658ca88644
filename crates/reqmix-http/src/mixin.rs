//! The request mixin: throttled, retried requests over a (usually shared) session.
//!
//! A [`RequestMixin`] plays the role of the class: it owns the decorated
//! `make_request` operation (and therefore the throttle's last-completion
//! stamp) and, when sessions persist, the one session every requester uses.
//! Each [`Requester`] is an implementing instance and may override the
//! attempt count and delays for its own calls.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqmix_core::config::ReqmixConfig;
use reqmix_core::retry::secs_to_duration;
use reqmix_core::{
    named, wrap_with_retry, wrap_with_throttle, Attribute, Clock, ConfigurationError,
    InterruptToken, Named, Operation, Retry, RetryError, RetryPolicy, Setting, SystemClock,
    ThrottleGate, Throttled,
};
use serde::de::DeserializeOwned;

use crate::error::{ErrorKind, RequestError};
use crate::method::Method;
use crate::response::Response;
use crate::session::{Outgoing, Session, SessionHandle};

/// Attribute name for a requester's attempt-count override.
pub const ATTEMPT_COUNT_ATTR: &str = "attempt_count";
/// Attribute name for a requester's throttle-interval override.
pub const REQUEST_DELAY_ATTR: &str = "request_delay";
/// Attribute name for a requester's delay-between-attempts override.
pub const RETRY_DELAY_ATTR: &str = "retry_delay";

/// Error from `make_request` and friends.
pub type RequestFailure = RetryError<RequestError>;

/// Defaults applied to every requester built from a mixin.
#[derive(Debug, Clone)]
pub struct MixinOptions {
    pub check_status_code: bool,
    pub update_referer: Option<String>,
    pub request_method: Method,
    /// Minimum gap between one request returning and the next starting.
    pub request_delay: Duration,
    /// Wait between a failed attempt and the next.
    pub retry_delay: Duration,
    pub max_attempt_count: u32,
    /// One session for all requesters (true) or one per requester (false).
    pub persist_session: bool,
    /// Error kinds worth another attempt. Empty retries every kind.
    pub retry_on: Vec<ErrorKind>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for MixinOptions {
    fn default() -> Self {
        Self {
            check_status_code: false,
            update_referer: None,
            request_method: Method::Get,
            request_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
            max_attempt_count: 5,
            persist_session: true,
            retry_on: ErrorKind::REQUEST_KINDS.to_vec(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }
}

impl MixinOptions {
    /// Build from a loaded config file.
    pub fn from_config(cfg: &ReqmixConfig) -> anyhow::Result<Self> {
        let max_attempt_count = u32::try_from(cfg.retry.max_attempts)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigurationError::InvalidAttemptCount(cfg.retry.max_attempts))?;
        let retry_delay = secs_to_duration("retry.delay_secs", cfg.retry.delay_secs)?;
        let request_delay = secs_to_duration("throttle.interval_secs", cfg.throttle.interval_secs)?;
        let request_method = cfg
            .request
            .request_method
            .parse::<Method>()
            .context("request.request_method")?;

        Ok(Self {
            check_status_code: cfg.request.check_status_code,
            update_referer: cfg.request.update_referer.clone(),
            request_method,
            request_delay,
            retry_delay,
            max_attempt_count,
            persist_session: cfg.request.persist_session,
            retry_on: ErrorKind::REQUEST_KINDS.to_vec(),
            connect_timeout: Duration::from_secs(cfg.request.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.request.timeout_secs),
        })
    }
}

/// Per-call adjustments to a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Overrides the mixin's default method.
    pub method: Option<Method>,
    /// Overrides the mixin's `check_status_code`.
    pub check_status_code: Option<bool>,
    /// Referer for this call; the session's previous referer is restored afterwards.
    pub update_referer: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn check_status_code(mut self, check: bool) -> Self {
        self.check_status_code = Some(check);
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.update_referer = Some(referer.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Arguments of one `make_request` call, as seen by the wrapped operation.
#[derive(Debug, Clone)]
pub struct RequestArgs {
    pub url: String,
    pub options: RequestOptions,
}

type SendFn = fn(&Requester, &RequestArgs) -> Result<Response, RequestError>;
type MakeRequest = Throttled<Retry<Named<SendFn>, ErrorKind>>;

/// Factory for requesters sharing defaults, a throttle, and (optionally) a session.
#[derive(Debug, Clone)]
pub struct RequestMixin {
    options: Arc<MixinOptions>,
    shared_session: Option<Arc<Session>>,
    make_request: Arc<MakeRequest>,
    interrupt: InterruptToken,
}

impl RequestMixin {
    pub fn new(options: MixinOptions) -> Result<Self, ConfigurationError> {
        let interrupt = InterruptToken::new();
        let clock = Arc::new(SystemClock::with_interrupt(interrupt.clone()));
        Self::build(options, clock, interrupt)
    }

    /// Like [`RequestMixin::new`] with a caller-supplied time source.
    pub fn with_clock(
        options: MixinOptions,
        clock: Arc<dyn Clock>,
        interrupt: InterruptToken,
    ) -> Result<Self, ConfigurationError> {
        Self::build(options, clock, interrupt)
    }

    pub fn from_config(cfg: &ReqmixConfig) -> anyhow::Result<Self> {
        Ok(Self::new(MixinOptions::from_config(cfg)?)?)
    }

    fn build(
        options: MixinOptions,
        clock: Arc<dyn Clock>,
        interrupt: InterruptToken,
    ) -> Result<Self, ConfigurationError> {
        let policy = RetryPolicy::with_attempts(Setting::attribute(
            ATTEMPT_COUNT_ATTR,
            options.max_attempt_count,
        ))?
        .retry_on(options.retry_on.iter().copied())
        .with_delay(Setting::attribute(RETRY_DELAY_ATTR, options.retry_delay))
        .with_shared_clock(Arc::clone(&clock));
        let gate = ThrottleGate::new(Setting::attribute(REQUEST_DELAY_ATTR, options.request_delay))
            .with_shared_clock(clock);

        let send: SendFn = send_once;
        let make_request = wrap_with_throttle(wrap_with_retry(named("make_request", send), policy), gate);

        let shared_session = options
            .persist_session
            .then(|| Arc::new(new_session(&options, &interrupt)));

        Ok(Self {
            options: Arc::new(options),
            shared_session,
            make_request: Arc::new(make_request),
            interrupt,
        })
    }

    pub fn options(&self) -> &MixinOptions {
        &self.options
    }

    /// The session every requester uses, when sessions persist.
    pub fn shared_session(&self) -> Option<&Arc<Session>> {
        self.shared_session.as_ref()
    }

    /// Trip to abort in-flight requests and pending waits of every requester.
    pub fn interrupt_token(&self) -> &InterruptToken {
        &self.interrupt
    }

    /// The throttle guarding `make_request` for all requesters of this mixin.
    pub fn gate(&self) -> &ThrottleGate {
        self.make_request.gate()
    }

    /// A new implementing instance.
    pub fn requester(&self) -> Requester {
        let session = match &self.shared_session {
            Some(shared) => SessionHandle::Shared(Arc::clone(shared)),
            None => SessionHandle::Owned(Arc::new(new_session(&self.options, &self.interrupt))),
        };
        Requester {
            session,
            options: Arc::clone(&self.options),
            make_request: Arc::clone(&self.make_request),
            attempt_count: None,
            request_delay: None,
            retry_delay: None,
        }
    }
}

fn new_session(options: &MixinOptions, interrupt: &InterruptToken) -> Session {
    Session::new(options.connect_timeout, options.timeout, interrupt.clone())
}

/// An implementing instance of the mixin.
pub struct Requester {
    session: SessionHandle,
    options: Arc<MixinOptions>,
    make_request: Arc<MakeRequest>,
    /// Overrides the mixin's attempt count for this requester.
    pub attempt_count: Option<u32>,
    /// Overrides the mixin's throttle interval for this requester.
    pub request_delay: Option<Duration>,
    /// Overrides the mixin's delay between attempts for this requester.
    pub retry_delay: Option<Duration>,
}

impl fmt::Debug for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requester")
            .field("shared_session", &self.session.is_shared())
            .field("attempt_count", &self.attempt_count)
            .field("request_delay", &self.request_delay)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl Attribute<u32> for Requester {
    fn attribute(&self, name: &str) -> Option<u32> {
        match name {
            ATTEMPT_COUNT_ATTR => self.attempt_count,
            _ => None,
        }
    }
}

impl Attribute<Duration> for Requester {
    fn attribute(&self, name: &str) -> Option<Duration> {
        match name {
            REQUEST_DELAY_ATTR => self.request_delay,
            RETRY_DELAY_ATTR => self.retry_delay,
            _ => None,
        }
    }
}

impl Requester {
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn options(&self) -> &MixinOptions {
        &self.options
    }

    /// Request `url`, throttled against the previous request through this
    /// mixin and retried on request failures.
    pub fn make_request(&self, url: &str, options: RequestOptions) -> Result<Response, RequestFailure> {
        let args = RequestArgs {
            url: url.to_string(),
            options,
        };
        self.make_request.invoke(self, &args)
    }

    pub fn make_text_request(&self, url: &str, options: RequestOptions) -> Result<String, RequestFailure> {
        Ok(self.make_request(url, options)?.text())
    }

    /// Request `url` and decode the body as JSON. A body that does not decode
    /// is reported as [`RetryError::Unretryable`] with [`RequestError::Decode`].
    pub fn make_json_request<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<T, RequestFailure> {
        self.make_request(url, options)?
            .json()
            .map_err(RetryError::Unretryable)
    }
}

/// One attempt: validate, swap in the referer, send, restore, check status.
fn send_once(requester: &Requester, args: &RequestArgs) -> Result<Response, RequestError> {
    let defaults = requester.options();
    let opts = &args.options;
    let method = opts.method.unwrap_or(defaults.request_method);

    url::Url::parse(&args.url).map_err(|source| RequestError::InvalidUrl {
        url: args.url.clone(),
        source,
    })?;

    let session = requester.session();
    let wanted_referer = opts
        .update_referer
        .as_deref()
        .or(defaults.update_referer.as_deref());
    let current_referer = session.header("referer");
    let change_referer = wanted_referer.is_some_and(|r| current_referer.as_deref() != Some(r));
    if let (true, Some(referer)) = (change_referer, wanted_referer) {
        session.set_header("referer", referer);
    }

    tracing::debug!(url = %args.url, %method, "making request");
    let sent = session.send(&Outgoing {
        method,
        url: &args.url,
        headers: &opts.headers,
        body: opts.body.as_deref(),
    });

    if change_referer {
        match &current_referer {
            Some(previous) => session.set_header("referer", previous),
            None => session.remove_header("referer"),
        };
    }

    let response = sent?;
    tracing::debug!(status = response.status, url = %response.url, "response received");

    if opts.check_status_code.unwrap_or(defaults.check_status_code) {
        return response.error_for_status();
    }
    Ok(response)
}
