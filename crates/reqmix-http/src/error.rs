//! Request errors and their classification for retry decisions.

use reqmix_core::{Failure, Interrupted};

/// High-level classification of a request error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// Other 5xx status.
    Http5xx,
    /// Any other non-2xx status (only raised when status codes are checked).
    HttpStatus,
    /// Transfer ended early or the body could not be received.
    Transfer,
    /// Any other curl failure.
    Other,
    /// The URL could not be parsed; never reaches the network.
    InvalidUrl,
    /// The response body was not what the caller asked for.
    Decode,
    /// The request was aborted through the interrupt token.
    Interrupted,
}

impl ErrorKind {
    /// Kinds the request mixin retries by default: every failure that came
    /// from talking to the server. Local mistakes (bad URL, bad body) are not
    /// worth repeating.
    pub const REQUEST_KINDS: [ErrorKind; 7] = [
        ErrorKind::Timeout,
        ErrorKind::Throttled,
        ErrorKind::Connection,
        ErrorKind::Http5xx,
        ErrorKind::HttpStatus,
        ErrorKind::Transfer,
        ErrorKind::Other,
    ];
}

/// Error returned by a single request attempt.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// Curl reported an error (timeout, connection, etc.).
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status and status checking was on.
    #[error("HTTP {status} from {url}")]
    Status { status: u32, url: String },
    #[error("decoding response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request aborted")]
    Aborted,
}

impl From<Interrupted> for RequestError {
    fn from(_: Interrupted) -> Self {
        RequestError::Aborted
    }
}

/// The requested method name is not an HTTP method we know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown request method {0}")]
pub struct UnknownMethod(pub String);

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx,
        _ => ErrorKind::HttpStatus,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_aborted_by_callback() {
        return ErrorKind::Interrupted;
    }
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    if e.is_partial_file() || e.is_recv_error() || e.is_read_error() {
        return ErrorKind::Transfer;
    }
    ErrorKind::Other
}

/// Classify a request error into an ErrorKind.
pub fn classify(e: &RequestError) -> ErrorKind {
    match e {
        RequestError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
        RequestError::Curl(ce) => classify_curl_error(ce),
        RequestError::Status { status, .. } => classify_http_status(*status),
        RequestError::Decode(_) => ErrorKind::Decode,
        RequestError::Aborted => ErrorKind::Interrupted,
    }
}

impl Failure for RequestError {
    type Kind = ErrorKind;

    fn kind(&self) -> ErrorKind {
        classify(self)
    }

    fn is_interrupt(&self) -> bool {
        classify(self) == ErrorKind::Interrupted
    }
}
