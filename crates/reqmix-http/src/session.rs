//! HTTP session: persistent headers plus a reusable curl handle.
//!
//! A session is the shared resource behind every requester built from one
//! [`RequestMixin`](crate::RequestMixin). Keeping the curl handle around lets
//! libcurl reuse connections between requests.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqmix_core::InterruptToken;

use crate::error::RequestError;
use crate::method::Method;
use crate::response::{parse_headers, Response};

/// One outgoing request as handed to [`Session::send`].
#[derive(Debug, Clone, Copy)]
pub struct Outgoing<'a> {
    pub method: Method,
    pub url: &'a str,
    /// Extra headers for this request only; override session headers of the same name.
    pub headers: &'a [(String, String)],
    pub body: Option<&'a [u8]>,
}

pub struct Session {
    easy: Mutex<curl::easy::Easy>,
    /// Persistent headers, keyed by lower-cased name.
    headers: Mutex<BTreeMap<String, String>>,
    connect_timeout: Duration,
    timeout: Duration,
    interrupt: InterruptToken,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("headers", &*lock(&self.headers))
            .field("connect_timeout", &self.connect_timeout)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new(connect_timeout: Duration, timeout: Duration, interrupt: InterruptToken) -> Self {
        Self {
            easy: Mutex::new(curl::easy::Easy::new()),
            headers: Mutex::new(BTreeMap::new()),
            connect_timeout,
            timeout,
            interrupt,
        }
    }

    pub fn header(&self, name: &str) -> Option<String> {
        lock(&self.headers).get(&name.to_ascii_lowercase()).cloned()
    }

    /// Set a header sent with every request; returns the previous value.
    pub fn set_header(&self, name: &str, value: &str) -> Option<String> {
        lock(&self.headers).insert(name.to_ascii_lowercase(), value.to_string())
    }

    pub fn remove_header(&self, name: &str) -> Option<String> {
        lock(&self.headers).remove(&name.to_ascii_lowercase())
    }

    /// Perform one request. Runs in the current thread and blocks until done.
    pub fn send(&self, req: &Outgoing<'_>) -> Result<Response, RequestError> {
        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        let mut list = curl::easy::List::new();
        {
            let session_headers = lock(&self.headers);
            for (k, v) in session_headers.iter() {
                let overridden = req.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(k));
                if !overridden {
                    list.append(&format!("{}: {}", k, v))?;
                }
            }
        }
        for (k, v) in req.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }

        let mut easy = lock(&self.easy);
        // Clears options from the previous request; live connections are kept.
        easy.reset();
        easy.url(req.url)?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        easy.http_headers(list)?;
        easy.progress(true)?;

        match req.method {
            Method::Get => easy.get(true)?,
            Method::Head => easy.nobody(true)?,
            Method::Post => easy.post(true)?,
            other => easy.custom_request(other.as_str())?,
        }
        if let Some(payload) = req.body {
            easy.post_fields_copy(payload)?;
            // A body makes curl send POST; keep the requested verb on the wire.
            if req.method != Method::Post {
                easy.custom_request(req.method.as_str())?;
            }
        } else if req.method == Method::Post {
            easy.post_field_size(0)?;
        }

        {
            let interrupt = &self.interrupt;
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                header_lines.push(String::from_utf8_lossy(data).trim_end().to_string());
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            // Returning false aborts the transfer with CURLE_ABORTED_BY_CALLBACK.
            transfer.progress_function(|_, _, _, _| !interrupt.is_tripped())?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        let url = easy
            .effective_url()?
            .map(str::to_string)
            .unwrap_or_else(|| req.url.to_string());

        Ok(Response {
            status,
            url,
            headers: parse_headers(&header_lines),
            body,
        })
    }
}

/// The session a requester talks through: shared by every requester of a
/// mixin, or owned by one requester.
#[derive(Debug, Clone)]
pub enum SessionHandle {
    Shared(Arc<Session>),
    Owned(Arc<Session>),
}

impl SessionHandle {
    pub fn is_shared(&self) -> bool {
        matches!(self, SessionHandle::Shared(_))
    }

    pub fn as_arc(&self) -> &Arc<Session> {
        match self {
            SessionHandle::Shared(s) | SessionHandle::Owned(s) => s,
        }
    }
}

impl Deref for SessionHandle {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.as_arc()
    }
}
