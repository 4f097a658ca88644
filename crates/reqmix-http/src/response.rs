//! HTTP responses and header parsing.

use serde::de::DeserializeOwned;

use crate::error::RequestError;

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code of the final response (after redirects).
    pub status: u32,
    /// Effective URL after redirects.
    pub url: String,
    /// Header `(name, value)` pairs of the final response, in received order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text; invalid UTF-8 is replaced rather than rejected.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// `Err(RequestError::Status)` unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self, RequestError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RequestError::Status {
                status: self.status,
                url: self.url,
            })
        }
    }
}

/// Parse collected header lines into `(name, value)` pairs.
///
/// With redirects curl reports one header block per hop; a status line starts
/// a new block, so only the final response's headers are kept.
pub(crate) fn parse_headers(lines: &[String]) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}
