use std::fmt;

use crate::http::headers::{HeaderError, Headers};

/// The first line of a request: method, target, and version.
///
/// The version is stored without its `HTTP/` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Request method token (e.g. `GET`)
    pub method: String,
    /// Request target as sent (e.g. `/search?q=rust`)
    pub target: String,
    /// HTTP version without the prefix, always `1.1` once parsed
    pub version: String,
}

/// A fully parsed HTTP request.
///
/// Produced by [`RequestParser`](crate::http::parser::RequestParser) once it
/// reaches its `Done` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: Headers,
    /// Exactly `Content-Length` bytes, or empty when no length was declared
    pub body: Vec<u8>,
}

/// Builder for constructing Request objects outside the parser.
pub struct RequestBuilder {
    method: Option<String>,
    target: Option<String>,
    headers: Headers,
    body: Vec<u8>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            target: None,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self, HeaderError> {
        self.headers.set(name, value)?;
        Ok(self)
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            request_line: RequestLine {
                method: self.method.ok_or("method missing")?,
                target: self.target.ok_or("target missing")?,
                version: "1.1".to_string(),
            },
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Returns the declared Content-Length.
    ///
    /// `None` when the header is absent or is not a single decimal number
    /// (e.g. `2, 2` after merging). The parser rejects the latter with
    /// `ParseError::InvalidContentLength`, so only requests assembled with
    /// [`RequestBuilder`] can reach that case.
    pub fn content_length(&self) -> Option<usize> {
        self.headers.get_bytes("content-length").and_then(parse_content_length)
    }
}

/// Human-readable dump used by the `tcplistener` binary.
///
/// Header values and the body are shown lossily when they are not UTF-8.
impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Request line:")?;
        writeln!(f, "- Method: {}", self.request_line.method)?;
        writeln!(f, "- Target: {}", self.request_line.target)?;
        writeln!(f, "- Version: {}", self.request_line.version)?;
        writeln!(f, "Headers:")?;
        for (name, value) in self.headers.iter() {
            writeln!(f, "- {}: {}", name, String::from_utf8_lossy(value))?;
        }
        writeln!(f, "Body:")?;
        write!(f, "{}", String::from_utf8_lossy(&self.body))
    }
}

/// Parses a Content-Length value: ASCII digits only.
pub(crate) fn parse_content_length(value: &[u8]) -> Option<usize> {
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(value).ok()?.parse().ok()
}
