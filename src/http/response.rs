use std::fmt;

use crate::http::headers::Headers;

/// Status codes the writer knows a reason phrase for.
///
/// Add a variant here to make a new code writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    BadRequest,
    /// Used by the demo app when a served file is missing
    NotFound,
    InternalServerError,
}

impl StatusCode {
    /// # Example
    ///
    /// ```
    /// # use httpfromtcp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Formats as it appears on the status line, e.g. `400 Bad Request`.
impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Baseline headers for a response whose body is `content_len` bytes.
///
/// Handlers adjust the result with [`Headers::replace`] and
/// [`Headers::remove`], e.g. swapping `Content-Length` for
/// `Transfer-Encoding: chunked` when streaming.
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.put("content-length".to_string(), content_len.to_string().into_bytes());
    headers.put("connection".to_string(), b"close".to_vec());
    headers.put("content-type".to_string(), b"text/plain".to_vec());
    headers
}
