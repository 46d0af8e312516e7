//! Incremental request parser.
//!
//! [`RequestParser`] is fed whatever the transport hands back, one read at a
//! time, and produces the same [`Request`] no matter how the bytes were split.
//!
//! ```text
//! Initialized ──request line──▶ ParsingHeaders ──blank line──┬─▶ Done
//!                                                            │
//!                                  Content-Length > 0        ▼
//!                                                       ParsingBody ──▶ Done
//!
//! any state ──malformed input──▶ Error
//! ```

use std::fmt;
use std::io;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::headers::{self, HeaderError, Headers, ParsedLine};
use crate::http::request::{parse_content_length, Request, RequestLine};

const READ_CHUNK_SIZE: usize = 1024;
const SUPPORTED_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The request line did not split into exactly three fields.
    MalformedRequestLine(String),
    InvalidMethod(String),
    EmptyTarget,
    UnsupportedVersion(String),
    InvalidHeader(HeaderError),
    InvalidContentLength(String),
    /// The stream ended inside the body.
    IncompleteBody { expected: usize, received: usize },
    /// The stream ended before the header section was complete.
    ConnectionClosed,
    /// Reading from the transport failed.
    Io { kind: io::ErrorKind, message: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedRequestLine(line) => write!(f, "malformed request line: {:?}", line),
            ParseError::InvalidMethod(method) => write!(f, "invalid method: {:?}", method),
            ParseError::EmptyTarget => write!(f, "empty request target"),
            ParseError::UnsupportedVersion(version) => {
                write!(f, "unsupported HTTP version: {:?}", version)
            }
            ParseError::InvalidHeader(e) => write!(f, "{}", e),
            ParseError::InvalidContentLength(value) => {
                write!(f, "invalid Content-Length: {:?}", value)
            }
            ParseError::IncompleteBody { expected, received } => write!(
                f,
                "body shorter than reported Content-Length ({} of {} bytes)",
                received, expected
            ),
            ParseError::ConnectionClosed => write!(f, "connection closed before request completed"),
            ParseError::Io { message, .. } => write!(f, "read error: {}", message),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::InvalidHeader(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HeaderError> for ParseError {
    fn from(e: HeaderError) -> Self {
        ParseError::InvalidHeader(e)
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Initialized,
    ParsingHeaders,
    ParsingBody,
    Done,
    Error,
}

/// Result of feeding bytes to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The buffered bytes are exhausted; read more and feed again.
    NeedMore,
    /// The request is complete; call [`RequestParser::finish`].
    Complete,
}

/// Outcome of one transition attempt.
enum Step {
    Advanced,
    Incomplete,
}

pub struct RequestParser {
    state: ParserState,
    buffer: BytesMut,
    request_line: Option<RequestLine>,
    headers: Headers,
    body: Vec<u8>,
    content_length: usize,
    error: Option<ParseError>,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Initialized,
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            request_line: None,
            headers: Headers::new(),
            body: Vec::new(),
            content_length: 0,
            error: None,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Appends one read's worth of bytes and advances as far as possible.
    ///
    /// Bytes fed after the request is complete are ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Progress, ParseError> {
        match self.state {
            ParserState::Done => return Ok(Progress::Complete),
            ParserState::Error => return Err(self.stored_error()),
            _ => {}
        }

        self.buffer.extend_from_slice(chunk);

        loop {
            let step = match self.state {
                ParserState::Initialized => self.parse_request_line(),
                ParserState::ParsingHeaders => self.parse_header_line(),
                ParserState::ParsingBody => Ok(self.parse_body()),
                ParserState::Done => return Ok(Progress::Complete),
                ParserState::Error => return Err(self.stored_error()),
            };

            match step {
                Ok(Step::Advanced) => continue,
                Ok(Step::Incomplete) => return Ok(Progress::NeedMore),
                Err(e) => {
                    self.state = ParserState::Error;
                    self.error = Some(e.clone());
                    return Err(e);
                }
            }
        }
    }

    /// Ends parsing, treating the call as end of stream.
    pub fn finish(self) -> Result<Request, ParseError> {
        match self.state {
            ParserState::Done => Ok(Request {
                request_line: self.request_line.ok_or(ParseError::ConnectionClosed)?,
                headers: self.headers,
                body: self.body,
            }),
            ParserState::Initialized | ParserState::ParsingHeaders => Err(ParseError::ConnectionClosed),
            ParserState::ParsingBody => Err(ParseError::IncompleteBody {
                expected: self.content_length,
                received: self.body.len(),
            }),
            ParserState::Error => Err(self.error.unwrap_or(ParseError::ConnectionClosed)),
        }
    }

    fn stored_error(&self) -> ParseError {
        self.error.clone().unwrap_or(ParseError::ConnectionClosed)
    }

    fn parse_request_line(&mut self) -> Result<Step, ParseError> {
        let idx = match headers::find_crlf(&self.buffer) {
            Some(idx) => idx,
            None => return Ok(Step::Incomplete),
        };

        let line = std::str::from_utf8(&self.buffer[..idx])
            .map_err(|_| ParseError::MalformedRequestLine(String::from_utf8_lossy(&self.buffer[..idx]).into_owned()))?;

        let parts: Vec<&str> = line.split(' ').collect();
        let &[method, target, version] = parts.as_slice() else {
            return Err(ParseError::MalformedRequestLine(line.to_string()));
        };

        if !headers::is_token(method) {
            return Err(ParseError::InvalidMethod(method.to_string()));
        }
        if target.is_empty() {
            return Err(ParseError::EmptyTarget);
        }
        if version != SUPPORTED_VERSION {
            return Err(ParseError::UnsupportedVersion(version.to_string()));
        }

        self.request_line = Some(RequestLine {
            method: method.to_string(),
            target: target.to_string(),
            version: version["HTTP/".len()..].to_string(),
        });

        self.buffer.advance(idx + 2);
        self.state = ParserState::ParsingHeaders;
        Ok(Step::Advanced)
    }

    fn parse_header_line(&mut self) -> Result<Step, ParseError> {
        match self.headers.parse_line(&self.buffer)? {
            ParsedLine::Incomplete => Ok(Step::Incomplete),
            ParsedLine::Field { consumed } => {
                self.buffer.advance(consumed);
                Ok(Step::Advanced)
            }
            ParsedLine::End { consumed } => {
                self.buffer.advance(consumed);
                self.content_length = self.declared_length()?;
                self.state = if self.content_length > 0 {
                    ParserState::ParsingBody
                } else {
                    ParserState::Done
                };
                Ok(Step::Advanced)
            }
        }
    }

    fn parse_body(&mut self) -> Step {
        let remaining = self.content_length - self.body.len();
        let take = remaining.min(self.buffer.len());
        let bytes = self.buffer.split_to(take);
        self.body.extend_from_slice(&bytes);

        if self.body.len() == self.content_length {
            self.state = ParserState::Done;
            Step::Advanced
        } else {
            Step::Incomplete
        }
    }

    fn declared_length(&self) -> Result<usize, ParseError> {
        match self.headers.get_bytes("content-length") {
            None => Ok(0),
            Some(value) => parse_content_length(value).ok_or_else(|| {
                ParseError::InvalidContentLength(String::from_utf8_lossy(value).into_owned())
            }),
        }
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads from `reader` until a complete request has been parsed.
///
/// Stops reading as soon as the request is complete; any bytes the peer sends
/// after that are left unread.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut parser = RequestParser::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut chunk).await?;

        if n == 0 {
            // End of stream
            return parser.finish();
        }

        if parser.feed(&chunk[..n])? == Progress::Complete {
            return parser.finish();
        }
    }
}
