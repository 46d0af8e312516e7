use std::fmt;
use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::Headers;
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Which write is legal next.
///
/// `AwaitingTrailers` is entered once the first chunk has been written: from
/// there only more chunks or a chunked terminator may follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    AwaitingStatusLine,
    AwaitingHeaders,
    AwaitingBody,
    AwaitingTrailers,
    Done,
}

#[derive(Debug)]
pub enum WriteError {
    /// A write was attempted from a state that does not allow it.
    OutOfOrder {
        operation: &'static str,
        state: WriterState,
    },
    Io(io::Error),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::OutOfOrder { operation, state } => {
                write!(f, "{} called out of order (writer is {:?})", operation, state)
            }
            WriteError::Io(e) => write!(f, "write error: {}", e),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::Io(e) => Some(e),
            WriteError::OutOfOrder { .. } => None,
        }
    }
}

impl From<io::Error> for WriteError {
    fn from(e: io::Error) -> Self {
        WriteError::Io(e)
    }
}

/// Writes one response onto `W`, enforcing the order
/// status line → headers → body → (chunk terminator / trailers).
///
/// Every call is flushed before it returns; nothing is buffered across calls.
pub struct ResponseWriter<W> {
    sink: W,
    state: WriterState,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: WriterState::AwaitingStatusLine,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        self.expect("write_status_line", &[WriterState::AwaitingStatusLine])?;

        let line = format!("{} {}\r\n", HTTP_VERSION, status);
        self.emit(line.as_bytes()).await?;

        self.state = WriterState::AwaitingHeaders;
        Ok(())
    }

    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), WriteError> {
        self.expect("write_headers", &[WriterState::AwaitingHeaders])?;

        let mut buf = Vec::new();
        headers.write_fields(&mut buf);
        buf.extend_from_slice(b"\r\n");
        self.emit(&buf).await?;

        self.state = WriterState::AwaitingBody;
        Ok(())
    }

    /// Writes a fixed-length body verbatim and completes the response.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, WriteError> {
        self.expect("write_body", &[WriterState::AwaitingBody])?;

        self.emit(body).await?;

        self.state = WriterState::Done;
        Ok(body.len())
    }

    /// Writes one chunk: `<hex len>\r\n<bytes>\r\n`.
    ///
    /// An empty slice writes nothing, since a zero-length chunk would end the body.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<usize, WriteError> {
        self.expect(
            "write_chunked_body",
            &[WriterState::AwaitingBody, WriterState::AwaitingTrailers],
        )?;

        if chunk.is_empty() {
            return Ok(0);
        }

        let mut buf = Vec::with_capacity(chunk.len() + 12);
        buf.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        buf.extend_from_slice(chunk);
        buf.extend_from_slice(b"\r\n");
        self.emit(&buf).await?;

        self.state = WriterState::AwaitingTrailers;
        Ok(buf.len())
    }

    /// Ends a chunked body with no trailer section.
    pub async fn write_chunked_body_done(&mut self) -> Result<usize, WriteError> {
        self.expect(
            "write_chunked_body_done",
            &[WriterState::AwaitingBody, WriterState::AwaitingTrailers],
        )?;

        const TERMINATOR: &[u8] = b"0\r\n\r\n";
        self.emit(TERMINATOR).await?;

        self.state = WriterState::Done;
        Ok(TERMINATOR.len())
    }

    /// Ends a chunked body with `0\r\n`, the trailer fields, and a blank line.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), WriteError> {
        self.expect(
            "write_trailers",
            &[WriterState::AwaitingBody, WriterState::AwaitingTrailers],
        )?;

        let mut buf = b"0\r\n".to_vec();
        trailers.write_fields(&mut buf);
        buf.extend_from_slice(b"\r\n");
        self.emit(&buf).await?;

        self.state = WriterState::Done;
        Ok(())
    }

    fn expect(&self, operation: &'static str, allowed: &[WriterState]) -> Result<(), WriteError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(WriteError::OutOfOrder {
                operation,
                state: self.state,
            })
        }
    }

    async fn emit(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.sink.write_all(bytes).await?;
        self.sink.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunks_then_terminator() {
        let mut writer = ResponseWriter::new(Vec::<u8>::new());
        writer.state = WriterState::AwaitingBody;

        assert_eq!(writer.write_chunked_body(b"abc").await.unwrap(), 8);
        writer.write_chunked_body(b"de").await.unwrap();
        writer.write_chunked_body_done().await.unwrap();

        assert_eq!(writer.into_inner(), b"3\r\nabc\r\n2\r\nde\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn hex_chunk_length() {
        let mut writer = ResponseWriter::new(Vec::<u8>::new());
        writer.state = WriterState::AwaitingBody;

        writer.write_chunked_body(&[b'x'; 26]).await.unwrap();

        let out = writer.into_inner();
        assert!(out.starts_with(b"1a\r\n"));
        assert!(out.ends_with(b"x\r\n"));
    }

    #[tokio::test]
    async fn empty_chunk_is_skipped() {
        let mut writer = ResponseWriter::new(Vec::<u8>::new());
        writer.state = WriterState::AwaitingBody;

        assert_eq!(writer.write_chunked_body(b"").await.unwrap(), 0);
        assert_eq!(writer.state(), WriterState::AwaitingBody);
        assert!(writer.into_inner().is_empty());
    }

    #[tokio::test]
    async fn fixed_body_not_allowed_after_chunk() {
        let mut writer = ResponseWriter::new(Vec::<u8>::new());
        writer.state = WriterState::AwaitingBody;

        writer.write_chunked_body(b"abc").await.unwrap();
        let err = writer.write_body(b"tail").await.unwrap_err();

        assert!(matches!(
            err,
            WriteError::OutOfOrder {
                operation: "write_body",
                state: WriterState::AwaitingTrailers
            }
        ));
    }
}
