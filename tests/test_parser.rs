use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use httpfromtcp::http::parser::{read_request, ParseError};
use tokio::io::{AsyncRead, ReadBuf};

/// Hands out at most `per_read` bytes per read, like a slow network peer.
struct ChunkReader {
    data: Vec<u8>,
    per_read: usize,
    pos: usize,
}

impl ChunkReader {
    fn new(data: &str, per_read: usize) -> Self {
        Self {
            data: data.as_bytes().to_vec(),
            per_read,
            pos: 0,
        }
    }
}

impl AsyncRead for ChunkReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let start = self.pos;
        let end = (start + self.per_read).min(self.data.len());
        let n = (end - start).min(buf.remaining());
        buf.put_slice(&self.data[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_parse_good_get_request_line() {
    let mut reader = ChunkReader::new(
        "GET / HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n",
        3,
    );
    let req = read_request(&mut reader).await.unwrap();

    assert_eq!(req.request_line.method, "GET");
    assert_eq!(req.request_line.target, "/");
    assert_eq!(req.request_line.version, "1.1");
}

#[tokio::test]
async fn test_parse_request_line_one_byte_reads() {
    let mut reader = ChunkReader::new(
        "GET /coffee HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n",
        1,
    );
    let req = read_request(&mut reader).await.unwrap();

    assert_eq!(req.method(), "GET");
    assert_eq!(req.target(), "/coffee");
    assert_eq!(req.request_line.version, "1.1");
}

#[tokio::test]
async fn test_parse_post_single_read() {
    let mut reader = ChunkReader::new(
        "POST /coffee HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n",
        4096,
    );
    let req = read_request(&mut reader).await.unwrap();

    assert_eq!(req.method(), "POST");
    assert_eq!(req.target(), "/coffee");
}

#[tokio::test]
async fn test_parse_invalid_number_of_parts() {
    let mut reader = ChunkReader::new("/coffee HTTP/1.1\r\nHost: localhost:42069\r\n\r\n", 4096);
    let result = read_request(&mut reader).await;

    assert!(matches!(result, Err(ParseError::MalformedRequestLine(_))));
}

#[tokio::test]
async fn test_parse_out_of_order_request_line() {
    let mut reader = ChunkReader::new("/coffee POST HTTP/1.1\r\nHost: localhost:42069\r\n\r\n", 4096);
    let result = read_request(&mut reader).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_parse_invalid_version() {
    let mut reader = ChunkReader::new("OPTIONS /prime/rib TCP/1.1\r\nHost: localhost:42069\r\n\r\n", 4096);
    let result = read_request(&mut reader).await;
    assert!(matches!(result, Err(ParseError::UnsupportedVersion(_))));

    let mut reader = ChunkReader::new("GET / HTTP/1.0\r\nHost: localhost:42069\r\n\r\n", 2);
    let result = read_request(&mut reader).await;
    assert!(matches!(result, Err(ParseError::UnsupportedVersion(_))));
}

#[tokio::test]
async fn test_parse_standard_headers() {
    let mut reader = ChunkReader::new(
        "GET / HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n",
        3,
    );
    let req = read_request(&mut reader).await.unwrap();

    assert_eq!(req.headers.get("host"), Some("localhost:42069"));
    assert_eq!(req.headers.get("user-agent"), Some("curl/7.81.0"));
    assert_eq!(req.headers.get("accept"), Some("*/*"));
}

#[tokio::test]
async fn test_parse_empty_headers() {
    let mut reader = ChunkReader::new("GET / HTTP/1.1\r\n\r\n", 3);
    let req = read_request(&mut reader).await.unwrap();

    assert!(req.headers.is_empty());
    assert!(req.body.is_empty());
}

#[tokio::test]
async fn test_parse_malformed_header() {
    let mut reader = ChunkReader::new("GET / HTTP/1.1\r\nHost localhost:42069\r\n\r\n", 3);
    let result = read_request(&mut reader).await;

    assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
}

#[tokio::test]
async fn test_parse_space_before_colon_rejected() {
    let mut reader = ChunkReader::new("GET / HTTP/1.1\r\nHost : localhost:42069\r\n\r\n", 3);
    let result = read_request(&mut reader).await;

    assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
}

#[tokio::test]
async fn test_parse_duplicate_headers() {
    let mut reader = ChunkReader::new(
        "GET / HTTP/1.1\r\nHost: localhost:42069\r\nHost: duplicate:8080\r\n\r\n",
        3,
    );
    let req = read_request(&mut reader).await.unwrap();

    assert_eq!(req.header("host"), Some("localhost:42069, duplicate:8080"));
}

#[tokio::test]
async fn test_parse_case_insensitive_headers() {
    let mut reader = ChunkReader::new(
        "GET / HTTP/1.1\r\nHOST: localhost:42069\r\nUSER-AGENT: curl/7.81.0\r\n\r\n",
        3,
    );
    let req = read_request(&mut reader).await.unwrap();

    assert_eq!(req.header("host"), Some("localhost:42069"));
    assert_eq!(req.header("User-Agent"), Some("curl/7.81.0"));
}

#[tokio::test]
async fn test_parse_missing_end_of_headers() {
    let mut reader = ChunkReader::new(
        "GET / HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0",
        3,
    );
    let result = read_request(&mut reader).await;

    assert_eq!(result, Err(ParseError::ConnectionClosed));
}

#[tokio::test]
async fn test_parse_standard_body() {
    let mut reader = ChunkReader::new(
        "POST /submit HTTP/1.1\r\nHost: localhost:42069\r\nContent-Length: 13\r\n\r\nhello world!\n",
        3,
    );
    let req = read_request(&mut reader).await.unwrap();

    assert_eq!(req.body, b"hello world!\n".to_vec());
    assert_eq!(req.content_length(), Some(13));
}

#[tokio::test]
async fn test_parse_zero_content_length() {
    let mut reader = ChunkReader::new(
        "POST /submit HTTP/1.1\r\nHost: localhost:42069\r\nContent-Length: 0\r\n\r\n",
        3,
    );
    let req = read_request(&mut reader).await.unwrap();

    assert!(req.body.is_empty());
}

#[tokio::test]
async fn test_parse_body_shorter_than_content_length() {
    let mut reader = ChunkReader::new(
        "POST /submit HTTP/1.1\r\nHost: localhost:42069\r\nContent-Length: 20\r\n\r\npartial content!",
        3,
    );
    let result = read_request(&mut reader).await;

    assert_eq!(
        result,
        Err(ParseError::IncompleteBody {
            expected: 20,
            received: 16
        })
    );
}

#[tokio::test]
async fn test_parse_body_without_content_length_is_ignored() {
    let mut reader = ChunkReader::new(
        "POST /submit HTTP/1.1\r\nHost: localhost:42069\r\n\r\nhello world!\n",
        3,
    );
    let req = read_request(&mut reader).await.unwrap();

    assert!(req.body.is_empty());
}

#[tokio::test]
async fn test_parse_binary_body() {
    let mut reader = ChunkReader {
        data: b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03".to_vec(),
        per_read: 5,
        pos: 0,
    };
    let req = read_request(&mut reader).await.unwrap();

    assert_eq!(req.body, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_parse_any_read_size_gives_same_request() {
    let data = "PUT /items/7 HTTP/1.1\r\nHost: localhost\r\nX-Tag: a\r\nx-tag: b\r\nContent-Length: 11\r\n\r\n{\"id\": 7 }\n";
    let whole = read_request(&mut ChunkReader::new(data, data.len())).await.unwrap();

    for per_read in 1..data.len() {
        let req = read_request(&mut ChunkReader::new(data, per_read)).await.unwrap();
        assert_eq!(req, whole, "read size {}", per_read);
    }
}

#[tokio::test]
async fn test_parse_non_utf8_header_value() {
    let mut reader = ChunkReader {
        data: b"GET / HTTP/1.1\r\nX: caf\xe9\r\nHost: a\r\n\r\n".to_vec(),
        per_read: 3,
        pos: 0,
    };
    let req = read_request(&mut reader).await.unwrap();

    assert_eq!(req.headers.get_bytes("x"), Some(&b"caf\xe9"[..]));
    assert_eq!(req.header("host"), Some("a"));
}

#[tokio::test]
async fn test_parse_empty_stream() {
    let mut reader = ChunkReader::new("", 3);
    let result = read_request(&mut reader).await;

    assert_eq!(result, Err(ParseError::ConnectionClosed));
}
