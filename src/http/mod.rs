//! HTTP/1.1 protocol engine.
//!
//! - **`headers`**: Case-insensitive header table and header-line parsing
//! - **`parser`**: Incremental request parser driven by arbitrary reads
//! - **`request`**: Parsed request representation
//! - **`response`**: Status codes and default response headers
//! - **`writer`**: Ordered response emission, including chunked bodies and trailers
//! - **`handler`**: The application callback boundary
//! - **`connection`**: One request and one response per accepted connection
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Feed reads to the parser
//!        └──────┬──────┘
//!               │
//!       ┌───────┴────────┐
//!       │ parsed         │ parse error
//!       ▼                ▼
//! ┌────────────┐   ┌────────────┐
//! │ Responding │   │ Rejecting  │ ← 400 with the error text
//! └─────┬──────┘   └─────┬──────┘
//!       └───────┬────────┘
//!               ▼
//!        ┌─────────────┐
//!        │   Closed    │
//!        └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use httpfromtcp::http::{Handler, Request, ResponseWriter, StatusCode, default_headers};
//! use httpfromtcp::server::Server;
//! use tokio::io::AsyncWrite;
//!
//! struct Hello;
//!
//! impl Handler for Hello {
//!     async fn handle<W>(&self, w: &mut ResponseWriter<W>, _req: &Request) -> anyhow::Result<()>
//!     where
//!         W: AsyncWrite + Unpin + Send,
//!     {
//!         w.write_status_line(StatusCode::Ok).await?;
//!         w.write_headers(&default_headers(6)).await?;
//!         w.write_body(b"hello\n").await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = Server::serve(42069, Hello).await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.close().await
//! }
//! ```

pub mod connection;
pub mod handler;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use handler::Handler;
pub use headers::{HeaderError, Headers};
pub use parser::{read_request, ParseError, RequestParser};
pub use request::{Request, RequestLine};
pub use response::{default_headers, StatusCode};
pub use writer::{ResponseWriter, WriteError, WriterState};
