use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::http::handler::Handler;
use crate::http::parser::{read_request, ParseError};
use crate::http::request::Request;
use crate::http::response::{default_headers, StatusCode};
use crate::http::writer::ResponseWriter;

/// One accepted connection: a single request and a single response.
pub struct Connection<S, H> {
    stream: S,
    peer: SocketAddr,
    handler: Arc<H>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Responding(Request),
    Rejecting(ParseError),
    Closed,
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: Handler,
{
    pub fn new(stream: S, peer: SocketAddr, handler: Arc<H>) -> Self {
        Self {
            stream,
            peer,
            handler,
            state: ConnectionState::Reading,
        }
    }

    /// Parses the request, answers it, and closes the stream.
    ///
    /// The stream is shut down even when the handler fails.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.process().await;

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(peer = %self.peer, error = %e, "Shutdown failed");
        }

        result
    }

    async fn process(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match read_request(&mut self.stream).await {
                        Ok(request) => ConnectionState::Responding(request),
                        Err(e @ ParseError::Io { .. }) => {
                            return Err(e).context("failed to read request");
                        }
                        Err(e) => ConnectionState::Rejecting(e),
                    };
                }

                ConnectionState::Responding(request) => {
                    tracing::info!(
                        peer = %self.peer,
                        method = %request.method(),
                        target = %request.target(),
                        "Handling request"
                    );

                    let mut writer = ResponseWriter::new(&mut self.stream);
                    self.handler
                        .handle(&mut writer, &request)
                        .await
                        .with_context(|| format!("handler failed for {}", request.target()))?;
                }

                ConnectionState::Rejecting(error) => {
                    tracing::warn!(peer = %self.peer, error = %error, "Rejecting malformed request");
                    write_parse_error(&mut self.stream, &error).await?;
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }
}

async fn write_parse_error<W>(sink: W, error: &ParseError) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = format!("Error parsing request: {}", error);
    let mut writer = ResponseWriter::new(sink);

    writer.write_status_line(StatusCode::BadRequest).await?;
    writer.write_headers(&default_headers(body.len())).await?;
    writer.write_body(body.as_bytes()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    struct Echo;

    impl Handler for Echo {
        async fn handle<W>(&self, writer: &mut ResponseWriter<W>, request: &Request) -> anyhow::Result<()>
        where
            W: AsyncWrite + Unpin + Send,
        {
            writer.write_status_line(StatusCode::Ok).await?;
            writer.write_headers(&default_headers(request.body.len())).await?;
            writer.write_body(&request.body).await?;
            Ok(())
        }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:4000".parse().unwrap()
    }

    #[tokio::test]
    async fn answers_parsed_request() {
        let (client, server) = tokio::io::duplex(4096);
        let mut conn = Connection::new(server, peer(), Arc::new(Echo));
        let task = tokio::spawn(async move { conn.run().await });

        let mut client = client;
        client
            .write_all(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
            .await
            .unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(
            out,
            "HTTP/1.1 200 OK\r\ncontent-length: 5\r\nconnection: close\r\ncontent-type: text/plain\r\n\r\nhello"
        );
    }

    #[tokio::test]
    async fn rejects_malformed_request_with_400() {
        let (client, server) = tokio::io::duplex(4096);
        let mut conn = Connection::new(server, peer(), Arc::new(Echo));
        let task = tokio::spawn(async move { conn.run().await });

        let mut client = client;
        client.write_all(b"GET / HTTP/1.0\r\n\r\n").await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        task.await.unwrap().unwrap();

        assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(out.ends_with("Error parsing request: unsupported HTTP version: \"HTTP/1.0\""));
    }
}
