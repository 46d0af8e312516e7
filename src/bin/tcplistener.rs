//! Diagnostic listener: accepts connections one at a time, parses a single
//! request from each, and prints it to stdout. Nothing is written back.

use anyhow::Context;
use httpfromtcp::config::Config;
use httpfromtcp::http::read_request;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.logging.max_level()?)
        .init();

    let listener = TcpListener::bind(("127.0.0.1", cfg.server.port))
        .await
        .with_context(|| format!("failed to bind port {}", cfg.server.port))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    loop {
        let (mut stream, peer) = listener.accept().await.context("accept failed")?;
        tracing::info!(%peer, "Connection accepted");

        match read_request(&mut stream).await {
            Ok(request) => println!("{}", request),
            Err(e) => tracing::warn!(%peer, error = %e, "Failed to parse request"),
        }

        tracing::info!(%peer, "Connection closed");
    }
}
