use httpfromtcp::app::DemoHandler;
use httpfromtcp::config::Config;
use httpfromtcp::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.logging.max_level()?)
        .init();

    let mut server = Server::serve(cfg.server.port, DemoHandler::new(cfg.demo.video_path)).await?;
    tracing::info!("Server started on port {}", server.local_addr().port());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    server.close().await?;
    tracing::info!("Server gracefully stopped");

    Ok(())
}
