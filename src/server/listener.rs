use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

use crate::http::connection::Connection;
use crate::http::handler::Handler;

/// A running server. The accept loop lives on its own task.
///
/// Dropping the handle without calling [`Server::close`] still stops the
/// accept loop; in-flight connections always run to completion.
pub struct Server {
    local_addr: SocketAddr,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    accept_loop: Option<JoinHandle<()>>,
}

impl Server {
    /// Binds `127.0.0.1:<port>` and starts accepting.
    pub async fn serve<H: Handler>(port: u16, handler: H) -> anyhow::Result<Self> {
        Self::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port)), handler).await
    }

    pub async fn bind<H: Handler>(addr: SocketAddr, handler: H) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);

        let closed = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());
        let accept_loop = tokio::spawn(accept_loop(
            listener,
            Arc::new(handler),
            closed.clone(),
            shutdown.clone(),
        ));

        Ok(Self {
            local_addr,
            closed,
            shutdown,
            accept_loop: Some(accept_loop),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops accepting and waits for the listening socket to be released.
    ///
    /// Calling this more than once is a no-op.
    pub async fn close(&mut self) -> anyhow::Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.shutdown.notify_one();

        if let Some(task) = self.accept_loop.take() {
            task.await.context("accept loop panicked")?;
        }

        info!("Server closed");
        Ok(())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shutdown.notify_one();
        }
    }
}

async fn accept_loop<H: Handler>(
    listener: TcpListener,
    handler: Arc<H>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.notified() => break,
            res = listener.accept() => res,
        };

        let (socket, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                if closed.load(Ordering::SeqCst) {
                    break;
                }
                tracing::error!(error = %e, "Error accepting connection");
                continue;
            }
        };

        if closed.load(Ordering::SeqCst) {
            break;
        }

        tracing::debug!("Accepted connection from {}", peer);

        let handler = handler.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, handler);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {:#}", peer, e);
            }
        });
    }

    // Listener is dropped here, releasing the port.
}
