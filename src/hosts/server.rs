use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A running axum server that can be stopped and awaited.
#[derive(Debug)]
pub struct HttpServer {
    name: &'static str,
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl HttpServer {
    /// Binds `addr` and starts serving `router` in the background.
    pub async fn bind(name: &'static str, addr: &str, router: Router) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("{name}: failed to bind {addr}"))?;
        let local_addr = listener.local_addr()?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
        });

        info!(target: "stem::hosts", host = name, addr = %local_addr, "Listening");
        Ok(Self {
            name,
            local_addr,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(target: "stem::hosts", host = self.name, "Server error: {e}"),
            Err(e) => error!(target: "stem::hosts", host = self.name, "Server task failed: {e}"),
        }
        info!(target: "stem::hosts", host = self.name, addr = %self.local_addr, "Stopped");
    }
}
