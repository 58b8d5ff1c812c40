use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SinkConfig;
use crate::core::{Hub, HubError, Inbox, SubscriberHandle, WILDCARD};

/// Prints every broadcast message, one per line, to a text stream.
pub struct Console<W = Stdout> {
    hub: Arc<Hub>,
    sink: SinkConfig,
    out: Arc<Mutex<W>>,
    handle: SubscriberHandle,
    printer: Option<JoinHandle<()>>,
}

impl Console<Stdout> {
    pub fn stdout(hub: Arc<Hub>, sink: SinkConfig) -> Self {
        Self::new(hub, sink, tokio::io::stdout())
    }
}

impl<W> Console<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(hub: Arc<Hub>, sink: SinkConfig, out: W) -> Self {
        Self {
            hub,
            sink,
            out: Arc::new(Mutex::new(out)),
            handle: SubscriberHandle::default(),
            printer: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_set()
    }

    /// Subscribes to every topic and starts printing. No-op when running.
    pub async fn start(&mut self) -> Result<(), HubError> {
        if self.is_running() {
            return Ok(());
        }

        let (handle, inbox) = self.sink.endpoint();
        self.hub.register(&handle, [WILDCARD]).await?;

        self.printer = Some(tokio::spawn(print_loop(inbox, Arc::clone(&self.out))));
        self.handle = handle;
        info!(target: "stem::sinks", handle = %self.handle.id(), "Console sink started");
        Ok(())
    }

    /// Deregisters, then closes the endpoint and waits for the printer to
    /// finish. No-op when stopped.
    pub async fn stop(&mut self) {
        if !self.is_running() {
            return;
        }

        self.hub.deregister(&self.handle).await;
        // Last sender outside the hub: dropping it closes the inbox.
        let handle = std::mem::take(&mut self.handle);
        drop(handle);

        if let Some(printer) = self.printer.take() {
            if let Err(e) = printer.await {
                warn!(target: "stem::sinks", "Console printer task failed: {e}");
            }
        }
        info!(target: "stem::sinks", "Console sink stopped");
    }
}

async fn print_loop<W>(inbox: Inbox, out: Arc<Mutex<W>>)
where
    W: AsyncWrite + Unpin + Send,
{
    while let Some(message) = inbox.recv().await {
        let mut out = out.lock().await;
        let written = async {
            out.write_all(message.as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await
        }
        .await;

        if let Err(e) = written {
            // Keep draining: publishers block on this inbox.
            warn!(target: "stem::sinks", "Console write failed: {e}");
        }
    }
}
