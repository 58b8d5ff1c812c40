//! Browser viewer for the broadcast stream.
//!
//! The host registers a single wildcard handle with the hub. A forwarder task
//! drains its inbox into a `tokio::sync::broadcast` channel, and every open
//! websocket gets its own receiver on that channel. Framing and per-viewer
//! buffering live here; the hub only ever sees one fast subscriber.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WebSocketConfig;
use crate::core::{Hub, Inbox, Payload, SubscriberHandle, WILDCARD};
use crate::hosts::server::HttpServer;

static VIEWER_HTML: &str = include_str!("viewer.html");

#[derive(Clone)]
struct ViewerState {
    frames: broadcast::Sender<Payload>,
    closing: watch::Receiver<bool>,
}

struct Running {
    handle: SubscriberHandle,
    server: HttpServer,
    forwarder: JoinHandle<()>,
    closing: watch::Sender<bool>,
}

/// HTTP host serving the viewer page at `/` and the push stream at `/ws`.
pub struct WebSocketHost {
    hub: Arc<Hub>,
    config: WebSocketConfig,
    running: Option<Running>,
}

impl WebSocketHost {
    pub fn new(hub: Arc<Hub>, config: WebSocketConfig) -> Self {
        Self {
            hub,
            config,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.server.local_addr())
    }

    pub fn configured_addr(&self) -> &str {
        &self.config.bind_addr
    }

    pub async fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let (frames, _) = broadcast::channel(self.config.buffer);
        let (closing, closing_rx) = watch::channel(false);
        let state = ViewerState {
            frames: frames.clone(),
            closing: closing_rx,
        };
        let server = HttpServer::bind("websocket", &self.config.bind_addr, router(state)).await?;

        let (handle, inbox) = self.config.sink.endpoint();
        if let Err(e) = self.hub.register(&handle, [WILDCARD]).await {
            server.shutdown().await;
            return Err(e.into());
        }
        let forwarder = tokio::spawn(forward(inbox, frames));

        info!(
            target: "stem::sinks",
            handle = %handle.id(),
            addr = %server.local_addr(),
            "Web socket host started"
        );
        self.running = Some(Running {
            handle,
            server,
            forwarder,
            closing,
        });
        Ok(())
    }

    /// Deregisters first, then tears down the forwarder, the open viewers and
    /// finally the listener.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        info!(target: "stem::sinks", "Stopping web socket host...");

        self.hub.deregister(&running.handle).await;
        drop(running.handle);
        if let Err(e) = running.forwarder.await {
            warn!(target: "stem::sinks", "Web socket forwarder failed: {e}");
        }

        let _ = running.closing.send(true);
        running.server.shutdown().await;
        info!(target: "stem::sinks", "Web socket host stopped");
    }
}

fn router(state: ViewerState) -> Router {
    Router::new()
        .route("/", get(viewer_page))
        .route("/ws", get(ws_handler))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn forward(inbox: Inbox, frames: broadcast::Sender<Payload>) {
    while let Some(message) = inbox.recv().await {
        // Err only means nobody is watching right now.
        let _ = frames.send(message);
    }
    debug!(target: "stem::sinks", "Web socket forwarder drained");
}

async fn viewer_page() -> Html<&'static str> {
    Html(VIEWER_HTML)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Page not found")
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ViewerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_viewer(socket, state))
}

/// Per-connection loop: pushes frames, answers pings, ends on close.
async fn run_viewer(socket: WebSocket, state: ViewerState) {
    let conn_id = Uuid::new_v4();
    info!(target: "stem::sinks", %conn_id, "Viewer connected");

    let (mut tx, mut rx) = socket.split();
    let mut frames = state.frames.subscribe();
    let mut closing = state.closing;

    loop {
        tokio::select! {
            incoming = rx.next() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if tx.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },

            frame = frames.recv() => match frame {
                Ok(payload) => {
                    if tx.send(Message::Text(payload.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "stem::sinks", %conn_id, skipped, "Viewer lagging; frames skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            _ = closing.changed() => break,
        }
    }

    let _ = tx.send(Message::Close(None)).await;
    info!(target: "stem::sinks", %conn_id, "Viewer disconnected");
}
