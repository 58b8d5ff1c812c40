//! Control panel: a small web page that starts and stops the other hosts.
//!
//! It owns the collaborators but carries no topic logic; toggling a sink is
//! just its `start`/`stop`, which register and deregister with the hub.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use std::sync::Arc;
use tokio::io::Stdout;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::core::Hub;
use crate::hosts::{api::Api, server::HttpServer, HostStatus};
use crate::sinks::{Console, WebSocketHost};

static LAUNCHER_HTML: &str = include_str!("launcher.html");

struct Hosts {
    api: Api,
    console: Console<Stdout>,
    websocket: WebSocketHost,
    status: HostStatus,
}

impl Hosts {
    /// Starts or stops only the hosts whose wanted state differs. A host that
    /// fails to start stays marked as stopped.
    async fn sync(&mut self, wanted: HostStatus) -> HostStatus {
        if self.status.api != wanted.api {
            if wanted.api {
                match self.api.start().await {
                    Ok(()) => self.status.api = true,
                    Err(e) => error!(target: "stem::launcher", "API host failed to start: {e:#}"),
                }
            } else {
                self.api.stop().await;
                self.status.api = false;
            }
        }

        if self.status.console != wanted.console {
            if wanted.console {
                match self.console.start().await {
                    Ok(()) => self.status.console = true,
                    Err(e) => error!(target: "stem::launcher", "Console sink failed to start: {e}"),
                }
            } else {
                self.console.stop().await;
                self.status.console = false;
            }
        }

        if self.status.websocket != wanted.websocket {
            if wanted.websocket {
                match self.websocket.start().await {
                    Ok(()) => self.status.websocket = true,
                    Err(e) => error!(target: "stem::launcher", "Web socket host failed to start: {e:#}"),
                }
            } else {
                self.websocket.stop().await;
                self.status.websocket = false;
            }
        }

        self.status
    }

    fn render(&self) -> String {
        let api_addr = self
            .api
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|| self.api.configured_addr().to_string());
        let ws_addr = self
            .websocket
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|| self.websocket.configured_addr().to_string());

        let rows = [
            row("API", "api", self.status.api, &api_addr),
            row("Console", "console", self.status.console, "stdout"),
            row("WebSocket", "websocket", self.status.websocket, &ws_addr),
        ]
        .concat();

        LAUNCHER_HTML.replace("{{rows}}", &rows)
    }
}

fn row(label: &str, key: &str, running: bool, addr: &str) -> String {
    let (state, action) = if running {
        ("Running", "stop")
    } else {
        ("Stopped", "start")
    };
    format!(
        "<tr><td>{label}</td><td class=\"{state}\">{state}</td><td>{addr}</td>\
         <td><a href=\"/{key}/{action}\">{action}</a></td></tr>\n"
    )
}

/// Owns the API, console and websocket hosts and exposes them over HTTP.
#[derive(Clone)]
pub struct Launcher {
    hosts: Arc<Mutex<Hosts>>,
}

impl Launcher {
    pub fn new(hub: Arc<Hub>, config: &Config) -> Self {
        let hosts = Hosts {
            api: Api::new(Arc::clone(&hub), config.api.clone()),
            console: Console::stdout(Arc::clone(&hub), config.console.sink),
            websocket: WebSocketHost::new(hub, config.websocket.clone()),
            status: HostStatus::default(),
        };
        Self {
            hosts: Arc::new(Mutex::new(hosts)),
        }
    }

    pub async fn status(&self) -> HostStatus {
        self.hosts.lock().await.status
    }

    /// Brings the running hosts in line with `wanted`; returns what is
    /// actually running afterwards.
    pub async fn sync(&self, wanted: HostStatus) -> HostStatus {
        self.hosts.lock().await.sync(wanted).await
    }

    async fn update(&self, change: impl FnOnce(&mut HostStatus)) -> HostStatus {
        let mut hosts = self.hosts.lock().await;
        let mut wanted = hosts.status;
        change(&mut wanted);
        hosts.sync(wanted).await
    }

    /// Stops everything, sinks deregistering before their endpoints close.
    pub async fn shutdown(&self) {
        self.sync(HostStatus::default()).await;
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(homepage))
            .route("/status", get(status))
            .route("/{host}/{action}", any(toggle))
            .fallback(not_found)
            .with_state(self.clone())
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(&self, addr: &str) -> anyhow::Result<HttpServer> {
        let server = HttpServer::bind("web", addr, self.router()).await?;
        info!(target: "stem::launcher", addr = %server.local_addr(), "Web host started");
        Ok(server)
    }
}

async fn homepage(State(launcher): State<Launcher>) -> Html<String> {
    Html(launcher.hosts.lock().await.render())
}

async fn status(State(launcher): State<Launcher>) -> Json<HostStatus> {
    Json(launcher.status().await)
}

async fn toggle(
    State(launcher): State<Launcher>,
    Path((host, action)): Path<(String, String)>,
) -> Response {
    let on = match action.as_str() {
        "start" => true,
        "stop" => false,
        _ => return not_found().await.into_response(),
    };

    match host.as_str() {
        "api" => launcher.update(|s| s.api = on).await,
        "console" => launcher.update(|s| s.console = on).await,
        "websocket" => launcher.update(|s| s.websocket = on).await,
        _ => return not_found().await.into_response(),
    };

    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Page not found")
}
