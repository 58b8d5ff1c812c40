use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    routing::any,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::ApiConfig;
use crate::core::{Hub, WILDCARD};
use crate::hosts::server::HttpServer;

#[derive(Debug, Deserialize)]
pub struct IngestQuery {
    pub topic: Option<String>,
}

/// Ingestion endpoint: the body of any non-GET request is published.
pub struct Api {
    hub: Arc<Hub>,
    config: ApiConfig,
    server: Option<HttpServer>,
}

impl Api {
    pub fn new(hub: Arc<Hub>, config: ApiConfig) -> Self {
        Self {
            hub,
            config,
            server: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.server.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(HttpServer::local_addr)
    }

    pub fn configured_addr(&self) -> &str {
        &self.config.bind_addr
    }

    pub async fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            return Ok(());
        }
        let server = HttpServer::bind("api", &self.config.bind_addr, router(Arc::clone(&self.hub))).await?;
        info!(target: "stem::hosts", addr = %server.local_addr(), "API host started");
        self.server = Some(server);
        Ok(())
    }

    pub async fn stop(&mut self) {
        if let Some(server) = self.server.take() {
            info!(target: "stem::hosts", "Stopping API host...");
            server.shutdown().await;
        }
    }
}

pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/", any(ingest))
        .fallback(ingest)
        .with_state(hub)
        .layer(TraceLayer::new_for_http())
}

/// `?topic=` picks the topic; without it (or when empty) the message goes out
/// on the wildcard. Every path is accepted.
///
/// The publish runs on its own task so a client hanging up mid-delivery
/// cannot cancel it.
async fn ingest(
    State(hub): State<Arc<Hub>>,
    method: Method,
    Query(query): Query<IngestQuery>,
    body: String,
) -> StatusCode {
    if method == Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED;
    }

    let topic = query
        .topic
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| WILDCARD.to_string());

    let publish = tokio::spawn(async move {
        let report = hub.publish(body, &topic).await;
        (topic, report)
    });
    match publish.await {
        Ok((topic, report)) => {
            debug!(target: "stem::hosts", %topic, delivered = report.delivered, "Ingested message");
            StatusCode::OK
        }
        Err(e) => {
            error!(target: "stem::hosts", error = %e, "Publish task failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
