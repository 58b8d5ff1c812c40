//! HTTP hosts around the hub.
//!
//! - `api`      – ingestion endpoint that publishes request bodies
//! - `launcher` – control panel that starts and stops the other hosts
//! - `server`   – bind / graceful-shutdown plumbing shared by every host

pub mod api;
pub mod launcher;
pub mod server;

pub use api::Api;
pub use launcher::Launcher;
pub use server::HttpServer;

use serde::{Deserialize, Serialize};

/// Which collaborators are (or should be) running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    pub api: bool,
    pub console: bool,
    pub websocket: bool,
}
