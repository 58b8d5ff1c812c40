//! stem – topic-filtered publish/subscribe broadcaster.
//!
//! This crate exports
//!  * `core`    – the hub: subscription registry and broadcast fan-out
//!  * `sinks`   – console and websocket subscribers
//!  * `hosts`   – HTTP ingestion endpoint and control panel
//!  * `config`  – TOML-driven runtime configuration
//!  * `logging` – tracing subscriber setup
//!
//! Embedders build one [`Hub`], share it as `Arc<Hub>`, and either wire their
//! own collaborators against it or reuse the ones here.

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod config;
pub mod core;
pub mod hosts;
pub mod logging;
pub mod sinks;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use crate::config::{load_config, Config};
pub use crate::core::{Hub, HubError, Inbox, Overflow, PublishReport, SubscriberHandle, WILDCARD};
