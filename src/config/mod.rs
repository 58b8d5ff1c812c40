//! TOML-driven runtime configuration.
//!
//! Precedence: built-in defaults, then the file, then `STEM_*` environment
//! variables. Command-line flags are layered on top by the binary.

use serde::Deserialize;
use std::{env, fs, path::Path};
use thiserror::Error;

use crate::core::{Inbox, Overflow, SubscriberHandle};
use crate::hosts::HostStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config parse error: {0}")]
    Parse(String),
}

/// Control panel listener.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WebConfig {
    pub bind_addr: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8877".to_string(),
        }
    }
}

/// Ingestion endpoint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_addr: "0.0.0.0:9988".to_string(),
        }
    }
}

/// How a sink's endpoint is built. `queue_capacity = 0` means unbuffered,
/// which only works with the `block` policy.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct SinkConfig {
    pub queue_capacity: usize,
    pub overflow: Overflow,
}

impl SinkConfig {
    /// Creates a fresh handle and inbox shaped by this config.
    pub fn endpoint(&self) -> (SubscriberHandle, Inbox) {
        if self.queue_capacity == 0 {
            SubscriberHandle::channel()
        } else {
            SubscriberHandle::bounded(self.queue_capacity, self.overflow)
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub sink: SinkConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WebSocketConfig {
    pub enabled: bool,
    pub bind_addr: String,
    /// Frames buffered per viewer connection before a slow viewer skips ahead.
    pub buffer: usize,
    #[serde(flatten)]
    pub sink: SinkConfig,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_addr: "0.0.0.0:7766".to_string(),
            buffer: 256,
            sink: SinkConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub api: ApiConfig,
    pub console: ConsoleConfig,
    pub websocket: WebSocketConfig,
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given (falling back to `STEM_CONFIG`), then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var_os("STEM_CONFIG");
        let effective = path.map(Path::to_path_buf).or(env_path.map(Into::into));

        let mut config = match effective {
            Some(p) => Self::from_toml_str(&fs::read_to_string(p)?)?,
            None => Config::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `STEM_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STEM_WEB_ADDR") {
            self.web.bind_addr = v;
        }
        if let Some(v) = lookup("STEM_API_ADDR") {
            self.api.bind_addr = v;
        }
        if let Some(v) = lookup("STEM_WEBSOCKET_ADDR") {
            self.websocket.bind_addr = v;
        }
        if let Some(v) = lookup("STEM_API") {
            self.api.enabled = parse_flag("STEM_API", &v)?;
        }
        if let Some(v) = lookup("STEM_CONSOLE") {
            self.console.enabled = parse_flag("STEM_CONSOLE", &v)?;
        }
        if let Some(v) = lookup("STEM_WEBSOCKET") {
            self.websocket.enabled = parse_flag("STEM_WEBSOCKET", &v)?;
        }
        if let Some(v) = lookup("STEM_WEBSOCKET_BUFFER") {
            self.websocket.buffer = v
                .parse()
                .map_err(|e| ConfigError::Parse(format!("STEM_WEBSOCKET_BUFFER: {e}")))?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, sink) in [("console", &self.console.sink), ("websocket", &self.websocket.sink)] {
            if sink.queue_capacity == 0 && sink.overflow != Overflow::Block {
                return Err(ConfigError::Parse(format!(
                    "{name}: overflow {:?} needs queue_capacity > 0",
                    sink.overflow
                )));
            }
        }
        if self.websocket.buffer == 0 {
            return Err(ConfigError::Parse("websocket.buffer must be > 0".into()));
        }
        Ok(())
    }

    /// Which hosts should run right after startup.
    pub fn initial_status(&self) -> HostStatus {
        HostStatus {
            api: self.api.enabled,
            console: self.console.enabled,
            websocket: self.websocket.enabled,
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Parse(format!("{key}: not a boolean: {other}"))),
    }
}

pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => Config::load(Some(p.as_ref())),
        None => Config::load(None),
    }
}
