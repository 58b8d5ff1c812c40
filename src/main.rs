//! stem – control panel, sinks and ingestion API in one process.
//
//  $ stem --console --api
//  $ curl -d 'hello' http://127.0.0.1:9988/
//  hello
use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::info;

use stem::config::{load_config, Config};
use stem::core::Hub;
use stem::hosts::Launcher;
use stem::logging::init_logging;

#[derive(Debug, Parser)]
#[command(name = "stem", version, about = "Topic-filtered broadcaster with console and websocket sinks")]
struct Cli {
    /// Path to config TOML (env STEM_CONFIG is used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control panel address
    #[arg(long)]
    web_addr: Option<String>,

    /// Start the console sink
    #[arg(long)]
    console: bool,

    /// Start the HTTP ingestion API
    #[arg(long)]
    api: bool,

    /// HTTP ingestion API address
    #[arg(long)]
    api_addr: Option<String>,

    /// Start the websocket viewer
    #[arg(long)]
    websocket: bool,

    /// Websocket viewer address
    #[arg(long)]
    websocket_addr: Option<String>,
}

impl Cli {
    /// Flags win over file and environment; switches can only turn hosts on.
    fn apply(&self, config: &mut Config) {
        if let Some(addr) = &self.web_addr {
            config.web.bind_addr = addr.clone();
        }
        if let Some(addr) = &self.api_addr {
            config.api.bind_addr = addr.clone();
        }
        if let Some(addr) = &self.websocket_addr {
            config.websocket.bind_addr = addr.clone();
        }
        config.api.enabled |= self.api;
        config.console.enabled |= self.console;
        config.websocket.enabled |= self.websocket;
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let mut config: Config = match load_config(cli.config.as_ref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[FATAL] Failed to load config: {e}");
            process::exit(1);
        }
    };
    cli.apply(&mut config);

    if let Err(e) = run(config).await {
        eprintln!("[FATAL] stem crashed: {e:#}");
        process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let hub = Arc::new(Hub::new());
    let launcher = Launcher::new(Arc::clone(&hub), &config);

    let web = launcher.serve(&config.web.bind_addr).await?;
    launcher.sync(config.initial_status()).await;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    web.shutdown().await;
    launcher.shutdown().await;
    Ok(())
}
