use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Directives used when `RUST_LOG` is unset: hub and host events at debug,
/// everything else (hyper, tower-http) at info.
pub const DEFAULT_DIRECTIVES: &str = "info,stem=debug";

/// `RUST_LOG` when present and valid, otherwise [`DEFAULT_DIRECTIVES`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Installs the global subscriber with a compact, UTC-timestamped formatter.
pub fn init_logging() {
    let formatting_layer = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_thread_names(true)
        .with_target(true)
        .compact();

    let subscriber = Registry::default().with(env_filter()).with(formatting_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[WARN] tracing subscriber already installed: {e}");
    }
}
