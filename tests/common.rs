#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

/// Upper bound for anything that is expected to happen.
pub const WAIT: Duration = Duration::from_secs(2);
/// How long to watch for something that must not happen.
pub const QUIET: Duration = Duration::from_millis(100);

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        stem::logging::init_logging();
    });
}
