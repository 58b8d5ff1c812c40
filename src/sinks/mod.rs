//! Subscriber sinks: collaborators that register with the hub and render
//! what it delivers.
//!
//! - `console`   – prints every message to a text stream
//! - `websocket` – pushes every message to browser viewers

pub mod console;
pub mod websocket;

pub use console::Console;
pub use websocket::WebSocketHost;
