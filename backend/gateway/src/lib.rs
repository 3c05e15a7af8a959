//! PromptGate Gateway HTTP server
//!
//! Serves the OpenAI-compatible proxy endpoint: target extraction, template
//! rendering, upstream dispatch, response post-processing, and the three
//! delivery modes (plain JSON, verbatim relay, simulated stream).

pub mod completions;
pub mod reload;
pub mod server;
pub mod sse;
pub mod streaming;
pub mod target;

pub use reload::spawn_template_watcher;
pub use server::{router, start_server, GatewayState};
