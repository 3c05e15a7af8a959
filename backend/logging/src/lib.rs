//! Structured logging setup for PromptGate.

pub mod logger;

pub use logger::init_logger;
