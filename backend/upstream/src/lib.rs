//! `promptgate-upstream` — reqwest-backed [`CompletionBackend`] for the
//! target OpenAI-compatible endpoint: one buffered call, one event-stream
//! call, with timeout and protocol-error mapping.

pub mod client;

pub use client::UpstreamClient;
