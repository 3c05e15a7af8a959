//! PromptGate core types
//!
//! Wire types for the Chat Completions protocol, the backend trait seam, and
//! the upstream error taxonomy shared by the gateway and the HTTP client.

pub mod error;
pub mod message;
pub mod traits;

pub use error::UpstreamError;
pub use message::{
    AssistantMessage, ChatCompletion, ChatCompletionRequest, ChatMessage, Choice, ChunkChoice,
    Delta, GenerationDefaults, StreamChunk, UpstreamRequest,
};
pub use traits::{ByteStream, CompletionBackend};
