use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::UpstreamError;
use crate::message::{ChatCompletion, UpstreamRequest};

/// Raw upstream SSE bytes, relayed to the caller without reframing.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// Seam between the gateway and the upstream HTTP client, so the presenter
/// can be exercised against a stub backend in tests.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issue a buffered (non-streaming) completion call.
    async fn complete(
        &self,
        target_url: &str,
        api_key: &str,
        request: &UpstreamRequest,
    ) -> Result<ChatCompletion, UpstreamError>;

    /// Issue a streaming completion call and hand back the upstream event
    /// bytes as they arrive.
    async fn stream(
        &self,
        target_url: &str,
        api_key: &str,
        request: &UpstreamRequest,
    ) -> Result<ByteStream, UpstreamError>;
}
