use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;

use promptgate_core::{ByteStream, ChatCompletion, CompletionBackend, UpstreamError, UpstreamRequest};

/// HTTP client for the target OpenAI-compatible endpoint.
///
/// One instance is shared across all requests; the per-request target URL and
/// API key arrive with each call since the proxy addresses arbitrary
/// upstreams.
pub struct UpstreamClient {
    http: Client,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self {
            http,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout.as_secs())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionBackend for UpstreamClient {
    async fn complete(
        &self,
        target_url: &str,
        api_key: &str,
        request: &UpstreamRequest,
    ) -> Result<ChatCompletion, UpstreamError> {
        debug!(target = %target_url, model = %request.model, "Sending buffered upstream request");

        let response = self
            .http
            .post(target_url)
            .bearer_auth(api_key)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut completion: ChatCompletion = response.json().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(self.timeout.as_secs())
            } else {
                UpstreamError::Decode(e.to_string())
            }
        })?;
        completion.normalize(&request.model);
        Ok(completion)
    }

    async fn stream(
        &self,
        target_url: &str,
        api_key: &str,
        request: &UpstreamRequest,
    ) -> Result<ByteStream, UpstreamError> {
        debug!(target = %target_url, model = %request.model, "Opening upstream event stream");

        let response = self
            .http
            .post(target_url)
            .bearer_auth(api_key)
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let timeout_secs = self.timeout.as_secs();
        let bytes = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout(timeout_secs)
                } else {
                    UpstreamError::Network(e.to_string())
                }
            })
        });
        Ok(Box::pin(bytes))
    }
}
