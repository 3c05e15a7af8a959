use thiserror::Error;

/// Errors surfaced by an upstream completion call.
///
/// These are never retried automatically; the gateway maps them onto a
/// caller-visible status (or an SSE error event once a stream is open).
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out after {0}s")]
    Timeout(u64),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream network error: {0}")]
    Network(String),

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// HTTP status to relay to the caller for this failure.
    pub fn client_status(&self) -> u16 {
        match self {
            UpstreamError::Timeout(_) => 504,
            UpstreamError::Status { status, .. } => *status,
            UpstreamError::Network(_) | UpstreamError::Decode(_) => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_relay_upstream_code() {
        let err = UpstreamError::Status {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.client_status(), 429);
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        assert_eq!(UpstreamError::Timeout(60).client_status(), 504);
        assert_eq!(UpstreamError::Network("refused".into()).client_status(), 502);
    }
}
