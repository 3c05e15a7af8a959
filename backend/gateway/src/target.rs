//! Target endpoint extraction.
//!
//! The inbound path embeds the real upstream endpoint:
//! `/https://api.example.com/v1/chat/completions`. The API key comes from the
//! `Authorization: Bearer` header, or from an `api_key` query parameter as a
//! fallback; the parameter is stripped before the URL is forwarded.

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("request path must embed the target endpoint: /http(s)://host/v1/chat/completions")]
    BadPath,

    #[error("missing API key: send 'Authorization: Bearer <key>' or '?api_key=<key>'")]
    MissingKey,
}

impl TargetError {
    pub fn status(&self) -> u16 {
        match self {
            TargetError::BadPath => 400,
            TargetError::MissingKey => 401,
        }
    }
}

/// The resolved upstream endpoint and credential for one request.
#[derive(Debug, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub api_key: String,
}

/// Resolve the upstream target from the request path, query string, and
/// Authorization header.
pub fn extract_target(
    path: &str,
    query: Option<&str>,
    auth_header: Option<&str>,
) -> Result<Target, TargetError> {
    if !(path.starts_with("/http://") || path.starts_with("/https://")) {
        return Err(TargetError::BadPath);
    }
    let mut url = path[1..].to_string();

    // Pull api_key out of the query; everything else is forwarded.
    let mut key_from_query = None;
    if let Some(query) = query {
        let mut forwarded = Vec::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some(("api_key", value)) => key_from_query = Some(value.to_string()),
                _ => forwarded.push(pair),
            }
        }
        if !forwarded.is_empty() {
            url.push('?');
            url.push_str(&forwarded.join("&"));
        }
    }

    let key_from_header = auth_header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    // The header wins over the query parameter.
    let api_key = key_from_header
        .or(key_from_query)
        .ok_or(TargetError::MissingKey)?;

    debug!(target = %url, "Resolved upstream target");
    Ok(Target { url, api_key })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_url_and_header_key() {
        let t = extract_target(
            "/https://api.example.com/v1/chat/completions",
            None,
            Some("Bearer sk-123"),
        )
        .unwrap();
        assert_eq!(t.url, "https://api.example.com/v1/chat/completions");
        assert_eq!(t.api_key, "sk-123");
    }

    #[test]
    fn api_key_query_param_is_a_fallback_and_is_stripped() {
        let t = extract_target(
            "/https://api.example.com/v1/chat/completions",
            Some("api_key=sk-q&version=2"),
            None,
        )
        .unwrap();
        assert_eq!(t.url, "https://api.example.com/v1/chat/completions?version=2");
        assert_eq!(t.api_key, "sk-q");
    }

    #[test]
    fn header_key_wins_over_query_key() {
        let t = extract_target(
            "/http://localhost:9000/v1/chat/completions",
            Some("api_key=sk-q"),
            Some("Bearer sk-h"),
        )
        .unwrap();
        assert_eq!(t.api_key, "sk-h");
    }

    #[test]
    fn non_embedded_path_is_rejected() {
        let err = extract_target("/v1/chat/completions", None, Some("Bearer k")).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn missing_key_is_unauthorized() {
        let err =
            extract_target("/https://api.example.com/v1/chat/completions", None, None).unwrap_err();
        assert_eq!(err.status(), 401);
    }
}
