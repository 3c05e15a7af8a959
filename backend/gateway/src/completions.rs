//! The chat-completions proxy endpoint.
//!
//! Only `model`, `messages`, and `stream` are honored from the caller's
//! body; generation parameters always come from server configuration. The
//! delivery mode is fixed per request from the caller's `stream` flag and
//! the fake-streaming setting, with no mid-request transitions.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::StreamExt;
use tracing::{error, info};

use promptgate_core::{ChatCompletionRequest, ChatMessage, UpstreamRequest};
use promptgate_template::render;

use crate::server::GatewayState;
use crate::sse::{data_frame, done_frame, error_payload};
use crate::streaming::{apply_rules_to_completion, fake_stream, relay_stream};
use crate::target::extract_target;

pub async fn chat_completions(
    State(state): State<GatewayState>,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(400, format!("invalid JSON request body: {rejection}"))
        }
    };

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let target = match extract_target(uri.path(), uri.query(), auth) {
        Ok(target) => target,
        Err(err) => return error_response(err.status(), err.to_string()),
    };

    if !request.ignored.is_empty() {
        let params: Vec<&str> = request.ignored.keys().map(String::as_str).collect();
        info!(
            params = %params.join(", "),
            "Ignoring caller parameters; configured generation defaults apply"
        );
    }

    let snapshot = state.templates.snapshot().await;
    let (history, user_input) = split_conversation(&request.messages);
    let template = snapshot.select(user_input);
    let messages = render(template, user_input, history, &mut rand::thread_rng());
    let post_rules = template.rules.clone();
    let generation = state.config.proxy.generation;

    if !request.stream {
        let upstream_request = UpstreamRequest {
            model: request.model,
            messages,
            stream: false,
            generation,
        };
        return match state
            .backend
            .complete(&target.url, &target.api_key, &upstream_request)
            .await
        {
            Ok(mut completion) => {
                apply_rules_to_completion(&mut completion, &post_rules);
                Json(completion).into_response()
            }
            Err(err) => {
                error!(error = %err, target = %target.url, "Buffered upstream call failed");
                error_response(err.client_status(), err.to_string())
            }
        };
    }

    if state.config.proxy.fake_streaming.enabled {
        // Simulated stream: the upstream call itself is non-streaming.
        let upstream_request = UpstreamRequest {
            model: request.model.clone(),
            messages,
            stream: false,
            generation,
        };
        let backend = state.backend.clone();
        let heartbeat =
            Duration::from_secs(state.config.proxy.fake_streaming.heartbeat_interval_secs);
        let upstream = async move {
            backend
                .complete(&target.url, &target.api_key, &upstream_request)
                .await
        };
        let stream = fake_stream(upstream, post_rules, request.model, heartbeat)
            .map(|frame| Ok::<_, Infallible>(Bytes::from(frame)));
        return sse_response(Body::from_stream(stream));
    }

    let upstream_request = UpstreamRequest {
        model: request.model,
        messages,
        stream: true,
        generation,
    };
    match state
        .backend
        .stream(&target.url, &target.api_key, &upstream_request)
        .await
    {
        Ok(bytes) => {
            let stream = relay_stream(bytes).map(Ok::<_, Infallible>);
            sse_response(Body::from_stream(stream))
        }
        Err(err) => {
            // The stream never opened upstream; the caller still gets a
            // well-formed SSE body with a terminal marker.
            error!(error = %err, target = %target.url, "Upstream stream failed to open");
            let mut frames = data_frame(&error_payload(&err));
            frames.push_str(&done_frame());
            sse_response(Body::from(frames))
        }
    }
}

/// Split the inbound conversation into prior history and the latest user
/// turn. A trailing non-user message means there is no current user input.
fn split_conversation(messages: &[ChatMessage]) -> (&[ChatMessage], &str) {
    match messages.split_last() {
        Some((last, rest)) if last.role == "user" => (rest, &last.content),
        _ => (messages, ""),
    }
}

fn sse_response(body: Body) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .expect("static SSE response headers are valid")
}

pub(crate) fn error_response(status: u16, message: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let payload = serde_json::json!({
        "error": {
            "message": message,
            "type": "proxy_error",
            "code": status.as_u16(),
        }
    });
    (status, Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use promptgate_core::{ByteStream, ChatCompletion, CompletionBackend, UpstreamError};
    use promptgate_template::{parse_template, TemplateSet, TemplateStore};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    struct StubBackend {
        completion: serde_json::Value,
        seen: Mutex<Vec<UpstreamRequest>>,
    }

    #[async_trait]
    impl CompletionBackend for StubBackend {
        async fn complete(
            &self,
            _target_url: &str,
            _api_key: &str,
            request: &UpstreamRequest,
        ) -> Result<ChatCompletion, UpstreamError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(serde_json::from_value(self.completion.clone()).unwrap())
        }

        async fn stream(
            &self,
            _target_url: &str,
            _api_key: &str,
            _request: &UpstreamRequest,
        ) -> Result<ByteStream, UpstreamError> {
            Err(UpstreamError::Network("no stream in stub".into()))
        }
    }

    fn state_with(backend: Arc<StubBackend>) -> GatewayState {
        let with_input = parse_template(
            r#"
- role: user
  content: "{{user_input}}"
- type: regex
  find: "foo"
  replace: "bar"
"#,
            Path::new("with_input.yaml"),
        )
        .unwrap();
        let set = TemplateSet {
            with_input,
            without_input: Default::default(),
        };
        GatewayState {
            config: Arc::new(Default::default()),
            templates: Arc::new(TemplateStore::from_set(set, "with.yaml", "without.yaml")),
            backend,
        }
    }

    fn stub(content: &str) -> Arc<StubBackend> {
        Arc::new(StubBackend {
            completion: serde_json::json!({
                "id": "c1", "object": "chat.completion", "created": 1, "model": "m",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": "stop"
                }]
            }),
            seen: Mutex::new(Vec::new()),
        })
    }

    async fn post(state: GatewayState, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer sk-test".parse().unwrap());
        let uri: Uri = "/https://api.example.com/v1/chat/completions"
            .parse()
            .unwrap();
        let request: ChatCompletionRequest = serde_json::from_value(body).unwrap();
        let response =
            chat_completions(State(state), uri, headers, Ok(Json(request))).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn trailing_user_message_is_the_current_input() {
        let messages = vec![
            ChatMessage::new("user", "old"),
            ChatMessage::new("assistant", "reply"),
            ChatMessage::new("user", "new"),
        ];
        let (history, input) = split_conversation(&messages);
        assert_eq!(history.len(), 2);
        assert_eq!(input, "new");
    }

    #[test]
    fn trailing_assistant_message_means_no_input() {
        let messages = vec![
            ChatMessage::new("user", "old"),
            ChatMessage::new("assistant", "reply"),
        ];
        let (history, input) = split_conversation(&messages);
        assert_eq!(history.len(), 2);
        assert_eq!(input, "");
    }

    #[tokio::test]
    async fn non_stream_request_renders_the_user_turn_verbatim() {
        let backend = stub("answer");
        let state = state_with(backend.clone());
        let (status, _) = post(
            state,
            serde_json::json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": false
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages, vec![ChatMessage::new("user", "hi")]);
        assert!(!seen[0].stream);
    }

    #[tokio::test]
    async fn caller_generation_parameters_are_replaced_by_defaults() {
        let backend = stub("answer");
        let state = state_with(backend.clone());
        let _ = post(
            state,
            serde_json::json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": false,
                "temperature": 0.123,
                "max_tokens": 7
            }),
        )
        .await;

        let seen = backend.seen.lock().unwrap();
        let body = serde_json::to_value(&seen[0]).unwrap();
        assert_eq!(body["temperature"], 1.0);
        assert_eq!(body["max_tokens"], 4096);
    }

    #[tokio::test]
    async fn non_stream_response_is_post_processed() {
        let backend = stub("foo baz");
        let state = state_with(backend);
        let (status, body) = post(
            state,
            serde_json::json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": false
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["choices"][0]["message"]["content"], "bar baz");
    }
}
