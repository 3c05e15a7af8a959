use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single conversation turn in the Chat Completions wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Inbound request body. Only `model`, `messages`, and `stream` are honored;
/// everything else is collected into `ignored` so the handler can log what it
/// discarded, and is never forwarded upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(flatten)]
    pub ignored: serde_json::Map<String, serde_json::Value>,
}

/// Generation parameters always taken from server configuration, never from
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_tokens: 4096,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// The body sent to the upstream endpoint: the rendered conversation plus the
/// configured generation defaults.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(flatten)]
    pub generation: GenerationDefaults,
}

/// The assistant message inside a completed (non-streaming) choice.
/// Unknown fields (tool calls, annotations, ...) survive re-serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: AssistantMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A completed chat completion as returned by the upstream endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChatCompletion {
    /// Backfill the OpenAI standard fields some upstream endpoints omit.
    pub fn normalize(&mut self, fallback_model: &str) {
        if self.id.is_empty() {
            self.id = format!(
                "chatcmpl-proxy-{}-{}",
                Utc::now().timestamp(),
                &Uuid::new_v4().simple().to_string()[..8]
            );
        }
        if self.object.is_empty() {
            self.object = "chat.completion".into();
        }
        if self.created == 0 {
            self.created = Utc::now().timestamp() as u64;
        }
        if self.model.is_empty() {
            self.model = fallback_model.into();
        }
    }
}

/// An incremental delta inside a simulated stream chunk.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

/// A `chat.completion.chunk` object as emitted on simulated streams.
#[derive(Debug, Clone, Serialize)]
pub struct StreamChunk {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

impl StreamChunk {
    pub fn new(id: impl Into<String>, model: impl Into<String>, choice: ChunkChoice) -> Self {
        Self {
            id: id.into(),
            object: "chat.completion.chunk".into(),
            created: Utc::now().timestamp() as u64,
            model: model.into(),
            choices: vec![choice],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_request_collects_unknown_fields() {
        let body = serde_json::json!({
            "model": "m",
            "messages": [{"role": "user", "content": "hi"}],
            "stream": false,
            "temperature": 0.2,
            "max_tokens": 10
        });
        let req: ChatCompletionRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.model, "m");
        assert!(!req.stream);
        assert!(req.ignored.contains_key("temperature"));
        assert!(req.ignored.contains_key("max_tokens"));
    }

    #[test]
    fn upstream_request_carries_configured_defaults() {
        let req = UpstreamRequest {
            model: "m".into(),
            messages: vec![ChatMessage::new("user", "hi")],
            stream: false,
            generation: GenerationDefaults {
                temperature: 0.7,
                ..Default::default()
            },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["temperature"], 0.7);
        assert_eq!(v["max_tokens"], 4096);
        assert_eq!(v["top_p"], 1.0);
        assert!(v.get("stream").is_some());
    }

    #[test]
    fn completion_normalize_backfills_missing_fields() {
        let mut completion: ChatCompletion = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        }))
        .unwrap();
        completion.normalize("fallback-model");
        assert!(completion.id.starts_with("chatcmpl-proxy-"));
        assert_eq!(completion.object, "chat.completion");
        assert!(completion.created > 0);
        assert_eq!(completion.model, "fallback-model");
    }

    #[test]
    fn completion_roundtrip_preserves_unknown_fields() {
        let v = serde_json::json!({
            "id": "x", "object": "chat.completion", "created": 1, "model": "m",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "ok"}, "finish_reason": "stop"}],
            "usage": {"total_tokens": 5}
        });
        let completion: ChatCompletion = serde_json::from_value(v.clone()).unwrap();
        let back = serde_json::to_value(&completion).unwrap();
        assert_eq!(back["usage"]["total_tokens"], 5);
    }
}
