//! SSE framing and simulated chunk payloads.
//!
//! Frames are built as raw `data: ...\n\n` strings so the verbatim relay and
//! the synthesized streams share one response shape, and the terminal
//! `data: [DONE]` marker is byte-exact for OpenAI-compatible clients.

use chrono::Utc;
use promptgate_core::{ChatCompletion, ChunkChoice, Delta, StreamChunk, UpstreamError};
use serde::Serialize;
use uuid::Uuid;

/// One SSE data frame.
pub fn data_frame(payload: &impl Serialize) -> String {
    let json = serde_json::to_string(payload).expect("SSE payload serializes to JSON");
    format!("data: {json}\n\n")
}

/// The terminal marker every stream ends with.
pub fn done_frame() -> String {
    "data: [DONE]\n\n".to_string()
}

/// An empty-delta chunk keeping the connection alive while the buffered
/// upstream call is in flight.
pub fn heartbeat_chunk(model: &str) -> StreamChunk {
    StreamChunk::new(
        format!("chatcmpl-hb-{}", Utc::now().timestamp()),
        model,
        ChunkChoice {
            index: 0,
            delta: Delta {
                role: None,
                content: Some(String::new()),
            },
            finish_reason: None,
        },
    )
}

/// Split a completed response into the simulated delta frames: role, then
/// content, then finish reason — each only if present.
pub fn delta_frames(completion: &ChatCompletion) -> Vec<String> {
    let Some(choice) = completion.choices.first() else {
        // Shape we can't split; forward the whole object as one event.
        return vec![data_frame(completion)];
    };

    let id = if completion.id.is_empty() {
        format!("chatcmpl-sim-{}", Uuid::new_v4().simple())
    } else {
        completion.id.clone()
    };
    let mut frames = Vec::with_capacity(3);

    if !choice.message.role.is_empty() {
        frames.push(data_frame(&StreamChunk::new(
            id.clone(),
            completion.model.as_str(),
            ChunkChoice {
                index: 0,
                delta: Delta {
                    role: Some(choice.message.role.clone()),
                    content: None,
                },
                finish_reason: None,
            },
        )));
    }

    if let Some(content) = &choice.message.content {
        frames.push(data_frame(&StreamChunk::new(
            id.clone(),
            completion.model.as_str(),
            ChunkChoice {
                index: 0,
                delta: Delta {
                    role: None,
                    content: Some(content.clone()),
                },
                finish_reason: None,
            },
        )));
    }

    if let Some(finish_reason) = &choice.finish_reason {
        frames.push(data_frame(&StreamChunk::new(
            id,
            completion.model.as_str(),
            ChunkChoice {
                index: 0,
                delta: Delta::default(),
                finish_reason: Some(finish_reason.clone()),
            },
        )));
    }

    frames
}

/// The error event emitted when a stream must fail after it has opened.
pub fn error_payload(err: &UpstreamError) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "message": err.to_string(),
            "code": err.client_status(),
            "type": "upstream_error",
        }
    })
}
