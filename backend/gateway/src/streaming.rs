//! Streaming presentation.
//!
//! The simulated stream drives the buffered upstream call from inside the
//! response stream's own state, so dropping the response (client disconnect)
//! cancels the upstream call with it. Heartbeats and data events are emitted
//! strictly in generation order.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use promptgate_core::{ByteStream, ChatCompletion, UpstreamError};
use promptgate_template::{rules, PostRule};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::sse::{data_frame, delta_frames, done_frame, error_payload, heartbeat_chunk};

type CompletionFuture =
    Pin<Box<dyn Future<Output = Result<ChatCompletion, UpstreamError>> + Send>>;

enum FakeState {
    Waiting {
        upstream: CompletionFuture,
        ticker: Interval,
        model: String,
        rules: Vec<PostRule>,
    },
    Draining(VecDeque<String>),
}

/// Present a buffered upstream call as a simulated event stream: heartbeats
/// while the call is in flight, then the post-processed result as role /
/// content / finish deltas, then the terminal marker. A failed call emits an
/// error event in place of the payload; the terminal marker is sent either
/// way.
pub fn fake_stream<F>(
    upstream: F,
    post_rules: Vec<PostRule>,
    model: String,
    heartbeat: Duration,
) -> impl Stream<Item = String> + Send
where
    F: Future<Output = Result<ChatCompletion, UpstreamError>> + Send + 'static,
{
    // First tick one full interval from now, not immediately.
    let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let initial = FakeState::Waiting {
        upstream: Box::pin(upstream),
        ticker,
        model,
        rules: post_rules,
    };

    stream::unfold(Some(initial), |state| async move {
        match state? {
            FakeState::Waiting {
                mut upstream,
                mut ticker,
                model,
                rules,
            } => {
                tokio::select! {
                    biased;
                    result = upstream.as_mut() => {
                        let mut frames: VecDeque<String> = match result {
                            Ok(mut completion) => {
                                apply_rules_to_completion(&mut completion, &rules);
                                delta_frames(&completion).into()
                            }
                            Err(err) => {
                                warn!(error = %err, "Buffered upstream call failed mid-simulated-stream");
                                VecDeque::from([data_frame(&error_payload(&err))])
                            }
                        };
                        frames.push_back(done_frame());
                        let first = frames.pop_front()?;
                        Some((first, Some(FakeState::Draining(frames))))
                    }
                    _ = ticker.tick() => {
                        debug!("Emitting simulated-stream heartbeat");
                        let frame = data_frame(&heartbeat_chunk(&model));
                        Some((frame, Some(FakeState::Waiting { upstream, ticker, model, rules })))
                    }
                }
            }
            FakeState::Draining(mut frames) => {
                let next = frames.pop_front()?;
                Some((next, Some(FakeState::Draining(frames))))
            }
        }
    })
}

/// Relay an upstream event stream to the caller byte-for-byte. An upstream
/// error terminates the relay with an error event and the terminal marker;
/// a clean upstream end carries the upstream's own marker through.
pub fn relay_stream(upstream: ByteStream) -> impl Stream<Item = Bytes> + Send {
    stream::unfold(Some(upstream), |state| async move {
        let mut upstream = state?;
        match upstream.next().await {
            Some(Ok(chunk)) => Some((chunk, Some(upstream))),
            Some(Err(err)) => {
                warn!(error = %err, "Upstream stream failed; closing relay");
                let mut tail = data_frame(&error_payload(&err));
                tail.push_str(&done_frame());
                Some((Bytes::from(tail), None))
            }
            None => None,
        }
    })
}

/// Run the rewrite cascade over the message content of every choice.
pub fn apply_rules_to_completion(completion: &mut ChatCompletion, post_rules: &[PostRule]) {
    if post_rules.is_empty() {
        return;
    }
    for choice in &mut completion.choices {
        if let Some(content) = &choice.message.content {
            let rewritten = rules::apply(post_rules, content);
            if &rewritten != content {
                debug!(choice = choice.index, "Rewrite rules changed assistant content");
                choice.message.content = Some(rewritten);
            }
        }
    }
}
