//! Template rendering: turn a template variant, the caller's history, and
//! the latest user turn into the outbound message list.

use promptgate_core::ChatMessage;
use rand::Rng;
use tracing::debug;

use crate::schema::{PromptItem, PromptTemplate};
use crate::vars::{evaluate, RenderContext};

/// Render `template` against the caller's conversation.
///
/// Template items are walked in order: a message item is variable-evaluated
/// and appended; the history placeholder is replaced by `history` exactly as
/// given, with no evaluation of its contents. Messages left with empty
/// content are dropped, then adjacent same-role messages are merged.
pub fn render<R: Rng>(
    template: &PromptTemplate,
    user_input: &str,
    history: &[ChatMessage],
    rng: &mut R,
) -> Vec<ChatMessage> {
    let mut ctx = RenderContext::new(user_input);
    let mut messages = Vec::new();

    if template.items.is_empty() {
        // No template: forward the conversation unmodified.
        debug!("Template has no prompt items; passing conversation through");
        messages.extend(history.iter().cloned());
        if !user_input.trim().is_empty() {
            messages.push(ChatMessage::new("user", user_input));
        }
    } else {
        for item in &template.items {
            match item {
                PromptItem::HistoryPlaceholder => {
                    debug!(turns = history.len(), "Splicing caller history");
                    messages.extend(history.iter().cloned());
                }
                PromptItem::Message { role, content } => {
                    messages.push(ChatMessage::new(
                        role.clone(),
                        evaluate(content, &mut ctx, rng),
                    ));
                }
            }
        }

        // A template that never places the user's turn still must not drop
        // it: append it after the templated items.
        if !user_input.trim().is_empty() && !handles_user_input(template) {
            debug!("Template has no user_input slot; appending the user turn");
            messages.push(ChatMessage::new("user", user_input));
        }
    }

    messages.retain(|m| !m.content.is_empty());
    merge_adjacent(messages)
}

/// Whether any user-role item carries the `{{user_input}}` tag.
fn handles_user_input(template: &PromptTemplate) -> bool {
    template.items.iter().any(|item| {
        matches!(item, PromptItem::Message { role, content }
            if role == "user" && content.contains("{{user_input}}"))
    })
}

/// Merge runs of adjacent same-role messages, joining contents with a single
/// newline. The result never has two consecutive entries with the same role.
pub fn merge_adjacent(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut merged: Vec<ChatMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        match merged.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push('\n');
                last.content.push_str(&message.content);
            }
            _ => merged.push(message),
        }
    }
    merged
}
