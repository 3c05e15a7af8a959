//! Template file wire format.
//!
//! A template file is a top-level YAML list. Each entry is one of:
//! - `{ role, content }` — a literal prompt turn,
//! - `{ type: history }` — the splice point for the caller's prior turns,
//! - `{ type: regex, find, replace, action }` — a response rewrite rule
//!   (`action` defaults to `replace`).
//!
//! Prompt items and rules share the file so a template author controls both
//! sides of a persona in one place; loading splits them while preserving
//! relative order within each list.

use regex::Regex;
use serde::Deserialize;

/// A request-side template item, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptItem {
    /// A literal turn; `content` may contain variable tags.
    Message { role: String, content: String },
    /// Replaced by the caller's prior conversation turns, verbatim.
    HistoryPlaceholder,
}

/// What a matching rule does to the response text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Global find/replace with `$n` back-references.
    Replace,
    /// Replace the whole text with `replace` expanded from the first match.
    JsonPayload,
}

/// One response rewrite rule. Rules run as an unconditional cascade in list
/// order; there is no short-circuit.
#[derive(Debug, Clone)]
pub struct PostRule {
    pub find: Regex,
    pub replace: String,
    pub action: RuleAction,
}

/// One loaded template variant: the ordered prompt items plus the response
/// rules that were declared alongside them.
#[derive(Debug, Clone, Default)]
pub struct PromptTemplate {
    pub items: Vec<PromptItem>,
    pub rules: Vec<PostRule>,
}

impl Default for RuleAction {
    fn default() -> Self {
        RuleAction::Replace
    }
}

/// Raw deserialization shape for one list entry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawItem {
    Typed(TypedItem),
    Message { role: String, content: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum TypedItem {
    History,
    Regex {
        find: String,
        replace: String,
        #[serde(default)]
        action: RuleAction,
    },
}
