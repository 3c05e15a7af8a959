//! `promptgate-template` — prompt template machinery.
//!
//! Loads the two template variants from YAML, evaluates `{{ ... }}` dynamic
//! variable tags, renders the outbound message list around the caller's
//! conversation, and applies the response rewrite rule cascade.

pub mod loader;
pub mod render;
pub mod rules;
pub mod schema;
pub mod store;
pub mod vars;

pub use loader::{load_template, parse_template, TemplateError};
pub use render::{merge_adjacent, render};
pub use schema::{PostRule, PromptItem, PromptTemplate, RuleAction};
pub use rules::apply;
pub use store::{TemplateSet, TemplateStore};
pub use vars::{evaluate, RenderContext};
