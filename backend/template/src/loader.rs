//! Template file loading and strict parsing.
//!
//! Malformed template files are load-time failures: at startup they abort the
//! process, on hot-reload the previous snapshot is kept.

use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::schema::{PostRule, PromptItem, PromptTemplate, RawItem, TypedItem};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template file {path} is not a list of template items: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid regex in rule #{index} of {path}: {source}")]
    Rule {
        path: PathBuf,
        index: usize,
        #[source]
        source: regex::Error,
    },
}

/// Parse template source text into prompt items and rewrite rules.
pub fn parse_template(src: &str, path: &Path) -> Result<PromptTemplate, TemplateError> {
    let raw: Vec<RawItem> = serde_yaml::from_str(src).map_err(|source| TemplateError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut items = Vec::new();
    let mut rules = Vec::new();
    for entry in raw {
        match entry {
            RawItem::Message { role, content } => {
                items.push(PromptItem::Message { role, content });
            }
            RawItem::Typed(TypedItem::History) => items.push(PromptItem::HistoryPlaceholder),
            RawItem::Typed(TypedItem::Regex {
                find,
                replace,
                action,
            }) => {
                let find = Regex::new(&find).map_err(|source| TemplateError::Rule {
                    path: path.to_path_buf(),
                    index: rules.len() + 1,
                    source,
                })?;
                rules.push(PostRule {
                    find,
                    replace,
                    action,
                });
            }
        }
    }

    Ok(PromptTemplate { items, rules })
}

/// Load and parse one template file from disk.
pub async fn load_template(path: &Path) -> Result<PromptTemplate, TemplateError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let template = parse_template(&raw, path)?;
    info!(
        path = %path.display(),
        items = template.items.len(),
        rules = template.rules.len(),
        "Loaded template"
    );
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuleAction;

    fn parse(src: &str) -> Result<PromptTemplate, TemplateError> {
        parse_template(src, Path::new("test.yaml"))
    }

    #[test]
    fn splits_items_and_rules_preserving_order() {
        let tpl = parse(
            r#"
- role: system
  content: "Be helpful."
- type: history
- role: user
  content: "{{user_input}}"
- type: regex
  find: "foo"
  replace: "bar"
- type: regex
  find: "(?s).*"
  replace: "{\"v\":\"$0\"}"
  action: json_payload
"#,
        )
        .unwrap();

        assert_eq!(tpl.items.len(), 3);
        assert_eq!(tpl.items[1], PromptItem::HistoryPlaceholder);
        assert_eq!(tpl.rules.len(), 2);
        assert_eq!(tpl.rules[0].action, RuleAction::Replace);
        assert_eq!(tpl.rules[1].action, RuleAction::JsonPayload);
    }

    #[test]
    fn action_defaults_to_replace() {
        let tpl = parse("- { type: regex, find: a, replace: b }").unwrap();
        assert_eq!(tpl.rules[0].action, RuleAction::Replace);
    }

    #[test]
    fn non_list_file_is_rejected() {
        let err = parse("role: system\ncontent: hi\n").unwrap_err();
        assert!(matches!(err, TemplateError::Parse { .. }));
    }

    #[test]
    fn invalid_rule_regex_is_rejected() {
        let err = parse("- { type: regex, find: \"(unclosed\", replace: x }").unwrap_err();
        match err {
            TemplateError::Rule { index, .. } => assert_eq!(index, 1),
            other => panic!("expected rule error, got {other}"),
        }
    }

    #[test]
    fn empty_list_is_a_valid_template() {
        let tpl = parse("[]").unwrap();
        assert!(tpl.items.is_empty());
        assert!(tpl.rules.is_empty());
    }
}
