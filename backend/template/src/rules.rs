//! Response rewrite rule cascade.
//!
//! Rules run strictly in list order against the current text; each rule sees
//! the output of the one before it, and no rule is skipped based on a later
//! rule's outcome.

use tracing::debug;

use crate::schema::{PostRule, RuleAction};

/// Apply the rule cascade to a completed response text.
pub fn apply(rules: &[PostRule], text: &str) -> String {
    let mut current = text.to_string();

    for (index, rule) in rules.iter().enumerate() {
        match rule.action {
            RuleAction::Replace => {
                let rewritten = rule.find.replace_all(&current, rule.replace.as_str());
                if rewritten != current {
                    debug!(rule = index + 1, pattern = %rule.find, "Replace rule changed content");
                }
                current = rewritten.into_owned();
            }
            RuleAction::JsonPayload => {
                // The first match's capture groups expand into the replace
                // template, which becomes the entire new text.
                if let Some(caps) = rule.find.captures(&current) {
                    let mut expanded = String::new();
                    caps.expand(&rule.replace, &mut expanded);
                    debug!(rule = index + 1, pattern = %rule.find, "Payload rule replaced content");
                    current = expanded;
                }
            }
        }
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn replace(find: &str, replace: &str) -> PostRule {
        PostRule {
            find: Regex::new(find).unwrap(),
            replace: replace.into(),
            action: RuleAction::Replace,
        }
    }

    fn payload(find: &str, replace: &str) -> PostRule {
        PostRule {
            find: Regex::new(find).unwrap(),
            replace: replace.into(),
            action: RuleAction::JsonPayload,
        }
    }

    #[test]
    fn replace_is_global() {
        let rules = vec![replace("cat", "dog")];
        assert_eq!(apply(&rules, "cat cat cat"), "dog dog dog");
    }

    #[test]
    fn replace_supports_backreferences() {
        let rules = vec![replace(r"(\w+)@(\w+)", "$2 at $1")];
        assert_eq!(apply(&rules, "alice@example"), "example at alice");
    }

    #[test]
    fn rules_cascade_in_order() {
        let rules = vec![replace("a", "b"), replace("b", "c")];
        assert_eq!(apply(&rules, "a"), "c");
    }

    #[test]
    fn payload_rule_consumes_the_rewritten_text() {
        let rules = vec![replace("foo", "bar"), payload("(?s).*", "{\"v\":\"$0\"}")];
        assert_eq!(apply(&rules, "foo baz"), "{\"v\":\"bar baz\"}");
    }

    #[test]
    fn payload_uses_first_match_only() {
        let rules = vec![payload(r"(\d+)", "num=$1")];
        assert_eq!(apply(&rules, "a 12 b 34"), "num=12");
    }

    #[test]
    fn payload_without_match_leaves_text_unchanged() {
        let rules = vec![payload("absent", "{}")];
        assert_eq!(apply(&rules, "hello"), "hello");
    }

    #[test]
    fn replace_rules_still_run_after_a_payload_fires() {
        let rules = vec![payload("(?s).*", "wrapped: $0"), replace("wrapped", "sealed")];
        assert_eq!(apply(&rules, "body"), "sealed: body");
    }

    #[test]
    fn no_match_replace_is_a_noop() {
        let rules = vec![replace("absent", "x")];
        assert_eq!(apply(&rules, "unchanged"), "unchanged");
    }
}
