//! Dynamic variable evaluation.
//!
//! Template fragments may contain `{{ ... }}` tags. A fragment is scanned
//! left to right and each tag is replaced in place, so a `setvar` earlier in
//! a fragment is visible to a `getvar` later in the same fragment — and in
//! any fragment evaluated after it, since fragments are processed in
//! template order.
//!
//! Malformed tags (a recognized tag name with bad arguments) are left in the
//! output as literal text and logged; unknown tags pass through untouched.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use tracing::{debug, warn};

/// Per-request evaluation state. Created empty for each inbound request and
/// dropped with it; never shared across requests.
#[derive(Debug)]
pub struct RenderContext<'a> {
    user_input: &'a str,
    variables: HashMap<String, String>,
}

impl<'a> RenderContext<'a> {
    pub fn new(user_input: &'a str) -> Self {
        Self {
            user_input,
            variables: HashMap::new(),
        }
    }

    pub fn user_input(&self) -> &str {
        self.user_input
    }
}

/// The closed set of recognized tags.
#[derive(Debug, PartialEq)]
enum Tag<'a> {
    UserInput,
    Roll { dice: u32, sides: u32 },
    Random(Vec<&'a str>),
    SetVar { name: &'a str, value: &'a str },
    GetVar(&'a str),
}

static ROLL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^roll\s*(\d+)\s*d\s*(\d+)\s*$").expect("roll pattern is valid")
});

/// Evaluate every tag in `fragment`, returning the substituted text.
pub fn evaluate<R: Rng>(fragment: &str, ctx: &mut RenderContext<'_>, rng: &mut R) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;

    while let Some((start, end, inner)) = next_tag(rest) {
        out.push_str(&rest[..start]);
        match parse_tag(inner) {
            Some(tag) => out.push_str(&apply_tag(tag, ctx, rng)),
            // Literal fallback: the raw tag text stays visible.
            None => out.push_str(&rest[start..end]),
        }
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

/// Find the next `{{ ... }}` span in `s`, honoring nested brace pairs so a
/// `setvar` value may itself contain tags. Returns byte offsets of the tag
/// and the text between the delimiters.
fn next_tag(s: &str) -> Option<(usize, usize, &str)> {
    let bytes = s.as_bytes();
    let start = s.find("{{")?;

    let mut depth = 1usize;
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'}' && bytes[i + 1] == b'}' {
            depth -= 1;
            if depth == 0 {
                return Some((start, i + 2, &s[start + 2..i]));
            }
            i += 2;
        } else {
            i += 1;
        }
    }

    // Unterminated tag: everything from the opener is literal text.
    None
}

/// Parse the text between `{{` and `}}` into a tag. `None` means the span is
/// either unknown (silent passthrough) or malformed (logged passthrough).
fn parse_tag(inner: &str) -> Option<Tag<'_>> {
    let trimmed = inner.trim();

    if trimmed == "user_input" {
        return Some(Tag::UserInput);
    }

    if let Some(caps) = ROLL.captures(trimmed) {
        let dice: Option<u32> = caps[1].parse().ok();
        let sides: Option<u32> = caps[2].parse().ok();
        return match (dice, sides) {
            (Some(dice), Some(sides)) if dice >= 1 && sides >= 1 => {
                Some(Tag::Roll { dice, sides })
            }
            _ => {
                warn!(tag = %trimmed, "Roll tag needs positive dice count and sides; left as literal");
                None
            }
        };
    }
    if trimmed.strip_prefix("roll").is_some_and(|r| r.starts_with(char::is_whitespace)) {
        warn!(tag = %trimmed, "Malformed roll tag; left as literal");
        return None;
    }

    if let Some(args) = trimmed.strip_prefix("random::") {
        let options: Vec<&str> = args.split("::").filter(|o| !o.is_empty()).collect();
        if options.is_empty() {
            warn!(tag = %trimmed, "Random tag has no options; left as literal");
            return None;
        }
        return Some(Tag::Random(options));
    }

    if let Some(args) = trimmed.strip_prefix("setvar::") {
        return match args.split_once("::") {
            Some((name, value)) if !name.trim().is_empty() => Some(Tag::SetVar {
                name: name.trim(),
                value,
            }),
            _ => {
                warn!(tag = %trimmed, "Setvar tag needs a name and a value; left as literal");
                None
            }
        };
    }

    if let Some(name) = trimmed.strip_prefix("getvar::") {
        let name = name.trim();
        if name.is_empty() {
            warn!(tag = %trimmed, "Getvar tag needs a name; left as literal");
            return None;
        }
        return Some(Tag::GetVar(name));
    }

    None
}

fn apply_tag<R: Rng>(tag: Tag<'_>, ctx: &mut RenderContext<'_>, rng: &mut R) -> String {
    match tag {
        Tag::UserInput => ctx.user_input.to_string(),
        Tag::Roll { dice, sides } => {
            let total: u64 = (0..dice).map(|_| rng.gen_range(1..=sides) as u64).sum();
            debug!(dice, sides, total, "Resolved roll tag");
            total.to_string()
        }
        Tag::Random(options) => {
            let chosen = options[rng.gen_range(0..options.len())];
            debug!(chosen, "Resolved random tag");
            chosen.to_string()
        }
        Tag::SetVar { name, value } => {
            // The value is evaluated before storing, so nested tags resolve
            // at set time and the variable holds plain text.
            let value = evaluate(value, ctx, rng);
            ctx.variables.insert(name.to_string(), value);
            String::new()
        }
        Tag::GetVar(name) => ctx.variables.get(name).cloned().unwrap_or_default(),
    }
}
