//! Structural fingerprints of markup fragments.
//!
//! A signature is the ordered list of `"{depth}:{tag}"` tokens for every opening
//! tag in a fragment. Attributes, class names and text never contribute, so two
//! skeletons that differ only in copy or styling produce the same signature.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

pub type Signature = Vec<String>;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"<\s*(/)?\s*([A-Za-z][A-Za-z0-9:-]*)[^>]*?(/)?\s*>")
            .unwrap_or_else(|err| panic!("tag pattern must compile: {err}"))
    })
}

fn comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->")
            .unwrap_or_else(|err| panic!("comment pattern must compile: {err}"))
    })
}

fn class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:^|[\s<])class(?:Name)?\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .unwrap_or_else(|err| panic!("class pattern must compile: {err}"))
    })
}

/// Extracts the depth-annotated tag sequence of `markup`.
///
/// Closing tags decrement depth (never below zero) and emit nothing. Unclosed
/// tags simply leave depth raised. Self-closing and void elements do not nest.
pub fn extract_signature(markup: &str) -> Signature {
    let mut depth: usize = 0;
    let mut tokens = Vec::new();
    let markup = comment_pattern().replace_all(markup, "");
    for caps in tag_pattern().captures_iter(&markup) {
        let closing = caps.get(1).is_some();
        let Some(name) = caps.get(2) else {
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        if closing {
            depth = depth.saturating_sub(1);
            continue;
        }
        tokens.push(format!("{depth}:{name}"));
        let self_closing = caps.get(3).is_some() || VOID_ELEMENTS.contains(&name.as_str());
        if !self_closing {
            depth += 1;
        }
    }
    tokens
}

/// Every whitespace-separated token of every `class` attribute in `markup`.
pub fn extract_class_tokens(markup: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for caps in class_pattern().captures_iter(markup) {
        let value = caps.get(1).or_else(|| caps.get(2));
        if let Some(value) = value {
            tokens.extend(value.as_str().split_whitespace().map(str::to_string));
        }
    }
    tokens
}
