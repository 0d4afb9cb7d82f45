//! Redaction applied to every payload before it is persisted
//!
//! A string is replaced with [`REDACTION_MARKER`] when it is longer than
//! [`MAX_PLAIN_LEN`] characters or carries a secret-like prefix at a word
//! boundary. Objects and arrays are walked recursively; keys, numbers,
//! booleans and nulls are kept.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Strings longer than this many characters are redacted
pub const MAX_PLAIN_LEN: usize = 80;

/// Replacement for redacted strings
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Prefixes that mark a value as a credential
pub const SECRET_PREFIXES: &[&str] = &[
    "sk-",
    "sk_",
    "ghp_",
    "gho_",
    "github_pat_",
    "glpat-",
    "xoxb-",
    "xoxp-",
    "AKIA",
    "AIza",
    "Bearer ",
    "-----BEGIN",
];

static SECRET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = SECRET_PREFIXES
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?:^|[^A-Za-z0-9])(?:{alternatives})"))
        .expect("SECRET_PATTERN is built from constant prefixes")
});

/// Whether a single string must be redacted
#[must_use]
pub fn is_sensitive(s: &str) -> bool {
    s.chars().count() > MAX_PLAIN_LEN || SECRET_PATTERN.is_match(s)
}

/// Redact a payload recursively
#[must_use]
pub fn redact(value: Value) -> Value {
    match value {
        Value::String(s) if is_sensitive(&s) => Value::String(REDACTION_MARKER.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, redact(v))).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests;
