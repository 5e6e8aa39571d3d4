// Label normalization

use once_cell::sync::Lazy;
use regex::Regex;

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("camel-case boundary pattern is valid"));

/// Normalized label form: `_` and `-` become spaces, lower-to-upper
/// camel-case boundaries are split, and the result is lowercased.
pub fn normalize_label(text: &str) -> String {
    let spaced = text.replace(['_', '-'], " ");
    CAMEL_BOUNDARY
        .replace_all(&spaced, "$1 $2")
        .to_lowercase()
}

/// True when the literal text differs from its normalized form
pub fn is_shadow(text: &str) -> bool {
    normalize_label(text) != text
}
