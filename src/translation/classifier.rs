/*!
 * Text classification.
 *
 * Decides which raw cell or shape texts are worth sending to the model:
 * blanks, one-character strings, numbers and formulas stay untouched.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// @const: Digits, whitespace, commas, periods and hyphens only
static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\d\s,.-]+$").unwrap()
});

/// Collapse whitespace runs into single spaces and trim both ends
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check if a raw text unit should be translated
pub fn is_translatable(raw: &str) -> bool {
    let text = normalize(raw);
    if text.chars().count() < 2 {
        return false;
    }
    if NUMERIC_REGEX.is_match(&text) {
        return false;
    }
    if text.starts_with('=') {
        return false;
    }
    true
}
