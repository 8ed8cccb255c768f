use anyhow::{Result, anyhow};

/// Language utilities for the supported translation directions
///
/// The tool works with a fixed table of languages. A code is valid only if
/// it appears in this table; its display name is what the model sees in the
/// translation prompt.
pub const LANGUAGES: [(&str, &str); 20] = [
    ("en", "English"),
    ("zh", "Chinese"),
    ("hi", "Hindi"),
    ("es", "Spanish"),
    ("ar", "Arabic"),
    ("bn", "Bengali"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("vi", "Vietnamese"),
    ("ko", "Korean"),
    ("id", "Indonesian"),
    ("fr", "French"),
    ("de", "German"),
    ("tr", "Turkish"),
    ("it", "Italian"),
    ("th", "Thai"),
    ("pl", "Polish"),
    ("uk", "Ukrainian"),
    ("nl", "Dutch"),
];

/// Look up the display name of a language code
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Check if a code is in the language table
pub fn is_supported(code: &str) -> bool {
    language_name(code).is_some()
}

/// Get the language name from a code, failing on unknown codes
pub fn get_language_name(code: &str) -> Result<String> {
    language_name(code)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Unsupported language code: {} (expected one of: {})", code, supported_codes().join(", ")))
}

/// Resolve a translation direction into both display names
pub fn resolve_direction(source: &str, target: &str) -> Option<(&'static str, &'static str)> {
    Some((language_name(source)?, language_name(target)?))
}

/// All supported codes, in table order
pub fn supported_codes() -> Vec<&'static str> {
    LANGUAGES.iter().map(|(code, _)| *code).collect()
}

/// Help text listing every code with its name, e.g. "en: English, zh: Chinese"
pub fn language_help() -> String {
    LANGUAGES
        .iter()
        .map(|(code, name)| format!("{}: {}", code, name))
        .collect::<Vec<_>>()
        .join(", ")
}
