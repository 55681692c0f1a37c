use std::borrow::Cow;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

static PATH_SPECIALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s&']").expect("path escape pattern is valid"));
static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n]+").expect("line break pattern is valid"));

/// Backslash-escapes every whitespace character, `&` and `'` in place.
///
/// Paths that are not valid UTF-8 are converted lossily first.
pub fn escape_path(path: &Path) -> String {
    escape_shell_word(&path.to_string_lossy()).into_owned()
}

pub fn escape_shell_word(word: &str) -> Cow<'_, str> {
    PATH_SPECIALS.replace_all(word, r"\$0")
}

/// Collapses each run of line breaks into a single space and escapes `'`.
pub fn escape_value(value: &str) -> String {
    LINE_BREAKS.replace_all(value, " ").replace('\'', r"\'")
}
