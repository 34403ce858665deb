use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    /// First author token: at least two word characters
    pub static ref AUTHOR_PATTERN: Regex = Regex::new(r"\w{2,}").unwrap();

    /// Fallback year: first four consecutive digits anywhere in the date text
    pub static ref YEAR_PATTERN: Regex = Regex::new(r"\d{4}").unwrap();

    /// First significant title word: at least four word characters
    pub static ref TITLE_WORD_PATTERN: Regex = Regex::new(r"\w{4,}").unwrap();
}

/// Citation identifier of the form `@<author><year><title-word>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Year component: the whole string as an integer if it parses,
/// otherwise the first four-digit run, otherwise empty.
pub fn year_token(date: &str) -> String {
    if let Some(year) = normalize_integer(date.trim()) {
        return year;
    }
    YEAR_PATTERN
        .find(date)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Canonical decimal form of an integer literal of any length: sign kept,
/// leading zeros dropped. `None` when `text` is not an integer.
fn normalize_integer(text: &str) -> Option<String> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let significant = digits.trim_start_matches('0');
    Some(match significant {
        "" => "0".to_string(),
        s if negative => format!("-{}", s),
        s => s.to_string(),
    })
}

/// Lowercased first run of two or more word characters
pub fn author_token(author: &str) -> String {
    AUTHOR_PATTERN
        .find(author)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default()
}

/// Lowercased first run of four or more word characters
pub fn title_token(title: &str) -> String {
    TITLE_WORD_PATTERN
        .find(title)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default()
}

/// Derive the identifier for a cited work from free-text metadata.
///
/// Never fails: components that cannot be found are left empty, so the
/// degenerate result is `"@"`. Distinct works sharing first author, year
/// and first significant title word map to the same identifier.
pub fn identify(author: &str, year: &str, title: &str) -> Identifier {
    Identifier(format!(
        "@{}{}{}",
        author_token(author),
        year_token(year),
        title_token(title)
    ))
}
