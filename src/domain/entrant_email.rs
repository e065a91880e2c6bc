use once_cell::sync::Lazy;
use regex::Regex;

use super::INVALID_EMAIL;
use super::MISSING_FIELD;

// something, an @, something, a dot, something; no whitespace anywhere, and
// exactly one @
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));

/// A normalised (trimmed, lower-cased) email address. Two addresses that
/// differ only in casing or surrounding whitespace parse to the same value,
/// which is what uniqueness in the waitlist log is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntrantEmail(String);

impl EntrantEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        let email = Self::normalise(&email);
        if email.is_empty() {
            return Err(format!("{MISSING_FIELD}: email"));
        }
        EMAIL_SHAPE
            .is_match(&email)
            .then_some(Self(email))
            .ok_or(INVALID_EMAIL.to_string())
    }

    /// Normalisation without validation; used when reading back rows that
    /// were written before validation existed.
    pub fn normalise(raw: &str) -> String { raw.trim().to_lowercase() }
}

impl AsRef<str> for EntrantEmail {
    fn as_ref(&self) -> &str { &self.0 }
}
