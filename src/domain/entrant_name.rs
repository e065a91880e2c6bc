use unicode_segmentation::UnicodeSegmentation;

use super::MISSING_FIELD;

/// The name someone signs up to the waitlist with. Surrounding whitespace is
/// trimmed; the result must be non-empty and at most 256 graphemes.
///
/// Unlike a name that ends up in HTML, commas and quotes are fine here (e.g.
/// `Smith, Jr.`); the log writer takes care of quoting them.
///
/// Must be instantiated with `EntrantName::parse`; the field is left private,
/// to prevent bypassing of `parse`, and mutation of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrantName(String);

impl EntrantName {
    pub fn parse(name: String) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("{MISSING_FIELD}: name"));
        }
        // graphemes, not bytes or chars: "é" may be 1 or 2 chars depending on
        // normalisation, but is always a single grapheme
        if name.graphemes(true).count() > 256 {
            return Err("name too long".to_string());
        }
        Ok(Self(name.to_string()))
    }
}

impl AsRef<str> for EntrantName {
    fn as_ref(&self) -> &str { &self.0 }
}
