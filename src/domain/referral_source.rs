use std::fmt::Display;

use super::MISSING_FIELD;

/// How the entrant heard about us; mirrors the options offered by the sign-up
/// form (see `routes/home/home.html`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralSource {
    Search,
    Social,
    Friend,
    Blog,
    Newsletter,
    Conference,
    Other,
}

impl ReferralSource {
    pub const ALL: [ReferralSource; 7] = [
        Self::Search,
        Self::Social,
        Self::Friend,
        Self::Blog,
        Self::Newsletter,
        Self::Conference,
        Self::Other,
    ];

    pub fn parse(source: String) -> Result<Self, String> {
        let source = source.trim();
        if source.is_empty() {
            return Err(format!("{MISSING_FIELD}: source"));
        }
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(source))
            .ok_or("unknown referral source".to_string())
    }

    /// The value written to the log, identical to the form's `<option value>`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Social => "social",
            Self::Friend => "friend",
            Self::Blog => "blog",
            Self::Newsletter => "newsletter",
            Self::Conference => "conference",
            Self::Other => "other",
        }
    }
}

impl Display for ReferralSource {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
