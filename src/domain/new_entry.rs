use super::EntrantEmail;
use super::EntrantName;
use super::ReferralSource;

/// A parsed waitlist candidate. Holding one means every field has already
/// been validated and normalised; all that is left is the duplicate check.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub name: EntrantName,
    pub email: EntrantEmail,
    pub source: ReferralSource,
    /// Free text, trimmed, possibly empty
    pub message: String,
}
