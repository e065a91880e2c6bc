mod entrant_email;
mod entrant_name;
mod new_entry;
mod referral_source;
mod waitlist_entry;
// allow external `use` statements to skip `new_entry` etc
pub use entrant_email::EntrantEmail;
pub use entrant_name::EntrantName;
pub use new_entry::NewEntry;
pub use referral_source::ReferralSource;
pub use waitlist_entry::WaitlistEntry;

/// Prefix of every "field absent or blank" parse error, followed by `: <field>`
pub const MISSING_FIELD: &str = "missing required field";
pub const INVALID_EMAIL: &str = "invalid email format";
