use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::NewEntry;

/// A row of the waitlist log, i.e. a `NewEntry` that has been accepted and
/// stamped.
///
/// Field order is the column order of the log:
/// `Name,Email,Source,Message,Timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WaitlistEntry {
    pub name: String,
    pub email: String,
    pub source: String,
    pub message: String,
    pub timestamp: String,
}

impl WaitlistEntry {
    pub const HEADER: [&'static str; 5] = ["Name", "Email", "Source", "Message", "Timestamp"];

    /// Stamp an accepted entry. The timestamp is ISO-8601 in UTC with
    /// millisecond precision (`2024-05-01T12:00:00.000Z`).
    pub fn stamp(
        new_entry: &NewEntry,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: new_entry.name.as_ref().to_string(),
            email: new_entry.email.as_ref().to_string(),
            source: new_entry.source.as_str().to_string(),
            message: new_entry.message.clone(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
