mod csv_log;
use std::fmt::Debug;

use async_trait::async_trait;
pub use csv_log::CsvLog;

use crate::domain::NewEntry;
use crate::domain::WaitlistEntry;
use crate::routes::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum StoreError {
    /// Holds the normalised email that was already present
    #[error("email already present: {0}")]
    Duplicate(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl Debug for StoreError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Durable, append-only, unique-by-email storage for waitlist entries.
///
/// The duplicate check and the append are a single operation: two concurrent
/// submissions with the same email must never both pass the check.
/// Implementations serialise `append_if_absent` calls against the same
/// backing storage.
///
/// Used as `web::Data<dyn RecordStore>`, hence `async_trait` (a plain `async
/// fn` in a trait is not object safe).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stamp `new_entry` and persist it, unless an entry with the same
    /// normalised email already exists, in which case nothing is written and
    /// `StoreError::Duplicate` is returned. On any other failure the backing
    /// storage is left exactly as it was.
    async fn append_if_absent(
        &self,
        new_entry: &NewEntry,
    ) -> Result<WaitlistEntry, StoreError>;
}
