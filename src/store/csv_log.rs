use std::collections::HashSet;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use csv::QuoteStyle;
use csv::ReaderBuilder;
use csv::Terminator;
use csv::WriterBuilder;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::RecordStore;
use super::StoreError;
use crate::domain::EntrantEmail;
use crate::domain::NewEntry;
use crate::domain::WaitlistEntry;
use crate::telemetry::spawn_blocking_with_tracing;

/// The waitlist log: a UTF-8 CSV file with the header
/// `Name,Email,Source,Message,Timestamp`, created on the first successful
/// append.
///
/// Appends are serialised with an in-process lock. This is enough as long as
/// a single server instance owns the file; a replicated deployment would need
/// the lock to live out-of-process (or a real db).
pub struct CsvLog {
    path: PathBuf,
    // guards the whole read -> check duplicate -> write unit
    lock: Arc<Mutex<()>>,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path { &self.path }
}

#[async_trait]
impl RecordStore for CsvLog {
    #[tracing::instrument(
        name = "Appending entry to waitlist log",
        skip(self, new_entry),
        fields(
            log_path = %self.path.display(),
            entrant_email = %new_entry.email.as_ref(),
        )
    )]
    async fn append_if_absent(
        &self,
        new_entry: &NewEntry,
    ) -> Result<WaitlistEntry, StoreError> {
        // the guard is moved into the blocking task: if this future is dropped
        // (e.g. client hung up), the lock must still be held until the file
        // operation actually finishes
        let guard = Arc::clone(&self.lock).lock_owned().await;
        let path = self.path.clone();
        let new_entry = new_entry.clone();

        spawn_blocking_with_tracing(move || {
            let _guard = guard;
            append_if_absent_blocking(&path, &new_entry)
        })
        .await
        .context("Failed to spawn blocking task")?
    }
}

fn append_if_absent_blocking(
    path: &Path,
    new_entry: &NewEntry,
) -> Result<WaitlistEntry, StoreError> {
    let mut contents = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to read {}", path.display()))
                .into())
        }
    };

    // the index is rebuilt from the log on every submission; the log is the
    // only source of truth
    let emails = registered_emails(&contents)?;
    if emails.contains(new_entry.email.as_ref()) {
        tracing::info!("email is already on the waitlist");
        return Err(StoreError::Duplicate(new_entry.email.as_ref().to_string()));
    }

    let entry = WaitlistEntry::stamp(new_entry, Utc::now());

    if contents.is_empty() {
        contents.extend(encode_header()?);
    } else if !contents.ends_with(b"\n") {
        // a legacy log may lack the final newline
        contents.push(b'\n');
    }
    contents.extend(encode_row(&entry)?);

    replace_atomically(path, &contents)?;
    tracing::info!("appended entry to waitlist log");
    Ok(entry)
}

/// Normalised email (column 1) of every data row. Rows that are too short to
/// have an email column are skipped; text that is not valid CSV is an error,
/// since nothing can be said about duplicates in that case.
///
/// A legacy row with a stray `"` makes the reader swallow every following
/// line into one field, so each raw line is also split on commas and any
/// well-formed email in column 1 is added. This can only over-report.
fn registered_emails(contents: &[u8]) -> Result<HashSet<String>, anyhow::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        // older rows may have been written without quoting, and thus with
        // extra columns
        .flexible(true)
        .from_reader(contents);

    let mut emails = HashSet::new();
    for record in reader.records() {
        let record = record.context("Failed to parse waitlist log")?;
        if let Some(email) = record.get(1) {
            let email = EntrantEmail::normalise(email);
            if !email.is_empty() {
                emails.insert(email);
            }
        }
    }

    for line in String::from_utf8_lossy(contents).lines().skip(1) {
        let Some(field) = line.split(',').nth(1) else {
            continue;
        };
        if let Ok(email) = EntrantEmail::parse(field.trim().trim_matches('"').to_string()) {
            emails.insert(email.as_ref().to_string());
        }
    }
    Ok(emails)
}

fn writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .has_headers(false)
        // only quote fields containing a comma, quote, CR or LF
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![])
}

fn encode_header() -> Result<Vec<u8>, anyhow::Error> {
    let mut w = writer();
    w.write_record(WaitlistEntry::HEADER)
        .context("Failed to encode header")?;
    w.into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush header: {}", e.error()))
}

fn encode_row(entry: &WaitlistEntry) -> Result<Vec<u8>, anyhow::Error> {
    let mut w = writer();
    w.serialize(entry).context("Failed to encode entry")?;
    w.into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush entry: {}", e.error()))
}

/// Write `contents` to a sibling temp file, fsync it, then rename it over
/// `path` and fsync the directory. Readers (and a crash) see either the old
/// log or the new one, never half a row. An existing log keeps its
/// permissions.
fn replace_atomically(
    path: &Path,
    contents: &[u8],
) -> Result<(), anyhow::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("waitlist");
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    let permissions = match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!("Failed to stat {}", path.display())))
        }
    };

    let written = (|| -> io::Result<()> {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(contents)?;
        if let Some(permissions) = permissions {
            f.set_permissions(permissions)?;
        }
        f.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = written {
        // best effort; the log itself was not touched
        let _ = fs::remove_file(&tmp);
        return Err(anyhow::Error::new(e).context(format!("Failed to write {}", path.display())));
    }

    // the rename only survives a crash once the directory entry is on disk;
    // the new log is already in place, so a failure here is not an error
    if let Err(e) = sync_parent(path) {
        tracing::warn!(error.cause_chain = ?e, "failed to sync waitlist log directory");
    }
    Ok(())
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> io::Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    fs::File::open(parent)?.sync_all()
}

// directories cannot be opened as files here
#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> io::Result<()> { Ok(()) }
