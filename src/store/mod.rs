//! Persistent processed-state store
//!
//! [`RecordStore`] loads an ordered list of link records from a sheet file,
//! exposes read access, and supports exactly one mutation: marking a record
//! as processed and committing that marker back to the same file. The
//! in-memory flag is only flipped after the commit reached durable storage,
//! so memory and disk never disagree after a successful call.

mod sheet;

pub use sheet::{PROCESSED_MARKER, Sheet, SheetRow};

use crate::error::StoreError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One tracked link record
///
/// `position` is the record's raw row index within the sheet (assigned at
/// load time, never reassigned), which keeps identities stable even though
/// rows without a link are excluded from the tracked list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkRecord {
    /// Stable identity: the raw data-row index within the sheet
    pub position: usize,
    /// The primary identifier, taken from the first payload cell
    pub link: String,
    /// The remaining payload cells (format, duration, size, ...), opaque here
    pub fields: Vec<String>,
    /// Whether the record carries the processed marker
    pub processed: bool,
}

struct Backing {
    path: PathBuf,
    sheet: Sheet,
}

/// Loads, exposes, and mutates the persisted list of link records
#[derive(Default)]
pub struct RecordStore {
    backing: Option<Backing>,
    records: Vec<LinkRecord>,
}

impl RecordStore {
    /// Create an empty store with nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the sheet at `path`, replacing any previously loaded list
    ///
    /// Rows whose link cell is empty are excluded from the tracked list (they
    /// still survive rewrites untouched). Returns the number of tracked
    /// records. On failure the list is left empty; there is no partial load.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize, StoreError> {
        let path = path.as_ref();
        self.backing = None;
        self.records.clear();

        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let sheet = Sheet::parse(&content).map_err(|reason| StoreError::Unreadable {
            path: path.to_path_buf(),
            reason,
        })?;

        let mut skipped = 0usize;
        for (position, row) in sheet.rows().iter().enumerate() {
            let Some(link) = row.link() else {
                skipped += 1;
                continue;
            };
            self.records.push(LinkRecord {
                position,
                link: link.to_string(),
                fields: row.cells.iter().skip(1).cloned().collect(),
                processed: row.is_processed(),
            });
        }

        tracing::info!(
            path = %path.display(),
            tracked = self.records.len(),
            skipped,
            "Sheet loaded"
        );

        self.backing = Some(Backing {
            path: path.to_path_buf(),
            sheet,
        });
        Ok(self.records.len())
    }

    /// Whether a sheet has been loaded successfully
    pub fn is_loaded(&self) -> bool {
        self.backing.is_some()
    }

    /// All tracked records in load order
    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    /// Number of tracked records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the tracked list is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a tracked record by its position
    pub fn record_at(&self, position: usize) -> Option<&LinkRecord> {
        self.records.iter().find(|r| r.position == position)
    }

    /// Tracked records already carrying the processed marker, in load order
    pub fn processed_records(&self) -> impl Iterator<Item = &LinkRecord> {
        self.records.iter().filter(|r| r.processed)
    }

    /// Mark the record at `position` as processed and commit the sheet
    ///
    /// Applying the marker and the durability commit are one logical
    /// operation: if the commit fails, neither the raw sheet model nor the
    /// in-memory flag changes and the call is retryable. Calling this on an
    /// already-processed record re-commits but leaves the observable flag
    /// unchanged.
    pub fn mark_processed(&mut self, position: usize) -> Result<(), StoreError> {
        let backing = self.backing.as_mut().ok_or(StoreError::NotLoaded)?;
        let index = self
            .records
            .iter()
            .position(|r| r.position == position)
            .ok_or(StoreError::UnknownPosition { position })?;

        let previous = backing
            .sheet
            .apply_marker(position)
            .ok_or(StoreError::UnknownPosition { position })?;

        if let Err(e) = commit_sheet(&backing.path, &backing.sheet) {
            backing.sheet.restore_status(position, previous);
            tracing::warn!(position, error = %e, "Sheet commit failed, marker rolled back");
            return Err(StoreError::WriteFailed {
                path: backing.path.clone(),
                reason: e.to_string(),
            });
        }

        self.records[index].processed = true;
        tracing::debug!(position, "Record marked processed");
        Ok(())
    }
}

/// Atomically replace the sheet file: temp file in the same directory,
/// fsync, then rename over the original.
fn commit_sheet(path: &Path, sheet: &Sheet) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(sheet.render().as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
