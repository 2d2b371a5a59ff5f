//! The record store: history persisted as one JSON blob.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::record::{History, Record, MAX_RECORDS};

use super::BlobStore;

/// Key the history blob is stored under.
pub const HISTORY_KEY: &str = "catheter_history";

/// Reads and writes the catheter history through a [`BlobStore`].
///
/// Every write is a read-modify-write of the whole history. There is no
/// locking: callers with several writers must serialize them.
#[derive(Debug)]
pub struct RecordStore<B> {
    backend: B,
    max_records: usize,
}

impl<B: BlobStore> RecordStore<B> {
    /// A store keeping at most [`MAX_RECORDS`] records.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            max_records: MAX_RECORDS,
        }
    }

    /// Lower the record cap. Values are clamped to `1..=MAX_RECORDS`.
    #[must_use]
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records.clamp(1, MAX_RECORDS);
        self
    }

    /// The record cap in effect.
    #[must_use]
    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// The underlying blob store.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load the history, or an empty one if nothing is stored or the read
    /// fails. Failures are logged, never returned.
    #[must_use]
    pub fn read_history(&self) -> History {
        match self.load() {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to load history, starting empty: {}", e);
                History::new()
            }
        }
    }

    /// Id of the most recently used location.
    #[must_use]
    pub fn last_location_id(&self) -> Option<String> {
        self.read_history().last_location_id().map(str::to_string)
    }

    /// Append a record, evicting the oldest beyond the cap.
    ///
    /// The stored history is re-read first; a failed read aborts the append
    /// rather than overwriting what is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read, serialized or written,
    /// or if the record is older than the latest stored one.
    pub fn append_record(&self, record: Record) -> Result<()> {
        let mut history = self.load()?;
        let location_id = record.location_id.clone();
        let evicted = history.push(record, self.max_records)?;
        if evicted > 0 {
            debug!("Evicted {} oldest records", evicted);
        }
        self.save(&history)?;
        info!(
            "Recorded application at {} ({} records)",
            location_id,
            history.len()
        );
        Ok(())
    }

    /// Delete all stored history.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    pub fn clear_history(&self) -> Result<()> {
        self.backend.remove(HISTORY_KEY)?;
        info!("History cleared");
        Ok(())
    }

    /// The stored history as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read or serialized.
    pub fn export_snapshot(&self) -> Result<String> {
        self.load()?.to_snapshot()
    }

    fn load(&self) -> Result<History> {
        match self.backend.get(HISTORY_KEY)? {
            Some(text) => History::from_snapshot(&text),
            None => Ok(History::new()),
        }
    }

    fn save(&self, history: &History) -> Result<()> {
        let text = serde_json::to_string(history)?;
        self.backend.set(HISTORY_KEY, &text)
    }
}
