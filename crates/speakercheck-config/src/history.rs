//! Bounded, persisted test history.
//!
//! The log keeps the most recent [`HISTORY_CAPACITY`] records, newest first,
//! and writes the whole list back to its store after every change. It assumes
//! a single writer: two logs sharing a store will overwrite each other.

use crate::codec::{HISTORY_CAPACITY, decode, encode_all, validate};
use crate::error::Result;
use crate::record::TestRecord;
use crate::store::KeyValueStore;

/// Store key the history is kept under.
pub const HISTORY_KEY: &str = "speaker_check_history";

/// Most-recent-first list of test records backed by a [`KeyValueStore`].
#[derive(Debug)]
pub struct HistoryLog<S: KeyValueStore> {
    store: S,
    records: Vec<TestRecord>,
}

impl<S: KeyValueStore> HistoryLog<S> {
    /// Open a log and load whatever history `store` holds.
    pub fn open(store: S) -> Self {
        let mut log = Self {
            store,
            records: Vec::new(),
        };
        log.load();
        log
    }

    /// Reload from the store. Unreadable history loads as empty.
    pub fn load(&mut self) -> &[TestRecord] {
        self.records = match self.store.get(HISTORY_KEY) {
            Ok(Some(text)) => decode(&text),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read test history; starting empty");
                Vec::new()
            }
        };
        tracing::debug!(records = self.records.len(), "history loaded");
        &self.records
    }

    /// Add `record` as the most recent entry and persist the log.
    ///
    /// The oldest record is evicted beyond [`HISTORY_CAPACITY`]. A record
    /// holding non-finite values is refused and the log is left untouched. If
    /// the write fails the error is logged and returned, but the in-memory
    /// log keeps the new record.
    pub fn save(&mut self, record: TestRecord) -> Result<()> {
        let id = record.id().to_string();
        if let Err(e) = validate(&record) {
            tracing::error!(%id, error = %e, "refusing to save test");
            return Err(e);
        }
        self.records.insert(0, record);
        self.records.truncate(HISTORY_CAPACITY);

        let result = encode_all(&self.records).and_then(|text| self.store.set(HISTORY_KEY, &text));
        match &result {
            Ok(()) => tracing::info!(%id, records = self.records.len(), "test saved to history"),
            Err(e) => tracing::error!(%id, error = %e, "failed to persist test history"),
        }
        result
    }

    /// Records, most recent first.
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Record at `index` (0 = most recent).
    pub fn get(&self, index: usize) -> Option<&TestRecord> {
        self.records.get(index)
    }

    /// Look up a record by id, id prefix, or 1-based position.
    pub fn find(&self, query: &str) -> Option<&TestRecord> {
        if let Some(record) = self.records.iter().find(|r| r.id() == query) {
            return Some(record);
        }
        if let Ok(position) = query.parse::<usize>()
            && position >= 1
            && let Some(record) = self.records.get(position - 1)
        {
            return Some(record);
        }
        let mut matches = self.records.iter().filter(|r| r.id().starts_with(query));
        match (matches.next(), matches.next()) {
            (Some(record), None) if !query.is_empty() => Some(record),
            _ => None,
        }
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&TestRecord> {
        self.records.first()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the log, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }
}
