//! Append-only draw history persisted as one JSON array.
//!
//! The store is the sole source of truth for what rounds are known; the
//! synchronizer recomputes its frontier from here at the start of every
//! run instead of caching it in process memory.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::store::atomic_write;
use crate::types::DrawRecord;
use log::warn;

/// Durable, append-only collection of historical draw results.
///
/// Records are immutable once stored and no two records share a round.
/// Writers go through [`HistoryStore::append`] + [`HistoryStore::persist`];
/// readers take consistent clones via [`HistoryStore::records`].
pub struct HistoryStore {
    /// Path to the history JSON file
    path: PathBuf,

    /// All records, kept sorted by round ascending
    records: Arc<RwLock<Vec<DrawRecord>>>,

    /// Rounds present, for O(1) idempotence checks
    rounds: Arc<RwLock<HashSet<u32>>>,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("path", &self.path)
            .field("records", &self.records.read().len())
            .finish()
    }
}

impl HistoryStore {
    /// Open or create the history store at the given path.
    ///
    /// An unreadable or unparseable existing file is a hard error: a
    /// corrupted archive must never be silently replaced with an empty one.
    /// Individual records that violate the draw invariant are skipped with
    /// a warning, as are duplicate rounds (first occurrence wins).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory: {}", e))?;
        }

        let mut records: Vec<DrawRecord> = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| format!("Read history failed: {}", e))?;
            serde_json::from_str(&raw).map_err(|e| format!("Parse history failed: {}", e))?
        } else {
            Vec::new()
        };

        let mut rounds = HashSet::with_capacity(records.len());
        records.retain(|record| {
            if let Err(e) = record.validate() {
                warn!("Skipping invalid record for round {}: {}", record.round, e);
                return false;
            }
            if !rounds.insert(record.round) {
                warn!("Skipping duplicate round {} in history file", record.round);
                return false;
            }
            true
        });
        records.sort_unstable_by_key(|r| r.round);

        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
            rounds: Arc::new(RwLock::new(rounds)),
        })
    }

    /// Number of records in the store.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Highest round present, or 0 if the store is empty.
    pub fn known_max(&self) -> u32 {
        self.records.read().last().map(|r| r.round).unwrap_or(0)
    }

    /// Whether a round is already stored.
    pub fn contains_round(&self, round: u32) -> bool {
        self.rounds.read().contains(&round)
    }

    /// Add a record to the in-memory archive.
    ///
    /// Returns `Ok(false)` without modifying anything if the round is
    /// already present (idempotence guard), `Ok(true)` if the record was
    /// added. Does not touch disk; callers batch additions and then call
    /// [`HistoryStore::persist`] once.
    pub fn append(&self, record: DrawRecord) -> Result<bool, String> {
        record.validate()?;

        let mut rounds = self.rounds.write();
        if !rounds.insert(record.round) {
            return Ok(false);
        }

        let mut records = self.records.write();
        let pos = records.partition_point(|r| r.round < record.round);
        records.insert(pos, record);
        Ok(true)
    }

    /// Persist the full archive to disk as one atomic write.
    pub fn persist(&self) -> Result<(), String> {
        let records = self.records.read();
        let bytes = serde_json::to_vec(&*records)
            .map_err(|e| format!("Serialize history failed: {}", e))?;
        drop(records); // Release lock before I/O

        atomic_write(&self.path, &bytes)
    }

    /// One consistent read of the full archive.
    pub fn records(&self) -> Vec<DrawRecord> {
        self.records.read().clone()
    }

    /// Combo keys of every combination that has ever been drawn.
    pub fn combo_keys(&self) -> HashSet<String> {
        self.records
            .read()
            .iter()
            .map(|r| r.combo_key())
            .collect()
    }
}
