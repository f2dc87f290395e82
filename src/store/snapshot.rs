//! Persistent cache for the current frequency snapshot.
//!
//! The snapshot lives in its own JSON file so a stats query never needs to
//! touch the (potentially large) history file. It is only ever replaced as
//! a whole: compute, write atomically, then swap the in-memory copy.

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::stats::FrequencySnapshot;
use crate::store::atomic_write;

/// Holder for the current [`FrequencySnapshot`], mirrored to disk.
pub struct SnapshotStore {
    /// Path to the snapshot JSON file
    path: PathBuf,

    /// Current snapshot, swapped wholesale on each recomputation
    current: Arc<RwLock<FrequencySnapshot>>,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("path", &self.path)
            .field("source_size", &self.current.read().source_size)
            .finish()
    }
}

impl SnapshotStore {
    /// Open or create the snapshot store at the given path.
    ///
    /// A missing file is seeded with an empty snapshot so the stats
    /// endpoint always has something to serve before the first sync.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory: {}", e))?;
        }

        let store = Self {
            path: path.clone(),
            current: Arc::new(RwLock::new(FrequencySnapshot::empty())),
        };

        if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| format!("Read snapshot failed: {}", e))?;
            let snapshot: FrequencySnapshot =
                serde_json::from_str(&raw).map_err(|e| format!("Parse snapshot failed: {}", e))?;
            *store.current.write() = snapshot;
        } else {
            store.replace(FrequencySnapshot::empty())?;
        }

        Ok(store)
    }

    /// One consistent read of the current snapshot.
    pub fn current(&self) -> FrequencySnapshot {
        self.current.read().clone()
    }

    /// Atomically replace the persisted and in-memory snapshot.
    ///
    /// The file is written first; if that fails the in-memory snapshot is
    /// left untouched so cache and disk never diverge.
    pub fn replace(&self, snapshot: FrequencySnapshot) -> Result<(), String> {
        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|e| format!("Serialize snapshot failed: {}", e))?;
        atomic_write(&self.path, &bytes)?;

        *self.current.write() = snapshot;
        Ok(())
    }
}
