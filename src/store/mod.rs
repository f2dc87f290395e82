//! Durable state for the draw archive.
//!
//! Two independent JSON documents:
//! - **History**: append-only array of draw records (`lotto-history.json`)
//! - **Snapshot**: wholesale-replaceable frequency cache (`lotto-stats.json`)
//!
//! Both are replaced via write-temp-then-rename so a reader never observes
//! a half-written file.

pub mod history;
pub mod snapshot;

pub use history::HistoryStore;
pub use snapshot::SnapshotStore;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Atomically replace `path` with `bytes`.
///
/// Writes to a sibling `.tmp` file, fsyncs, then renames over the target.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), String> {
    let tmp_path = path.with_extension("tmp");

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(|e| format!("Create temp failed: {}", e))?;

    file.write_all(bytes)
        .map_err(|e| format!("Write failed: {}", e))?;
    file.sync_all().map_err(|e| format!("Sync failed: {}", e))?;
    drop(file);

    std::fs::rename(&tmp_path, path).map_err(|e| format!("Rename failed: {}", e))?;
    Ok(())
}
