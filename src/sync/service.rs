//! Backfill synchronizer: reconcile the local archive with the source.
//!
//! Each run recomputes the known frontier from the store, discovers the
//! source's latest round, walks the gap strictly descending with retry,
//! throttling and safety caps, persists additions as one atomic write, and
//! always refreshes the frequency snapshot.

use std::cmp::min;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::fetch::{DrawFetch, FetchTarget};
use crate::stats::{self, FrequencySnapshot};
use crate::store::{HistoryStore, SnapshotStore};
use crate::types::{DrawRecord, FetchFailure};
use log::{debug, info, warn};

/// Configuration for one sync run.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Maximum records added in a single run, bounding worst-case runtime
    /// against a misbehaving source
    pub max_rounds_per_sync: usize,
    /// Retry budget per fetch (discovery and per-round alike)
    pub fetch_retries: u32,
    /// First retry delay; doubled per attempt
    pub retry_base_delay: Duration,
    /// Backoff ceiling
    pub retry_max_delay: Duration,
    /// Pause between round fetches, respecting the source's informal
    /// rate limit
    pub inter_request_delay: Duration,
    /// Overall deadline for one run
    pub overall_deadline: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_rounds_per_sync: 200,
            fetch_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(5),
            inter_request_delay: Duration::from_millis(50),
            overall_deadline: Duration::from_secs(300),
        }
    }
}

/// Result of one sync run.
#[derive(Clone, Debug)]
pub struct SyncOutcome {
    /// Records added in this run
    pub added: usize,
    /// Frontier before the run (highest stored round)
    pub known_max: u32,
    /// Latest round reported by the source
    pub latest: u32,
    /// Duration of the run in milliseconds
    pub duration_ms: u64,
    /// The freshly recomputed snapshot
    pub snapshot: FrequencySnapshot,
}

/// Archive synchronizer.
pub struct SyncService {
    fetcher: Arc<dyn DrawFetch>,
    history: Arc<HistoryStore>,
    snapshots: Arc<SnapshotStore>,
    config: SyncConfig,
    /// Serializes concurrent sync triggers within this process
    run_lock: tokio::sync::Mutex<()>,
}

impl SyncService {
    pub fn new(
        fetcher: Arc<dyn DrawFetch>,
        history: Arc<HistoryStore>,
        snapshots: Arc<SnapshotStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            fetcher,
            history,
            snapshots,
            config,
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Run one full sync cycle.
    ///
    /// **Algorithm**:
    /// 1. Compute the frontier fresh from the store
    /// 2. Discover the latest available round (retry budget applies);
    ///    failure aborts without touching existing history
    /// 3. Walk latest → 1 descending, skipping rounds already present
    ///    (skipped entirely when the archive is dense up to the frontier
    ///    and the source has nothing newer)
    /// 4. Persist additions as one atomic write
    /// 5. Recompute and swap the snapshot, even when nothing was added
    ///
    /// A transient failure mid-walk keeps partial progress; the remaining
    /// older rounds are picked up by the next run.
    pub async fn sync(&self) -> Result<SyncOutcome, String> {
        let _guard = self.run_lock.lock().await;

        let started = Instant::now();
        let deadline = started + self.config.overall_deadline;

        let known_max = self.history.known_max();

        let latest = match self.fetch_with_retry(FetchTarget::Latest, deadline).await {
            Ok(record) => record.round,
            Err(failure) => return Err(format!("discovery failed: {}", failure)),
        };
        info!("Sync: known_max={}, source latest={}", known_max, latest);

        // Dense means rounds 1..=known_max are all present; only then can
        // the walk be skipped outright when the source has nothing newer.
        let dense = self.history.len() as u64 == known_max as u64;

        let mut added = 0usize;
        if latest > known_max || !dense {
            added = self.backfill(latest, deadline).await?;
        } else {
            debug!("Nothing to backfill");
        }

        if added > 0 {
            self.history.persist()?;
        }

        // Recomputed unconditionally so cache and store cannot silently
        // diverge on first run.
        let snapshot = stats::compile(&self.history.records());
        self.snapshots.replace(snapshot.clone())?;

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Sync completed: {} added, {} total, {}ms",
            added,
            snapshot.source_size,
            duration_ms
        );

        Ok(SyncOutcome {
            added,
            known_max,
            latest,
            duration_ms,
            snapshot,
        })
    }

    /// Walk rounds from `latest` down to 1, skipping rounds already stored.
    ///
    /// Walking the full range (rather than stopping at the old frontier)
    /// is what makes interrupted runs resumable: a cap or transient stop
    /// leaves a gap below the newest additions, and the next run must
    /// revisit it. Present rounds cost a set lookup, not a fetch.
    async fn backfill(&self, latest: u32, deadline: Instant) -> Result<usize, String> {
        let mut added = 0usize;

        for round in (1..=latest).rev() {
            if added >= self.config.max_rounds_per_sync {
                warn!(
                    "Sync cap of {} additions reached, stopping at round {}",
                    self.config.max_rounds_per_sync, round
                );
                break;
            }
            if Instant::now() >= deadline {
                warn!("Sync deadline reached, stopping at round {}", round);
                break;
            }
            if self.history.contains_round(round) {
                continue;
            }

            match self.fetch_with_retry(FetchTarget::Round(round), deadline).await {
                Ok(record) => {
                    if record.round != round {
                        warn!(
                            "Source answered round {} when asked for {}, stopping walk",
                            record.round, round
                        );
                        break;
                    }
                    if self.append_record(record)? {
                        added += 1;
                    }
                }
                Err(failure) if failure.is_transient() => {
                    warn!(
                        "Round {} still failing after retries ({}), stopping walk",
                        round, failure
                    );
                    break;
                }
                Err(failure) => {
                    // NotFound/Malformed: end of available history
                    debug!("Round {} unavailable ({}), stopping walk", round, failure);
                    break;
                }
            }

            tokio::time::sleep(self.config.inter_request_delay).await;
        }

        Ok(added)
    }

    fn append_record(&self, record: DrawRecord) -> Result<bool, String> {
        let round = record.round;
        let appended = self.history.append(record)?;
        if !appended {
            debug!("Round {} already stored, skipping", round);
        }
        Ok(appended)
    }

    /// Fetch with capped exponential backoff on transient failures.
    ///
    /// NotFound/Malformed are returned immediately; retrying would not
    /// change the answer within one run.
    async fn fetch_with_retry(
        &self,
        target: FetchTarget,
        deadline: Instant,
    ) -> Result<DrawRecord, FetchFailure> {
        let mut delay = self.config.retry_base_delay;

        for attempt in 1..=self.config.fetch_retries {
            match self.fetcher.fetch_draw(target).await {
                Ok(record) => return Ok(record),
                Err(failure) if failure.is_transient() => {
                    if attempt == self.config.fetch_retries || Instant::now() + delay >= deadline {
                        return Err(failure);
                    }
                    warn!(
                        "Attempt {}/{} for round {} failed ({}), retrying in {:?}",
                        attempt, self.config.fetch_retries, target, failure, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = min(delay * 2, self.config.retry_max_delay);
                }
                Err(failure) => return Err(failure),
            }
        }

        Err(FetchFailure::Transient("retry budget exhausted".to_string()))
    }
}
