//! # Lotto Draw Archive
//!
//! Backend subsystem that maintains a historical lottery-draw archive and
//! produces weighted, duplicate-free number combinations from it.
//!
//! # Architecture
//! - **Store** (`store`): append-only history + replaceable snapshot cache,
//!   both JSON files replaced atomically
//! - **Fetcher** (`fetch`): two interchangeable strategies (JSON endpoint,
//!   HTML page scrape) behind one contract
//! - **Synchronizer** (`sync`): frontier discovery, descending backfill walk
//!   with retry/backoff and safety caps, plus a periodic scheduler
//! - **Statistics** (`stats`): pure recomputation of the frequency snapshot
//! - **Generator** (`generate`): frequency-weighted sampling without
//!   replacement, rejecting every combination history has already drawn
//! - **Server** (`server`): the axum HTTP surface

pub mod fetch;
pub mod generate;
pub mod server;
pub mod stats;
pub mod store;
pub mod sync;
pub mod types;

pub use fetch::{DrawFetch, DrawFetcher, FetchConfig, FetchTarget};
pub use generate::{GeneratorConfig, Ticket};
pub use stats::FrequencySnapshot;
pub use store::{HistoryStore, SnapshotStore};
pub use sync::{SchedulerConfig, SyncConfig, SyncScheduler, SyncService};
pub use types::{combo_key, DrawRecord, FetchFailure};
