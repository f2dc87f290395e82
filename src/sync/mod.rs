//! Archive synchronization against the external draw source.
//!
//! Two trigger paths share one implementation:
//! 1. **On-demand sync** (SyncService): triggered via the HTTP endpoint
//! 2. **Scheduled sync** (SyncScheduler): periodic background task

pub mod scheduler;
pub mod service;

pub use scheduler::{SchedulerConfig, SyncScheduler};
pub use service::{SyncConfig, SyncOutcome, SyncService};
