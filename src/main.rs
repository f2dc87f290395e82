//! # Lotto Archive Service Entry Point
//!
//! Wires up the stores, fetcher, synchronizer and scheduler, then serves
//! the HTTP surface until the process is stopped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use lotto_archive::fetch::{DrawFetcher, FetchConfig};
use lotto_archive::generate::GeneratorConfig;
use lotto_archive::server::{self, AppState};
use lotto_archive::store::{HistoryStore, SnapshotStore};
use lotto_archive::sync::{SchedulerConfig, SyncConfig, SyncScheduler, SyncService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================================");
    println!("  Lotto Archive - Draw Sync & Ticket Generation  ");
    println!("=================================================");

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let admin_key = std::env::var("ADMIN_KEY").unwrap_or_default();
    let data_dir = PathBuf::from(
        std::env::var("LOTTO_DATA_DIR").unwrap_or_else(|_| "./var/data".to_string()),
    );

    let mut fetch_config = FetchConfig::default();
    if let Ok(url) = std::env::var("LOTTO_API_URL") {
        fetch_config.api_base_url = url;
    }
    if let Ok(url) = std::env::var("LOTTO_RESULT_PAGE_URL") {
        fetch_config.page_url = url;
    }

    let scheduler_config = SchedulerConfig {
        sync_interval: std::env::var("SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(SchedulerConfig::default().sync_interval),
        enabled: std::env::var("SYNC_DISABLED").is_err(),
    };

    let history = Arc::new(HistoryStore::open(data_dir.join("lotto-history.json"))?);
    let snapshots = Arc::new(SnapshotStore::open(data_dir.join("lotto-stats.json"))?);
    info!(
        "Archive loaded: {} records, known_max={}",
        history.len(),
        history.known_max()
    );

    let fetcher = Arc::new(DrawFetcher::new(fetch_config)?);
    let sync_service = Arc::new(SyncService::new(
        fetcher,
        Arc::clone(&history),
        Arc::clone(&snapshots),
        SyncConfig::default(),
    ));

    let scheduler = Arc::new(SyncScheduler::new(
        Arc::clone(&sync_service),
        scheduler_config,
    ));
    tokio::spawn(Arc::clone(&scheduler).start());

    let state = Arc::new(AppState {
        history,
        snapshots,
        sync: sync_service,
        generator: GeneratorConfig::default(),
        admin_key,
    });

    info!("Listening on 0.0.0.0:{}", port);
    server::serve(state, port).await?;

    Ok(())
}
