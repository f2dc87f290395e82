//! Remote draw retrieval.
//!
//! Two interchangeable strategies behind one contract:
//! 1. **ApiStrategy**: the structured JSON endpoint, keyed by round number
//! 2. **PageStrategy**: the human-readable results page, parsed with regex
//!
//! [`DrawFetcher`] tries them in that fixed order; the caller never learns
//! which one produced the record.

pub mod api;
pub mod page;

pub use api::ApiStrategy;
pub use page::PageStrategy;

use async_trait::async_trait;
use std::time::Duration;

use crate::types::{DrawRecord, FetchFailure};
use log::debug;

/// What to fetch: a specific round, or whatever the source published last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchTarget {
    Latest,
    Round(u32),
}

impl std::fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchTarget::Latest => write!(f, "latest"),
            FetchTarget::Round(n) => write!(f, "{}", n),
        }
    }
}

/// A single way of retrieving one draw from the external source.
///
/// Implementations make exactly one outbound call per invocation, mutate
/// no local state, and only return records satisfying the draw invariant
/// (checked where each strategy normalizes its upstream payload).
#[async_trait]
pub trait DrawFetch: Send + Sync {
    async fn fetch_draw(&self, target: FetchTarget) -> Result<DrawRecord, FetchFailure>;
}

/// Configuration for the upstream draw source.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// Base URL of the structured data endpoint
    pub api_base_url: String,
    /// URL of the HTML results page
    pub page_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.dhlottery.co.kr/common.do".to_string(),
            page_url: "https://www.dhlottery.co.kr/gameResult.do?method=byWin".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Composite fetcher: structured endpoint first, page scrape as fallback.
pub struct DrawFetcher {
    strategies: Vec<Box<dyn DrawFetch>>,
}

impl DrawFetcher {
    /// Build the standard two-strategy fetcher from config.
    pub fn new(config: FetchConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| format!("Build HTTP client failed: {}", e))?;

        Ok(Self {
            strategies: vec![
                Box::new(ApiStrategy::new(client.clone(), config.api_base_url)),
                Box::new(PageStrategy::new(client, config.page_url)?),
            ],
        })
    }

    /// Build a fetcher from explicit strategies (tried in order).
    pub fn with_strategies(strategies: Vec<Box<dyn DrawFetch>>) -> Self {
        Self { strategies }
    }
}

#[async_trait]
impl DrawFetch for DrawFetcher {
    /// Try each strategy in order until one yields a normalized record.
    ///
    /// If every strategy failed and any failure was transient, the
    /// composite reports transient so the caller retries; otherwise the
    /// last NotFound/Malformed stands.
    async fn fetch_draw(&self, target: FetchTarget) -> Result<DrawRecord, FetchFailure> {
        let mut transient: Option<FetchFailure> = None;
        let mut last_failure = FetchFailure::NotFound;

        for strategy in &self.strategies {
            match strategy.fetch_draw(target).await {
                Ok(record) => return Ok(record),
                Err(failure) => {
                    debug!("Fetch strategy failed for round {}: {}", target, failure);
                    if failure.is_transient() {
                        transient = Some(failure.clone());
                    }
                    last_failure = failure;
                }
            }
        }

        Err(transient.unwrap_or(last_failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStrategy(Result<DrawRecord, FetchFailure>);

    #[async_trait]
    impl DrawFetch for FixedStrategy {
        async fn fetch_draw(&self, _target: FetchTarget) -> Result<DrawRecord, FetchFailure> {
            self.0.clone()
        }
    }

    fn record(round: u32) -> DrawRecord {
        DrawRecord {
            round,
            date: String::new(),
            numbers: [1, 2, 3, 4, 5, 6],
        }
    }

    #[tokio::test]
    async fn test_first_strategy_wins() {
        let fetcher = DrawFetcher::with_strategies(vec![
            Box::new(FixedStrategy(Ok(record(10)))),
            Box::new(FixedStrategy(Err(FetchFailure::NotFound))),
        ]);

        let result = fetcher.fetch_draw(FetchTarget::Round(10)).await.unwrap();
        assert_eq!(result.round, 10);
    }

    #[tokio::test]
    async fn test_falls_through_to_second_strategy() {
        let fetcher = DrawFetcher::with_strategies(vec![
            Box::new(FixedStrategy(Err(FetchFailure::NotFound))),
            Box::new(FixedStrategy(Ok(record(7)))),
        ]);

        let result = fetcher.fetch_draw(FetchTarget::Round(7)).await.unwrap();
        assert_eq!(result.round, 7);
    }

    #[tokio::test]
    async fn test_transient_outranks_not_found() {
        let fetcher = DrawFetcher::with_strategies(vec![
            Box::new(FixedStrategy(Err(FetchFailure::Transient("timeout".into())))),
            Box::new(FixedStrategy(Err(FetchFailure::NotFound))),
        ]);

        let failure = fetcher
            .fetch_draw(FetchTarget::Round(1))
            .await
            .unwrap_err();
        assert!(failure.is_transient());
    }

    #[tokio::test]
    async fn test_all_not_found_reports_not_found() {
        let fetcher = DrawFetcher::with_strategies(vec![
            Box::new(FixedStrategy(Err(FetchFailure::NotFound))),
            Box::new(FixedStrategy(Err(FetchFailure::NotFound))),
        ]);

        let failure = fetcher
            .fetch_draw(FetchTarget::Round(1))
            .await
            .unwrap_err();
        assert_eq!(failure, FetchFailure::NotFound);
    }

}
