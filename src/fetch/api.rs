//! Structured JSON endpoint strategy.
//!
//! The upstream endpoint answers one round per call:
//! `{base}?method=getLottoNumber&drwNo={round}` with a body carrying
//! `returnValue`, `drwNo`, `drwNoDate` and `drwtNo1..drwtNo6`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::fetch::{DrawFetch, FetchTarget};
use crate::types::{DrawRecord, FetchFailure, NUMBER_MAX, NUMBER_MIN, PICKS_PER_DRAW};

/// Wire shape of the upstream JSON endpoint.
///
/// Everything except `returnValue` is optional: failure bodies carry only
/// the return value.
#[derive(Debug, Deserialize)]
struct ApiDrawResponse {
    #[serde(rename = "returnValue")]
    return_value: String,
    #[serde(rename = "drwNo")]
    round: Option<u32>,
    #[serde(rename = "drwNoDate", default)]
    date: Option<String>,
    #[serde(rename = "drwtNo1")]
    no1: Option<i64>,
    #[serde(rename = "drwtNo2")]
    no2: Option<i64>,
    #[serde(rename = "drwtNo3")]
    no3: Option<i64>,
    #[serde(rename = "drwtNo4")]
    no4: Option<i64>,
    #[serde(rename = "drwtNo5")]
    no5: Option<i64>,
    #[serde(rename = "drwtNo6")]
    no6: Option<i64>,
}

/// Fetch strategy backed by the structured data endpoint.
pub struct ApiStrategy {
    client: reqwest::Client,
    base_url: String,
}

impl ApiStrategy {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl DrawFetch for ApiStrategy {
    async fn fetch_draw(&self, target: FetchTarget) -> Result<DrawRecord, FetchFailure> {
        // The endpoint is keyed by round; it cannot answer "latest".
        // Reporting NotFound hands the target to the page strategy.
        let round = match target {
            FetchTarget::Round(n) => n,
            FetchTarget::Latest => return Err(FetchFailure::NotFound),
        };

        let url = format!("{}?method=getLottoNumber&drwNo={}", self.base_url, round);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json, text/plain, */*")
            .send()
            .await
            .map_err(|e| FetchFailure::Transient(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchFailure::Transient(format!(
                "status {} for round {}",
                response.status(),
                round
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::Transient(format!("read body failed: {}", e)))?;

        parse_api_body(&body, round)
    }
}

/// Normalize one endpoint response body into a draw record.
fn parse_api_body(body: &str, round: u32) -> Result<DrawRecord, FetchFailure> {
    let parsed: ApiDrawResponse = serde_json::from_str(body)
        .map_err(|e| FetchFailure::Malformed(format!("bad JSON: {}", e)))?;

    if parsed.return_value != "success" {
        return Err(FetchFailure::NotFound);
    }

    let raw = [
        parsed.no1, parsed.no2, parsed.no3, parsed.no4, parsed.no5, parsed.no6,
    ];
    let mut numbers = [0u8; PICKS_PER_DRAW];
    for (slot, value) in numbers.iter_mut().zip(raw.iter()) {
        let n = value.ok_or_else(|| FetchFailure::Malformed("missing number".to_string()))?;
        if n < NUMBER_MIN as i64 || n > NUMBER_MAX as i64 {
            return Err(FetchFailure::Malformed(format!("number {} out of range", n)));
        }
        *slot = n as u8;
    }

    let record = DrawRecord {
        round: parsed.round.unwrap_or(round),
        date: parsed.date.unwrap_or_default(),
        numbers,
    };
    record.validate().map_err(FetchFailure::Malformed)?;

    Ok(record)
}
