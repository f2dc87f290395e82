//! HTML results-page fallback strategy.
//!
//! Used when the structured endpoint fails to yield a complete record.
//! Extraction order:
//! 1. Ball markup (`ball_645` spans) for the six winning numbers
//! 2. If that yields fewer than six: strip tags and scan all 1-2 digit
//!    tokens in [1,45], deduped in encounter order
//!
//! The round number comes from the request when given; for `Latest` it must
//! be extractable from the page header (`N회`).

use async_trait::async_trait;
use regex::Regex;

use crate::fetch::{DrawFetch, FetchTarget};
use crate::types::{DrawRecord, FetchFailure, NUMBER_MAX, NUMBER_MIN, PICKS_PER_DRAW};

/// Fetch strategy that scrapes the human-readable results page.
pub struct PageStrategy {
    client: reqwest::Client,
    page_url: String,
    ball_re: Regex,
    tag_re: Regex,
    token_re: Regex,
    round_re: Regex,
    date_re: Regex,
}

impl PageStrategy {
    pub fn new(client: reqwest::Client, page_url: String) -> Result<Self, String> {
        Ok(Self {
            client,
            page_url,
            ball_re: Regex::new(r#"<span[^>]*class="[^"]*ball_645[^"]*"[^>]*>\s*(\d{1,2})\s*</span>"#)
                .map_err(|e| format!("ball regex: {}", e))?,
            tag_re: Regex::new(r"<[^>]+>").map_err(|e| format!("tag regex: {}", e))?,
            token_re: Regex::new(r"\b(\d{1,2})\b").map_err(|e| format!("token regex: {}", e))?,
            round_re: Regex::new(r"(\d{1,5})\s*회").map_err(|e| format!("round regex: {}", e))?,
            date_re: Regex::new(r"(\d{4}-\d{2}-\d{2})").map_err(|e| format!("date regex: {}", e))?,
        })
    }

    /// Parse a results page into a draw record.
    ///
    /// Split out from the network call so it can be exercised directly.
    fn parse_page(&self, html: &str, target: FetchTarget) -> Result<DrawRecord, FetchFailure> {
        let round = match target {
            FetchTarget::Round(n) => n,
            FetchTarget::Latest => self
                .round_re
                .captures(html)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|r| *r > 0)
                .ok_or_else(|| {
                    FetchFailure::Malformed("round number not found on page".to_string())
                })?,
        };

        // Primary selector: ball markup
        let mut numbers = self.collect_numbers(
            self.ball_re
                .captures_iter(html)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str()),
        );

        // Fallback: scan all free text for 1-2 digit tokens in range
        if numbers.len() < PICKS_PER_DRAW {
            let text = self.tag_re.replace_all(html, " ");
            numbers = self.collect_numbers(
                self.token_re
                    .captures_iter(&text)
                    .filter_map(|c| c.get(1))
                    .map(|m| m.as_str()),
            );
        }

        if numbers.len() < PICKS_PER_DRAW {
            return Err(FetchFailure::Malformed(format!(
                "only {} numbers found on page for round {}",
                numbers.len(),
                round
            )));
        }

        let mut picked = [0u8; PICKS_PER_DRAW];
        picked.copy_from_slice(&numbers[..PICKS_PER_DRAW]);

        // collect_numbers already guarantees six distinct in-range numbers.
        Ok(DrawRecord {
            round,
            date: self
                .date_re
                .captures(html)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            numbers: picked,
        })
    }

    /// In-range tokens, deduped in encounter order, capped at six.
    fn collect_numbers<'a>(&self, tokens: impl Iterator<Item = &'a str>) -> Vec<u8> {
        let mut numbers = Vec::with_capacity(PICKS_PER_DRAW);
        for token in tokens {
            if numbers.len() == PICKS_PER_DRAW {
                break;
            }
            if let Ok(n) = token.parse::<u8>() {
                if (NUMBER_MIN..=NUMBER_MAX).contains(&n) && !numbers.contains(&n) {
                    numbers.push(n);
                }
            }
        }
        numbers
    }
}

#[async_trait]
impl DrawFetch for PageStrategy {
    async fn fetch_draw(&self, target: FetchTarget) -> Result<DrawRecord, FetchFailure> {
        let url = match target {
            FetchTarget::Latest => self.page_url.clone(),
            FetchTarget::Round(n) => format!("{}&drwNo={}", self.page_url, n),
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchFailure::Transient(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchFailure::Transient(format!(
                "status {} for {}",
                response.status(),
                target
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchFailure::Transient(format!("read body failed: {}", e)))?;

        self.parse_page(&html, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> PageStrategy {
        PageStrategy::new(reqwest::Client::new(), "http://example.invalid".to_string()).unwrap()
    }

    const BALL_PAGE: &str = r#"
        <h4><strong>1196회</strong> 당첨결과</h4>
        <p class="desc">(2025-11-01 추첨)</p>
        <div class="nums">
            <span class="ball_645 lrg ball1">3</span>
            <span class="ball_645 lrg ball1">7</span>
            <span class="ball_645 lrg ball2">12</span>
            <span class="ball_645 lrg ball3">24</span>
            <span class="ball_645 lrg ball4">38</span>
            <span class="ball_645 lrg ball5">45</span>
            <span class="ball_645 lrg ball2">11</span>
        </div>
    "#;

    #[test]
    fn test_parse_ball_markup_with_explicit_round() {
        let record = strategy()
            .parse_page(BALL_PAGE, FetchTarget::Round(1196))
            .unwrap();
        assert_eq!(record.round, 1196);
        assert_eq!(record.numbers, [3, 7, 12, 24, 38, 45]);
        assert_eq!(record.date, "2025-11-01");
    }

    #[test]
    fn test_parse_latest_extracts_round_from_header() {
        let record = strategy().parse_page(BALL_PAGE, FetchTarget::Latest).unwrap();
        assert_eq!(record.round, 1196);
    }

    #[test]
    fn test_parse_latest_without_round_header_is_malformed() {
        let html = r#"
            <span class="ball_645">1</span><span class="ball_645">2</span>
            <span class="ball_645">3</span><span class="ball_645">4</span>
            <span class="ball_645">5</span><span class="ball_645">6</span>
        "#;
        let failure = strategy()
            .parse_page(html, FetchTarget::Latest)
            .unwrap_err();
        assert!(matches!(failure, FetchFailure::Malformed(_)));
    }

    #[test]
    fn test_parse_latest_rejects_zero_round_header() {
        let html = r#"
            <h4><strong>0회</strong> 당첨결과</h4>
            <span class="ball_645">3</span><span class="ball_645">7</span>
            <span class="ball_645">12</span><span class="ball_645">24</span>
            <span class="ball_645">38</span><span class="ball_645">45</span>
        "#;
        let failure = strategy()
            .parse_page(html, FetchTarget::Latest)
            .unwrap_err();
        assert!(matches!(failure, FetchFailure::Malformed(_)));
    }

    #[test]
    fn test_fallback_text_scan_when_ball_markup_missing() {
        // No ball spans at all; numbers only appear in free text.
        let html = r#"
            <table><tr>
            <td>5</td><td>14</td><td>22</td><td>29</td><td>33</td><td>41</td>
            </tr></table>
        "#;
        let record = strategy()
            .parse_page(html, FetchTarget::Round(800))
            .unwrap();
        assert_eq!(record.numbers, [5, 14, 22, 29, 33, 41]);
        assert_eq!(record.date, "");
    }

    #[test]
    fn test_fallback_skips_out_of_range_and_duplicate_tokens() {
        let html = "<p>99 0 46 7 7 13 21 34 40 45 2</p>";
        let record = strategy()
            .parse_page(html, FetchTarget::Round(5))
            .unwrap();
        assert_eq!(record.numbers, [7, 13, 21, 34, 40, 45]);
    }

    #[test]
    fn test_too_few_numbers_is_malformed() {
        let failure = strategy()
            .parse_page("<p>1 2 3</p>", FetchTarget::Round(5))
            .unwrap_err();
        assert!(matches!(failure, FetchFailure::Malformed(_)));
    }
}
