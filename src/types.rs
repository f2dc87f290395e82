//! Core draw types shared across the crate.
//!
//! Defines the draw record shape, combo-key canonicalization used for all
//! duplicate checks, and the fetch-failure taxonomy the synchronizer
//! branches on.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lowest drawable number.
pub const NUMBER_MIN: u8 = 1;
/// Highest drawable number.
pub const NUMBER_MAX: u8 = 45;
/// Numbers drawn per round.
pub const PICKS_PER_DRAW: usize = 6;

/// Current time as milliseconds since the UNIX epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One official draw result.
///
/// `round` is assigned by the external authority and is unique within the
/// archive. `date` may be empty when the upstream source did not carry it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub round: u32,
    #[serde(default)]
    pub date: String,
    pub numbers: [u8; PICKS_PER_DRAW],
}

impl DrawRecord {
    /// Validate the record invariant: exactly 6 distinct numbers in [1,45].
    pub fn validate(&self) -> Result<(), String> {
        if self.round == 0 {
            return Err("round must be positive".to_string());
        }

        let mut seen = [false; (NUMBER_MAX as usize) + 1];
        for &n in &self.numbers {
            if !(NUMBER_MIN..=NUMBER_MAX).contains(&n) {
                return Err(format!("number {} out of range [1,45]", n));
            }
            if seen[n as usize] {
                return Err(format!("duplicate number {} in draw {}", n, self.round));
            }
            seen[n as usize] = true;
        }

        Ok(())
    }

    /// Canonical combo key for this record's numbers.
    pub fn combo_key(&self) -> String {
        combo_key(&self.numbers)
    }
}

/// Canonical identity of a 6-number set: sorted ascending, dash-joined.
///
/// Two draws or tickets with the same numbers in any order map to the same
/// key (e.g. `3-7-12-24-38-45`).
pub fn combo_key(numbers: &[u8]) -> String {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

/// Why a fetch attempt did not yield a draw record.
///
/// The synchronizer treats these differently: `Transient` is retried with
/// backoff, `NotFound` and `Malformed` mark the end of available history
/// for the current walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchFailure {
    /// The requested round does not exist yet. Expected, not an error.
    NotFound,
    /// The upstream response parsed but did not yield 6 valid distinct
    /// numbers. Usually a temporary formatting glitch upstream.
    Malformed(String),
    /// Network, timeout, or non-2xx failure. Ask again.
    Transient(String),
}

impl FetchFailure {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchFailure::Transient(_))
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::NotFound => write!(f, "round not found"),
            FetchFailure::Malformed(msg) => write!(f, "malformed response: {}", msg),
            FetchFailure::Transient(msg) => write!(f, "transient failure: {}", msg),
        }
    }
}
