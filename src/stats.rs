//! Frequency statistics compiled from the draw archive.
//!
//! `compile` is a pure function of the history it is handed: one pass over
//! all records builds a 45-slot per-number frequency table and a combo
//! frequency table, then selects the most frequent historical combinations.
//! The result is swapped into the snapshot store wholesale so readers never
//! observe a partially updated snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{now_ms, DrawRecord, NUMBER_MAX};

/// Snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// How many top combinations the snapshot retains.
pub const TOP_COMBINATIONS: usize = 50;

/// Cached frequency statistics derived from the full draw history.
///
/// Fully recomputable; staleness is acceptable, inconsistency is not.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencySnapshot {
    pub version: u32,

    /// When this snapshot was computed (ms since UNIX epoch)
    pub computed_at: u64,

    /// Occurrence count per number; slot `i` holds the count for number `i + 1`
    pub number_frequency: Vec<u64>,

    /// Most frequent historical combo keys, descending frequency,
    /// ties in first-seen order
    pub top_combinations: Vec<String>,

    /// Number of history records this snapshot was computed from
    pub source_size: usize,
}

impl FrequencySnapshot {
    /// An empty snapshot, used before the first sync has run.
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            computed_at: now_ms(),
            number_frequency: vec![0; NUMBER_MAX as usize],
            top_combinations: Vec::new(),
            source_size: 0,
        }
    }

    /// Occurrence count for a number in [1,45]; 0 for anything else.
    pub fn frequency_of(&self, number: u8) -> u64 {
        if number == 0 {
            return 0;
        }
        self.number_frequency
            .get(number as usize - 1)
            .copied()
            .unwrap_or(0)
    }
}

/// Recompute the frequency snapshot from a consistent read of the history.
pub fn compile(history: &[DrawRecord]) -> FrequencySnapshot {
    let mut number_frequency = vec![0u64; NUMBER_MAX as usize];

    // combo key -> (occurrences, first-seen index) for stable tie order
    let mut combo_frequency: HashMap<String, (u64, usize)> = HashMap::new();

    for (idx, record) in history.iter().enumerate() {
        for &n in &record.numbers {
            if n >= 1 && n <= NUMBER_MAX {
                number_frequency[n as usize - 1] += 1;
            }
        }

        let key = record.combo_key();
        let entry = combo_frequency.entry(key).or_insert((0, idx));
        entry.0 += 1;
    }

    let mut combos: Vec<(String, u64, usize)> = combo_frequency
        .into_iter()
        .map(|(key, (count, first_seen))| (key, count, first_seen))
        .collect();
    combos.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let top_combinations = combos
        .into_iter()
        .take(TOP_COMBINATIONS)
        .map(|(key, _, _)| key)
        .collect();

    FrequencySnapshot {
        version: SNAPSHOT_VERSION,
        computed_at: now_ms(),
        number_frequency,
        top_combinations,
        source_size: history.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(round: u32, numbers: [u8; 6]) -> DrawRecord {
        DrawRecord {
            round,
            date: String::new(),
            numbers,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = compile(&[]);
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.source_size, 0);
        assert_eq!(snapshot.number_frequency.len(), 45);
        assert!(snapshot.number_frequency.iter().all(|&c| c == 0));
        assert!(snapshot.top_combinations.is_empty());
    }

    #[test]
    fn test_number_frequency_counts_every_occurrence() {
        let history = vec![
            record(1, [1, 2, 3, 4, 5, 6]),
            record(2, [1, 2, 3, 40, 41, 42]),
            record(3, [1, 10, 20, 30, 40, 45]),
        ];

        let snapshot = compile(&history);
        assert_eq!(snapshot.source_size, 3);
        assert_eq!(snapshot.frequency_of(1), 3);
        assert_eq!(snapshot.frequency_of(2), 2);
        assert_eq!(snapshot.frequency_of(40), 2);
        assert_eq!(snapshot.frequency_of(45), 1);
        assert_eq!(snapshot.frequency_of(44), 0);
    }

    #[test]
    fn test_top_combinations_sorted_by_count_then_first_seen() {
        // Combo B appears twice, combos A and C once each; A seen before C.
        let history = vec![
            record(1, [1, 2, 3, 4, 5, 6]),    // A
            record(2, [10, 11, 12, 13, 14, 15]), // B
            record(3, [20, 21, 22, 23, 24, 25]), // C
            record(4, [15, 14, 13, 12, 11, 10]), // B again, different order
        ];

        let snapshot = compile(&history);
        assert_eq!(
            snapshot.top_combinations,
            vec![
                "10-11-12-13-14-15".to_string(),
                "1-2-3-4-5-6".to_string(),
                "20-21-22-23-24-25".to_string(),
            ]
        );
    }

    #[test]
    fn test_top_combinations_capped() {
        let mut history = Vec::new();
        for i in 0..60u32 {
            let base = (i % 39) as u8;
            history.push(record(i + 1, [
                base + 1,
                base + 2,
                base + 3,
                base + 4,
                base + 5,
                base + 6,
            ]));
        }

        let snapshot = compile(&history);
        assert!(snapshot.top_combinations.len() <= TOP_COMBINATIONS);
        assert_eq!(snapshot.source_size, 60);
    }

    #[test]
    fn test_frequency_of_out_of_range() {
        let snapshot = compile(&[record(1, [1, 2, 3, 4, 5, 6])]);
        assert_eq!(snapshot.frequency_of(0), 0);
        assert_eq!(snapshot.frequency_of(46), 0);
    }
}
