//! Weighted combination generator.
//!
//! Draws 6-number tickets by frequency-weighted sampling without
//! replacement, then rejects any ticket whose combo key matches a
//! historical draw or a ticket already produced in the same call.
//! Both per-ticket and per-call attempt caps are enforced: a pathological
//! archive degrades to fewer tickets, never an endless loop.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::stats::FrequencySnapshot;
use crate::types::{combo_key, NUMBER_MAX, PICKS_PER_DRAW};
use log::debug;

/// Bounds for the rejection-sampling search.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Resample attempts per ticket before giving up on it
    pub ticket_attempt_cap: u32,
    /// Total attempts across one generate call
    pub total_attempt_cap: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            ticket_attempt_cap: 30,
            total_attempt_cap: 1000,
        }
    }
}

/// One generated 6-number ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Numbers sorted ascending
    pub numbers: [u8; PICKS_PER_DRAW],
    /// Canonical combo key of the numbers
    pub key: String,
}

/// Generate up to `count` distinct tickets.
///
/// Every returned ticket has a combo key distinct from all keys in
/// `historical` and from every other ticket in the result. The result may
/// be shorter than `count` when the attempt budget runs out; callers must
/// surface the actual length rather than padding.
pub fn generate(
    snapshot: &FrequencySnapshot,
    historical: &HashSet<String>,
    count: usize,
    config: &GeneratorConfig,
) -> Vec<Ticket> {
    generate_with_rng(snapshot, historical, count, config, &mut rand::thread_rng())
}

/// [`generate`] with an explicit RNG.
pub fn generate_with_rng<R: Rng>(
    snapshot: &FrequencySnapshot,
    historical: &HashSet<String>,
    count: usize,
    config: &GeneratorConfig,
    rng: &mut R,
) -> Vec<Ticket> {
    let mut tickets: Vec<Ticket> = Vec::with_capacity(count);
    let mut produced: HashSet<String> = HashSet::with_capacity(count);
    let mut total_attempts = 0u32;

    'tickets: while tickets.len() < count {
        let mut accepted = false;

        for _ in 0..config.ticket_attempt_cap {
            if total_attempts >= config.total_attempt_cap {
                debug!(
                    "Generation budget exhausted after {} tickets",
                    tickets.len()
                );
                break 'tickets;
            }
            total_attempts += 1;

            let numbers = sample_ticket(snapshot, rng);
            let key = combo_key(&numbers);

            if historical.contains(&key) || produced.contains(&key) {
                continue;
            }

            produced.insert(key.clone());
            tickets.push(Ticket { numbers, key });
            accepted = true;
            break;
        }

        if !accepted {
            // Per-ticket cap hit without a fresh combination; further
            // tickets would face the same search space.
            debug!("Ticket attempt cap hit after {} tickets", tickets.len());
            break;
        }
    }

    tickets
}

/// One weighted draw of 6 distinct numbers, sorted ascending.
///
/// Weights start from the historical frequency floored at 1 (so numbers
/// never drawn remain selectable) plus fresh uniform jitter per number, and
/// drop to zero once a number is chosen for this ticket.
fn sample_ticket<R: Rng>(snapshot: &FrequencySnapshot, rng: &mut R) -> [u8; PICKS_PER_DRAW] {
    let mut weights = [0f64; NUMBER_MAX as usize];
    for (i, weight) in weights.iter_mut().enumerate() {
        let freq = snapshot.frequency_of((i + 1) as u8).max(1);
        *weight = freq as f64 + rng.gen::<f64>();
    }

    let mut picked = [0u8; PICKS_PER_DRAW];
    for slot in picked.iter_mut() {
        let total: f64 = weights.iter().sum();
        let mut threshold = rng.gen::<f64>() * total;

        // Default to the last selectable index so floating-point residue
        // at the end of the scan can never re-pick a chosen number.
        let mut chosen = weights.iter().rposition(|&w| w > 0.0).unwrap_or(0);
        for (i, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            threshold -= weight;
            if threshold <= 0.0 {
                chosen = i;
                break;
            }
        }

        *slot = (chosen + 1) as u8;
        weights[chosen] = 0.0;
    }

    picked.sort_unstable();
    picked
}
