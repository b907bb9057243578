//! Cliff collapse: steep-threshold single-neighbor redistribution.
//!
//! Breaks up narrow features (slot canyons, spikes) that creep and
//! rockfall under-correct. A successful collapse seeds a cascade: the
//! receiving cell is re-tested in later rounds against a progressively
//! relaxed threshold and amplified amount, so one failure propagates
//! outward like a small landslide.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::config::CliffCollapseConfig;
use super::slump::{collapse_from, collapse_to};
use crate::field::{TerrainField, NEIGHBOR_OFFSETS};

/// Moves material from `(x, y)` to its single lowest neighbor when the
/// drop exceeds `threshold`. Loose drains fully before hard yields a
/// resistant fraction of the remainder. Returns the receiving cell.
fn try_collapse(
    field: &mut TerrainField,
    x: i32,
    y: i32,
    threshold: f32,
    amount: f32,
    hard_fraction: f32,
) -> Option<(i32, i32)> {
    let mut lowest = (x + 1, y);
    let mut lowest_height = f32::MAX;
    for &(dx, dy) in &NEIGHBOR_OFFSETS {
        let h = field.height_at(x + dx, y + dy);
        if h < lowest_height {
            lowest_height = h;
            lowest = (x + dx, y + dy);
        }
    }

    let excess = field.height_at(x, y) - lowest_height;
    if excess <= threshold {
        return None;
    }

    let required = excess * amount;
    let cell = field.cell_mut(x, y);
    let from_loose = required.min(cell.loose);
    cell.loose -= from_loose;
    let from_hard = ((required - from_loose) * hard_fraction).min(cell.hard);
    cell.hard -= from_hard;

    let moved = from_loose + from_hard;
    if moved <= 0.0 {
        return None;
    }
    field.cell_mut(lowest.0, lowest.1).loose += moved;
    Some(lowest)
}

/// One cliff-collapse invocation: `iterations` random samples, each
/// successful collapse cascading outward, then a smoothing pass over
/// every touched cell pair.
///
/// The collapse threshold is drawn once per invocation from the
/// configured range.
pub fn cliff_collapse(field: &mut TerrainField, config: &CliffCollapseConfig, rng: &mut ChaCha8Rng) {
    let width = field.width() as i32;
    let height = field.height() as i32;
    let threshold = config.threshold_min
        + rng.random::<f32>() * (config.threshold_max - config.threshold_min);

    let mut touched: Vec<((i32, i32), (i32, i32))> = Vec::new();
    let mut worklist: Vec<(i32, i32)> = Vec::new();

    for _ in 0..config.iterations {
        let x = (rng.random::<f32>() * width as f32) as i32;
        let y = (rng.random::<f32>() * height as f32) as i32;
        if let Some(to) = try_collapse(field, x, y, threshold, config.amount, config.hard_fraction)
        {
            touched.push(((x, y), to));
            worklist.push(to);
        }
    }

    let mut round_threshold = threshold;
    let mut round_amount = config.amount;
    for _ in 0..config.cascade_rounds {
        if worklist.is_empty() {
            break;
        }
        round_threshold *= config.cascade_threshold_decay;
        round_amount *= config.cascade_amount_growth;

        let mut next = Vec::new();
        for (x, y) in worklist {
            if let Some(to) = try_collapse(
                field,
                x,
                y,
                round_threshold,
                round_amount,
                config.hard_fraction,
            ) {
                touched.push(((x, y), to));
                next.push(to);
            }
        }
        worklist = next;
    }

    for (from, to) in touched {
        collapse_from(field, from.0, from.1, config.smoothing_amount);
        collapse_to(field, to.0, to.1, 0.0, config.smoothing_amount);
    }
}
