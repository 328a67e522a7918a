//src/stats.rs

use crate::error::RarefyError;
use crate::types::SampleSummary;

/// Percentiles reported for every sampling size.
pub const SUMMARY_PERCENTILES: [f64; 5] = [0.05, 0.25, 0.5, 0.75, 0.95];

pub fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N - 1 denominator). `None` below two values.
pub fn sample_sd(values: &[usize]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss: f64 = values
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// `sorted[floor(n * p)]`, zero-indexed, no interpolation.
/// `sorted` must be ascending and non-empty.
pub fn nearest_rank_floor(sorted: &[usize], p: f64) -> usize {
    let idx = (sorted.len() as f64 * p) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Linear interpolation between the closest ranks, `p` in [0, 100].
/// `sorted` must be ascending and non-empty.
pub fn interpolated_percentile(sorted: &[usize], p: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * p / 100.0;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac
}

/// Reduces the distinct counts of all replicates of one step.
pub fn summarize(counts: &[usize]) -> Result<SampleSummary, RarefyError> {
    let sd = sample_sd(counts).ok_or(RarefyError::InsufficientReplicates {
        replicates: counts.len(),
    })?;

    let mut sorted = counts.to_vec();
    sorted.sort_unstable();
    let [p05, p25, p50, p75, p95] = SUMMARY_PERCENTILES.map(|p| nearest_rank_floor(&sorted, p));

    Ok(SampleSummary {
        mean: mean(counts),
        sd,
        min: sorted[0],
        p05,
        p25,
        p50,
        p75,
        p95,
        max: sorted[sorted.len() - 1],
    })
}
