// src/rarefy/sampler.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::read_pool::ReadPool;
use crate::error::RarefyError;
use crate::stats::{mean, summarize};
use crate::types::{FastaRecord, RarefactionRow};

/// How each replicate draws its reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMode {
    /// Independent draws; a read position may be picked more than once.
    #[default]
    WithReplacement,
    /// Distinct positions; the sampling size may not exceed the pool.
    WithoutReplacement,
}

/// Source of randomness for the replicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seeding {
    /// Every replicate gets a fresh OS-seeded generator.
    #[default]
    Entropy,
    /// Replicate seeds are derived from this base seed, the step index and the
    /// replicate index, so whole runs are reproducible.
    Fixed(u64),
}

impl Seeding {
    pub fn replicate_rng(&self, step_idx: usize, replicate: usize) -> StdRng {
        match *self {
            Seeding::Entropy => StdRng::from_entropy(),
            Seeding::Fixed(seed) => {
                StdRng::seed_from_u64(mix_seed(seed, step_idx as u64, replicate as u64))
            }
        }
    }
}

// splitmix64 finalizer over the combined coordinates
fn mix_seed(seed: u64, step_idx: u64, replicate: u64) -> u64 {
    let mut z = seed
        ^ step_idx.wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ replicate.wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Reusable scratch space for counting distinct symbols in one replicate.
///
/// A symbol is "seen" in the current replicate when its mark equals the
/// current generation, so resetting between replicates is a single increment.
struct DistinctCounter {
    marks: Vec<u32>,
    generation: u32,
}

impl DistinctCounter {
    fn new(distinct: usize) -> Self {
        Self {
            marks: vec![0; distinct],
            generation: 0,
        }
    }

    fn start(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.marks.iter_mut().for_each(|m| *m = 0);
            self.generation = 1;
        }
    }

    fn count<I: IntoIterator<Item = u32>>(&mut self, symbols: I) -> usize {
        self.start();
        let mut distinct = 0;
        for s in symbols {
            let mark = &mut self.marks[s as usize];
            if *mark != self.generation {
                *mark = self.generation;
                distinct += 1;
            }
        }
        distinct
    }
}

/// Draws one replicate of `size` reads and returns how many distinct values it holds.
fn draw_replicate<R: Rng>(
    pool: &ReadPool,
    size: usize,
    mode: SamplingMode,
    rng: &mut R,
    counter: &mut DistinctCounter,
) -> usize {
    let symbols = pool.symbols();
    match mode {
        SamplingMode::WithReplacement => {
            let n = symbols.len();
            counter.count((0..size).map(|_| symbols[rng.gen_range(0..n)]))
        }
        SamplingMode::WithoutReplacement => {
            let picked = rand::seq::index::sample(rng, symbols.len(), size);
            counter.count(picked.into_iter().map(|i| symbols[i]))
        }
    }
}

/// Distinct-value counts of `replicates` independent draws of `size` reads.
/// Callers must have passed `size` through `validate_steps` first.
pub(crate) fn replicate_counts(
    pool: &ReadPool,
    size: usize,
    replicates: usize,
    mode: SamplingMode,
    seeding: Seeding,
    step_idx: usize,
) -> Vec<usize> {
    let mut counter = DistinctCounter::new(pool.distinct());
    (0..replicates)
        .map(|r| {
            let mut rng = seeding.replicate_rng(step_idx, r);
            draw_replicate(pool, size, mode, &mut rng, &mut counter)
        })
        .collect()
}

/// Checks that every step can be drawn from `pool` under `mode`.
/// Only the largest step needs checking.
pub fn validate_steps(
    pool: &ReadPool,
    steps: &[usize],
    mode: SamplingMode,
) -> Result<(), RarefyError> {
    let max = steps.iter().copied().max().unwrap_or(0);
    let exceeds = match mode {
        SamplingMode::WithoutReplacement => max > pool.len(),
        // nothing to draw from at all
        SamplingMode::WithReplacement => max > 0 && pool.is_empty(),
    };
    if exceeds {
        return Err(RarefyError::SampleSizeExceedsPool {
            size: max,
            pool: pool.len(),
        });
    }
    Ok(())
}

/// Runs the rarefaction: for each sampling size in order, draws `replicates`
/// samples and summarizes their distinct counts.
///
/// All preconditions are checked before any sampling starts. `on_step` is
/// called after every finished step with the new row.
pub fn rarefy<F>(
    pool: &ReadPool,
    steps: &[usize],
    replicates: usize,
    mode: SamplingMode,
    seeding: Seeding,
    mut on_step: F,
) -> Result<Vec<RarefactionRow>, RarefyError>
where
    F: FnMut(&RarefactionRow),
{
    if replicates < 2 {
        return Err(RarefyError::InsufficientReplicates { replicates });
    }
    validate_steps(pool, steps, mode)?;

    let mut rows = Vec::with_capacity(steps.len());
    for (step_idx, &size) in steps.iter().enumerate() {
        let counts = replicate_counts(pool, size, replicates, mode, seeding, step_idx);
        let row = RarefactionRow {
            sample_size: size,
            summary: summarize(&counts)?,
        };
        log::debug!(
            "Sampling size {}: mean {:.2} distinct (min {}, max {})",
            size,
            row.summary.mean,
            row.summary.min,
            row.summary.max
        );
        on_step(&row);
        rows.push(row);
    }
    Ok(rows)
}

/// Mean recovery at one sampling size.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovery {
    pub sample_size: usize,
    pub mean_distinct: f64,
}

impl Recovery {
    pub fn percent(&self) -> f64 {
        if self.sample_size == 0 {
            0.0
        } else {
            self.mean_distinct / self.sample_size as f64 * 100.0
        }
    }
}

/// Closing summary of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoverySummary {
    pub records: usize,
    pub distinct_sequences: usize,
    /// Sampling `max(records, distinct_sequences)` reads.
    pub at_record_count: Recovery,
    /// Sampling the whole pool; only reported when abundances expanded it.
    pub at_pool_size: Option<Recovery>,
}

/// Mean distinct reads recovered when sampling as many reads as there are
/// records, and optionally as many as the whole pool.
pub fn summarize_recovery(
    pool: &ReadPool,
    records: &[FastaRecord],
    replicates: usize,
    mode: SamplingMode,
    seeding: Seeding,
    include_pool_size: bool,
) -> RecoverySummary {
    let distinct_sequences = {
        let mut seqs: Vec<&str> = records.iter().map(|r| r.seq.as_str()).collect();
        seqs.sort_unstable();
        seqs.dedup();
        seqs.len()
    };

    let clamp = |size: usize| match mode {
        SamplingMode::WithoutReplacement => size.min(pool.len()),
        SamplingMode::WithReplacement if pool.is_empty() => 0,
        SamplingMode::WithReplacement => size,
    };
    // step indices past the table's so fixed seeds do not replay table replicates
    let recover = |size: usize, step_idx: usize| {
        let size = clamp(size);
        let counts = replicate_counts(pool, size, replicates, mode, seeding, step_idx);
        Recovery {
            sample_size: size,
            mean_distinct: mean(&counts),
        }
    };

    RecoverySummary {
        records: records.len(),
        distinct_sequences,
        at_record_count: recover(records.len().max(distinct_sequences), usize::MAX - 1),
        at_pool_size: include_pool_size.then(|| recover(pool.len(), usize::MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abundance::AbundanceTable;
    use crate::rarefy::read_pool::{build_read_pool, SamplingUnit};

    fn distinct_pool(n: usize) -> ReadPool {
        let records: Vec<FastaRecord> = (0..n)
            .map(|i| FastaRecord::new(format!("r{i}"), format!("SEQ{i}")))
            .collect();
        build_read_pool(&records, None, SamplingUnit::Sequence).unwrap()
    }

    fn skewed_pool() -> ReadPool {
        let records = vec![
            FastaRecord::new("A", "AAAA"),
            FastaRecord::new("B", "CCCC"),
            FastaRecord::new("C", "AAAA"),
            FastaRecord::new("D", "GGGG"),
        ];
        let table: AbundanceTable = [("A", "20"), ("B", "5"), ("C", "3"), ("D", "1")]
            .into_iter()
            .collect();
        build_read_pool(&records, Some(&table), SamplingUnit::Sequence).unwrap()
    }

    #[test]
    fn without_replacement_counts_are_bounded() {
        let pool = skewed_pool();
        assert_eq!((pool.len(), pool.distinct()), (29, 3));

        for size in [1, 2, 5, 10, 29] {
            let counts = replicate_counts(
                &pool,
                size,
                200,
                SamplingMode::WithoutReplacement,
                Seeding::Fixed(7),
                0,
            );
            for c in counts {
                assert!(c >= 1 && c <= size.min(pool.distinct()), "size {size}: {c}");
            }
        }
    }

    #[test]
    fn without_replacement_full_pool_recovers_everything() {
        let pool = skewed_pool();
        let counts = replicate_counts(
            &pool,
            pool.len(),
            20,
            SamplingMode::WithoutReplacement,
            Seeding::Entropy,
            0,
        );
        assert!(counts.iter().all(|&c| c == pool.distinct()));
    }

    #[test]
    fn with_replacement_counts_are_bounded() {
        let pool = skewed_pool();
        for size in [0, 1, 3, 50, 500] {
            let counts = replicate_counts(
                &pool,
                size,
                100,
                SamplingMode::WithReplacement,
                Seeding::Fixed(11),
                0,
            );
            for c in counts {
                assert!(c <= size.min(pool.distinct()));
            }
        }
    }

    #[test]
    fn end_to_end_with_replacement() {
        let pool = distinct_pool(10);
        let mut seen = Vec::new();
        let rows = rarefy(
            &pool,
            &[0, 5, 10],
            50,
            SamplingMode::WithReplacement,
            Seeding::Fixed(2024),
            |row| seen.push(row.sample_size),
        )
        .unwrap();

        assert_eq!(seen, vec![0, 5, 10]);
        assert_eq!(rows.len(), 3);

        let zero = &rows[0].summary;
        assert_eq!((zero.mean, zero.sd, zero.min, zero.max), (0.0, 0.0, 0, 0));

        let full = &rows[2].summary;
        assert!(full.min >= 1 && full.max <= 10);
        assert!(full.mean < 10.0);
        assert!(full.min <= full.p05 && full.p05 <= full.p50 && full.p50 <= full.p95);
        assert!(full.p95 <= full.max);
    }

    #[test]
    fn oversized_step_fails_before_sampling() {
        let pool = distinct_pool(5);
        let mut called = false;
        let err = rarefy(
            &pool,
            &[0, 5, 10],
            10,
            SamplingMode::WithoutReplacement,
            Seeding::Entropy,
            |_| called = true,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            RarefyError::SampleSizeExceedsPool { size: 10, pool: 5 }
        ));
        assert!(!called);
    }

    #[test]
    fn oversized_step_allowed_with_replacement() {
        let pool = distinct_pool(5);
        let rows = rarefy(
            &pool,
            &[10],
            5,
            SamplingMode::WithReplacement,
            Seeding::Fixed(1),
            |_| {},
        )
        .unwrap();
        assert!(rows[0].summary.max <= 5);
    }

    #[test]
    fn empty_pool_cannot_be_sampled() {
        let records = vec![FastaRecord::new("A", "ACGT")];
        let table: AbundanceTable = [("A", "0")].into_iter().collect();
        let pool = build_read_pool(&records, Some(&table), SamplingUnit::Sequence).unwrap();

        assert!(validate_steps(&pool, &[0], SamplingMode::WithReplacement).is_ok());
        assert!(matches!(
            validate_steps(&pool, &[0, 1], SamplingMode::WithReplacement),
            Err(RarefyError::SampleSizeExceedsPool { size: 1, pool: 0 })
        ));
    }

    #[test]
    fn single_replicate_rejected() {
        let pool = distinct_pool(3);
        assert!(matches!(
            rarefy(&pool, &[1], 1, SamplingMode::WithReplacement, Seeding::Entropy, |_| {}),
            Err(RarefyError::InsufficientReplicates { replicates: 1 })
        ));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let pool = distinct_pool(1000);
        let run = |seed| {
            rarefy(
                &pool,
                &[100, 500, 1000],
                20,
                SamplingMode::WithoutReplacement,
                Seeding::Fixed(seed),
                |_| {},
            )
            .unwrap()
        };
        assert_eq!(run(99), run(99));

        let counts = |seed| {
            replicate_counts(&pool, 500, 20, SamplingMode::WithReplacement, Seeding::Fixed(seed), 0)
        };
        assert_eq!(counts(5), counts(5));
        assert_ne!(counts(5), counts(6));
    }

    #[test]
    fn replicates_within_a_step_differ() {
        let pool = distinct_pool(100_000);
        let counts = replicate_counts(
            &pool,
            50_000,
            10,
            SamplingMode::WithReplacement,
            Seeding::Fixed(3),
            0,
        );
        let first = counts[0];
        assert!(counts.iter().any(|&c| c != first));
    }

    #[test]
    fn entropy_seeding_varies_between_runs() {
        let pool = distinct_pool(100_000);
        let draw = || {
            replicate_counts(&pool, 50_000, 10, SamplingMode::WithReplacement, Seeding::Entropy, 0)
        };
        assert_ne!(draw(), draw());
    }

    #[test]
    fn recovery_summary_counts_unique_sequences() {
        let records = vec![
            FastaRecord::new("A", "AAAA"),
            FastaRecord::new("B", "AAAA"),
            FastaRecord::new("C", "CCCC"),
        ];
        let pool = build_read_pool(&records, None, SamplingUnit::Sequence).unwrap();
        let summary = summarize_recovery(
            &pool,
            &records,
            10,
            SamplingMode::WithoutReplacement,
            Seeding::Fixed(0),
            false,
        );

        assert_eq!(summary.records, 3);
        assert_eq!(summary.distinct_sequences, 2);
        assert_eq!(summary.at_record_count.sample_size, 3);
        assert_eq!(summary.at_record_count.mean_distinct, 2.0);
        assert!(summary.at_pool_size.is_none());
        assert!((summary.at_record_count.percent() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn recovery_summary_clamps_to_pool_without_replacement() {
        let records = vec![FastaRecord::new("A", "AAAA"), FastaRecord::new("B", "CCCC")];
        let table: AbundanceTable = [("A", "1"), ("B", "0")].into_iter().collect();
        let pool = build_read_pool(&records, Some(&table), SamplingUnit::Sequence).unwrap();
        let summary = summarize_recovery(
            &pool,
            &records,
            4,
            SamplingMode::WithoutReplacement,
            Seeding::Fixed(0),
            true,
        );

        assert_eq!(summary.at_record_count.sample_size, 1);
        assert_eq!(summary.at_record_count.mean_distinct, 1.0);
        let at_pool = summary.at_pool_size.unwrap();
        assert_eq!((at_pool.sample_size, at_pool.mean_distinct), (1, 1.0));
    }
}
