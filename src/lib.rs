// src/lib.rs
pub mod abundance;
pub mod composition;
pub mod error;
pub mod fasta;
pub mod rarefy;
pub mod stats;
pub mod types;

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

use crate::abundance::AbundanceTable;
use crate::error::RarefyError;
use crate::fasta::{dedup_by_id, read_fasta_records};
use crate::rarefy::{
    build_read_pool, generate_steps, rarefy, summarize_recovery, ReadPool, RecoverySummary,
    SamplingMode, SamplingUnit, Seeding,
};
use crate::types::{FastaRecord, RarefactionRow};

/// Column header of the rarefaction table.
pub const RAREFACTION_HEADER: &str = "sampleSize\tmean\tsd\tmin\tp05\tp25\tp50\tp75\tp95\tmax";

/// Settings for one rarefaction run. Defaults match the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct RarefyConfig {
    pub fasta_path: PathBuf,
    pub abundance_path: Option<PathBuf>,
    /// Range endpoints, in either order.
    pub range: (usize, usize),
    pub step: usize,
    pub replicates: usize,
    pub unit: SamplingUnit,
    pub mode: SamplingMode,
    pub seeding: Seeding,
    /// Compute the closing recovery summary after the table.
    pub summary: bool,
}

impl Default for RarefyConfig {
    fn default() -> Self {
        Self {
            fasta_path: PathBuf::new(),
            abundance_path: None,
            range: (0, 20000),
            step: 100,
            replicates: 100,
            unit: SamplingUnit::default(),
            mode: SamplingMode::default(),
            seeding: Seeding::default(),
            summary: true,
        }
    }
}

/// Loaded input of a run: sampling sizes, records and the read pool built from them.
#[derive(Debug)]
pub struct RarefactionInput {
    pub steps: Vec<usize>,
    pub records: Vec<FastaRecord>,
    pub pool: ReadPool,
    /// Number of abundance entries, when a table was given.
    pub abundances: Option<usize>,
}

/// Everything a rarefaction run produces.
#[derive(Debug)]
pub struct RarefactionResults {
    /// One row per sampling size, in step order.
    pub rows: Vec<RarefactionRow>,
    /// Reads in the pool after abundance expansion.
    pub pool_size: usize,
    /// Distinct read values in the pool.
    pub distinct_reads: usize,
    /// Only present when `RarefyConfig::summary` is set.
    pub recovery: Option<RecoverySummary>,
}

impl RarefactionResults {
    /// Generate the tab-separated rarefaction table on demand
    pub fn get_rarefaction_table(&self) -> String {
        let mut output = String::new();
        writeln!(output, "{}", RAREFACTION_HEADER).unwrap();
        for row in &self.rows {
            let s = &row.summary;
            writeln!(
                output,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                row.sample_size, s.mean, s.sd, s.min, s.p05, s.p25, s.p50, s.p75, s.p95, s.max
            )
            .unwrap();
        }
        output
    }
}

/// `reads.fasta` -> `reads_rarefied.tsv`; a path without extension gets the suffix appended.
pub fn default_output_path(fasta_path: &Path) -> PathBuf {
    let stem = fasta_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    fasta_path.with_file_name(format!("{stem}_rarefied.tsv"))
}

/// Loads the FASTA (and abundance table) and builds the read pool.
pub fn load_input(config: &RarefyConfig) -> Result<RarefactionInput, RarefyError> {
    // 1. Sampling sizes
    let steps = generate_steps(config.range.0, config.range.1, config.step)?;

    // 2. Records
    let records = dedup_by_id(read_fasta_records(&config.fasta_path)?);
    log::debug!("Read {} records from {}", records.len(), config.fasta_path.display());

    // 3. Abundances
    let abundance = match &config.abundance_path {
        Some(path) => {
            let table = AbundanceTable::from_file(path)?;
            log::debug!("Read {} abundances from {}", table.len(), path.display());
            Some(table)
        }
        None => None,
    };

    // 4. Pool
    let pool = build_read_pool(&records, abundance.as_ref(), config.unit)?;

    Ok(RarefactionInput {
        steps,
        records,
        pool,
        abundances: abundance.as_ref().map(AbundanceTable::len),
    })
}

/// Rarefies a loaded input over its steps, then optionally summarizes recovery.
///
/// `on_step` receives each row as soon as its step is finished.
pub fn rarefy_input<F>(
    config: &RarefyConfig,
    input: &RarefactionInput,
    on_step: F,
) -> Result<RarefactionResults, RarefyError>
where
    F: FnMut(&RarefactionRow),
{
    let rows = rarefy(
        &input.pool,
        &input.steps,
        config.replicates,
        config.mode,
        config.seeding,
        on_step,
    )?;

    let recovery = config.summary.then(|| {
        summarize_recovery(
            &input.pool,
            &input.records,
            config.replicates,
            config.mode,
            config.seeding,
            input.abundances.is_some(),
        )
    });

    Ok(RarefactionResults {
        rows,
        pool_size: input.pool.len(),
        distinct_reads: input.pool.distinct(),
        recovery,
    })
}

/// Unified function: load the input and rarefy it in one go.
pub fn rarefy_fasta<F>(config: &RarefyConfig, on_step: F) -> Result<RarefactionResults, RarefyError>
where
    F: FnMut(&RarefactionRow),
{
    let input = load_input(config)?;
    rarefy_input(config, &input, on_step)
}
