use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use fasta_rarefy::error::RarefyError;
use fasta_rarefy::rarefy::{Recovery, SamplingMode, SamplingUnit, Seeding};
use fasta_rarefy::{default_output_path, load_input, rarefy_input, RarefyConfig};

/// From a fasta file, export a table of rarefied observations. If an abundance
/// table is given, abundances are taken into consideration.
#[derive(Parser, Debug)]
#[command(name = "fasta-rarefy", version)]
struct Cli {
    /// A fasta file (optionally gzipped).
    #[arg(short = 'f', long = "file")]
    fasta: PathBuf,

    /// Two-column table of sequence names and abundances, used to replicate
    /// every sequence by its abundance before sampling.
    #[arg(short = 'a', long)]
    abundance: Option<PathBuf>,

    /// Output table. Defaults to the input name with its extension replaced
    /// by '_rarefied.tsv'.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Minimum and maximum sampling size, in any order.
    #[arg(short = 'r', long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [0, 20000])]
    range: Vec<usize>,

    /// Increase of the sampling size between steps.
    #[arg(short = 's', long, default_value_t = 100)]
    steps: usize,

    /// Number of rarefaction replicates per sampling size.
    #[arg(short = 'n', long, default_value_t = 100)]
    replicates: usize,

    /// Sample sequence identifiers instead of sequences. Useful when the fasta
    /// has duplicated sequences.
    #[arg(short = 'i', long)]
    identifier: bool,

    /// Sample without replacement.
    #[arg(short = 'R', long)]
    without_replacement: bool,

    /// Seed for reproducible sampling. Without it every replicate is seeded
    /// from system entropy.
    #[arg(long)]
    seed: Option<u64>,

    /// Only print warnings and errors, and skip the closing recovery summary.
    #[arg(short = 'q', long, visible_short_alias = 'v')]
    quiet: bool,
}

impl Cli {
    fn to_config(&self) -> RarefyConfig {
        RarefyConfig {
            fasta_path: self.fasta.clone(),
            abundance_path: self.abundance.clone(),
            range: (self.range[0], self.range[1]),
            step: self.steps,
            replicates: self.replicates,
            unit: if self.identifier {
                SamplingUnit::Identifier
            } else {
                SamplingUnit::Sequence
            },
            mode: if self.without_replacement {
                SamplingMode::WithoutReplacement
            } else {
                SamplingMode::WithReplacement
            },
            seeding: self.seed.map(Seeding::Fixed).unwrap_or(Seeding::Entropy),
            summary: !self.quiet,
        }
    }
}

fn spinner(color: &str, msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .expect("Invalid spinner template"),
    );
    spinner.set_message(msg);
    spinner
}

fn log_recovery(recovery: &Recovery, unit: SamplingUnit) {
    log::info!(
        "When sampling {} {}, an average of {} unique {} are retrieved ({:.2}%)",
        recovery.sample_size,
        unit.label(),
        recovery.mean_distinct,
        unit.label(),
        recovery.percent()
    );
}

fn run(cli: &Cli) -> Result<(), RarefyError> {
    let config = cli.to_config();
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.fasta));

    // 1. Load reads
    let loading = if cli.quiet {
        ProgressBar::hidden()
    } else {
        spinner("blue", "Reading fasta and building read pool...")
    };
    let input = load_input(&config);
    loading.finish_and_clear();
    let input = input?;

    log::info!(
        "Read {} records{} into {} {} ({} distinct)",
        input.records.len(),
        input
            .abundances
            .map(|n| format!(" and {n} abundances"))
            .unwrap_or_default(),
        input.pool.len(),
        config.unit.label(),
        input.pool.distinct()
    );
    log::info!(
        "Rarefying from {} to {} in steps of {} with {} replicates",
        input.steps[0],
        input.steps[input.steps.len() - 1],
        config.step,
        config.replicates
    );

    // 2. Rarefy, ticking once per sampling size
    let bar = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(input.steps.len() as u64)
    };
    bar.set_style(
        ProgressStyle::with_template("{bar:40.green/blue} {pos}/{len} sampling sizes {msg}")
            .expect("Invalid progress template"),
    );

    let results = rarefy_input(&config, &input, |row| {
        bar.set_message(format!("(size {})", row.sample_size));
        bar.inc(1);
    });
    bar.finish_and_clear();
    let results = results?;

    // 3. Write the table
    let writing = if cli.quiet {
        ProgressBar::hidden()
    } else {
        spinner("yellow", "Writing rarefaction table...")
    };
    fs::write(&output, results.get_rarefaction_table())?;
    writing.finish_and_clear();
    log::info!("Table written to {}", output.display());

    // 4. Final summary
    if let Some(recovery) = &results.recovery {
        log::info!(
            "Fasta has a total of {} entries and {} unique sequences",
            recovery.records,
            recovery.distinct_sequences
        );
        log_recovery(&recovery.at_record_count, config.unit);
        if let Some(at_pool) = &recovery.at_pool_size {
            log_recovery(at_pool, config.unit);
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(err) = run(&cli) {
        log::error!("{err}");
        process::exit(1);
    }
}
