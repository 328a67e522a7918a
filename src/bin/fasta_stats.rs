use std::path::PathBuf;
use std::process;

use clap::Parser;

use fasta_rarefy::composition::CompositionReport;
use fasta_rarefy::error::RarefyError;
use fasta_rarefy::fasta::read_fasta_records;

/// Overall length and base-composition statistics of a fasta file.
#[derive(Parser, Debug)]
#[command(name = "fasta-stats", version)]
struct Cli {
    /// A fasta file, aligned or not (optionally gzipped).
    #[arg(short = 'f', long = "file")]
    fasta: PathBuf,
}

fn run(cli: &Cli) -> Result<(), RarefyError> {
    let records = read_fasta_records(&cli.fasta)?;
    log::debug!("Read {} records from {}", records.len(), cli.fasta.display());

    let report = CompositionReport::from_records(&records)?;
    print!("{}", report.render(&cli.fasta.display().to_string()));
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        log::error!("{err}");
        process::exit(1);
    }
}
