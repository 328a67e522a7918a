//src/error.rs

use thiserror::Error;

/// Everything that can abort a rarefaction or composition run.
#[derive(Debug, Error)]
pub enum RarefyError {
    #[error("sequence '{id}' has no entry in the abundance table")]
    MissingAbundanceEntry { id: String },

    #[error("abundance '{value}' for sequence '{id}' is not a non-negative integer")]
    InvalidAbundanceValue { id: String, value: String },

    #[error("abundance table line {line_no} needs two columns, found: '{line}'")]
    MalformedAbundanceLine { line_no: usize, line: String },

    #[error("step size must be greater than zero (got {step})")]
    InvalidRange { step: usize },

    #[error(
        "maximum sampling size {size} exceeds the {pool} available reads; \
         use a smaller range or allow sampling with replacement"
    )]
    SampleSizeExceedsPool { size: usize, pool: usize },

    #[error("at least 2 replicates are needed for a standard deviation (got {replicates})")]
    InsufficientReplicates { replicates: usize },

    #[error("malformed FASTA at line {line_no}: {reason}")]
    MalformedFasta { line_no: usize, reason: String },

    #[error("no sequences found in input")]
    EmptyInput,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
