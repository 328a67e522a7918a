//src/types.rs

/// One FASTA entry: the header's first word and the concatenated sequence lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub seq: String,
}

impl FastaRecord {
    pub fn new(id: impl Into<String>, seq: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            seq: seq.into(),
        }
    }
}

/// Summary of the distinct-read counts observed across the replicates of one step.
///   mean  sd  min  p05  p25  p50  p75  p95  max
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSummary {
    pub mean: f64,
    pub sd: f64,
    pub min: usize,
    pub p05: usize,
    pub p25: usize,
    pub p50: usize,
    pub p75: usize,
    pub p95: usize,
    pub max: usize,
}

/// One row of the rarefaction table.
#[derive(Debug, Clone, PartialEq)]
pub struct RarefactionRow {
    pub sample_size: usize,
    pub summary: SampleSummary,
}
