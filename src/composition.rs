// src/composition.rs

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite;

use crate::error::RarefyError;
use crate::stats::{interpolated_percentile, mean, sample_sd};
use crate::types::FastaRecord;

/// Length and base-composition statistics over a set of sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionReport {
    /// Sequence lengths in ascending order.
    pub lengths: Vec<usize>,
    pub a: usize,
    pub c: usize,
    pub g: usize,
    pub t: usize,
    /// `-` characters; not part of the base total.
    pub gaps: usize,
    /// Anything that is not A, C, G, T or `-`.
    pub ambiguous: usize,
    pub ambiguity_symbols: BTreeSet<char>,
}

impl CompositionReport {
    pub fn from_records(records: &[FastaRecord]) -> Result<Self, RarefyError> {
        if records.is_empty() {
            return Err(RarefyError::EmptyInput);
        }

        let mut report = CompositionReport {
            lengths: Vec::with_capacity(records.len()),
            a: 0,
            c: 0,
            g: 0,
            t: 0,
            gaps: 0,
            ambiguous: 0,
            ambiguity_symbols: BTreeSet::new(),
        };
        for record in records {
            report.lengths.push(record.seq.chars().count());
            for base in record.seq.chars().map(|b| b.to_ascii_uppercase()) {
                match base {
                    'A' => report.a += 1,
                    'C' => report.c += 1,
                    'G' => report.g += 1,
                    'T' => report.t += 1,
                    '-' => report.gaps += 1,
                    other => {
                        report.ambiguous += 1;
                        report.ambiguity_symbols.insert(other);
                    }
                }
            }
        }
        report.lengths.sort_unstable();
        Ok(report)
    }

    pub fn sequences(&self) -> usize {
        self.lengths.len()
    }

    /// True when every sequence has the same length.
    pub fn is_aligned(&self) -> bool {
        self.lengths.first() == self.lengths.last()
    }

    /// A + C + G + T + ambiguities.
    pub fn total_bases(&self) -> usize {
        self.a + self.c + self.g + self.t + self.ambiguous
    }

    /// Length percentile truncated to whole bases, `p` in [0, 100].
    pub fn length_percentile(&self, p: f64) -> usize {
        interpolated_percentile(&self.lengths, p) as usize
    }

    fn pct(&self, count: usize) -> f64 {
        let total = self.total_bases();
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        }
    }

    /// Human-readable report for `label` (usually the input path).
    pub fn render(&self, label: &str) -> String {
        let mut out = String::new();
        let sd = sample_sd(&self.lengths)
            .map(|sd| format!("{sd:.2}"))
            .unwrap_or_else(|| "NA".to_string());

        writeln!(out, "File: {label}").unwrap();
        writeln!(out, "  {}", if self.is_aligned() { "Aligned" } else { "Not aligned" }).unwrap();
        writeln!(out).unwrap();
        writeln!(out, "Number of sequences: {}", self.sequences()).unwrap();
        writeln!(out).unwrap();
        if self.lengths.is_empty() {
            return out;
        }
        writeln!(out, "Shortest sequence:      {} bp", self.lengths[0]).unwrap();
        writeln!(out, "  5th percentile:       {} bp", self.length_percentile(5.0)).unwrap();
        writeln!(out, "  25th percentile:      {} bp", self.length_percentile(25.0)).unwrap();
        writeln!(out, "  Median:               {} bp", self.length_percentile(50.0)).unwrap();
        writeln!(out, "Average length:         {:.2} bp", mean(&self.lengths)).unwrap();
        writeln!(out, "  Standard deviation:   {sd} bp").unwrap();
        writeln!(out, "  75th percentile:      {} bp", self.length_percentile(75.0)).unwrap();
        writeln!(out, "  95th percentile:      {} bp", self.length_percentile(95.0)).unwrap();
        writeln!(out, "Longest sequence:       {} bp", self.lengths[self.lengths.len() - 1]).unwrap();
        writeln!(out).unwrap();
        writeln!(out, "Base composition:").unwrap();
        for (base, count) in [('A', self.a), ('C', self.c), ('G', self.g), ('T', self.t)] {
            writeln!(out, "  {base}:           {count} bp\t{:.2} %", self.pct(count)).unwrap();
        }
        if self.ambiguous > 0 {
            let symbols: Vec<String> = self.ambiguity_symbols.iter().map(|c| c.to_string()).collect();
            writeln!(
                out,
                "  Ambiguities: {} bp\t{:.2} %. Bases: {}",
                self.ambiguous,
                self.pct(self.ambiguous),
                symbols.join(", ")
            )
            .unwrap();
        } else {
            writeln!(out, "  No ambiguities found").unwrap();
        }
        writeln!(out, "Total bases: {}", self.total_bases()).unwrap();
        out
    }
}
