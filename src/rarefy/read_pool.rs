// src/rarefy/read_pool.rs

use ahash::AHashMap;

use crate::abundance::AbundanceTable;
use crate::error::RarefyError;
use crate::types::FastaRecord;

/// Which part of a record counts as one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingUnit {
    Identifier,
    #[default]
    Sequence,
}

impl SamplingUnit {
    pub fn label(&self) -> &'static str {
        match self {
            SamplingUnit::Identifier => "identifiers",
            SamplingUnit::Sequence => "sequences",
        }
    }
}

/// The multiset of reads available for sampling.
///
/// Read values are interned: `reads` holds one symbol per read and `values`
/// maps symbols back to the identifier or sequence they stand for, so two
/// reads are the same value exactly when their symbols are equal.
#[derive(Debug, Clone)]
pub struct ReadPool {
    reads: Vec<u32>,
    values: Vec<String>,
}

impl ReadPool {
    /// Total number of reads, counting abundance copies.
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Number of distinct read values in the whole pool.
    pub fn distinct(&self) -> usize {
        self.values.len()
    }

    pub fn symbols(&self) -> &[u32] {
        &self.reads
    }

    pub fn value(&self, symbol: u32) -> &str {
        &self.values[symbol as usize]
    }

    /// Read values in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.reads.iter().map(move |&s| self.value(s))
    }

    /// How many reads carry `value`.
    pub fn count_of(&self, value: &str) -> usize {
        self.iter().filter(|v| *v == value).count()
    }
}

/// Expands records into a read pool, repeating each record's identifier or
/// sequence by its abundance (or once without an abundance table).
pub fn build_read_pool(
    records: &[FastaRecord],
    abundance: Option<&AbundanceTable>,
    unit: SamplingUnit,
) -> Result<ReadPool, RarefyError> {
    if records.is_empty() {
        return Err(RarefyError::EmptyInput);
    }

    let mut interned: AHashMap<&str, u32> = AHashMap::new();
    let mut values: Vec<String> = Vec::new();
    let mut reads: Vec<u32> = Vec::with_capacity(records.len());

    for record in records {
        let copies = match abundance {
            Some(table) => table.abundance(&record.id)?,
            None => 1,
        };
        if copies == 0 {
            continue;
        }

        let value = match unit {
            SamplingUnit::Identifier => record.id.as_str(),
            SamplingUnit::Sequence => record.seq.as_str(),
        };
        let symbol = *interned.entry(value).or_insert_with(|| {
            values.push(value.to_string());
            (values.len() - 1) as u32
        });

        reads.extend(std::iter::repeat(symbol).take(copies));
    }

    log::debug!(
        "Built read pool of {} {} ({} distinct) from {} records",
        reads.len(),
        unit.label(),
        values.len(),
        records.len()
    );

    Ok(ReadPool { reads, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<FastaRecord> {
        vec![FastaRecord::new("A", "ACGT"), FastaRecord::new("B", "ACGG")]
    }

    #[test]
    fn sequence_pool_repeats_by_abundance() {
        let table: AbundanceTable = [("A", "3"), ("B", "2")].into_iter().collect();
        let pool = build_read_pool(&records(), Some(&table), SamplingUnit::Sequence).unwrap();

        assert_eq!(pool.len(), 5);
        assert_eq!(pool.distinct(), 2);
        assert_eq!(pool.count_of("ACGT"), 3);
        assert_eq!(pool.count_of("ACGG"), 2);
    }

    #[test]
    fn identifier_pool_without_abundance() {
        let pool = build_read_pool(&records(), None, SamplingUnit::Identifier).unwrap();
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn duplicate_sequences_collapse_in_sequence_mode() {
        let records = vec![
            FastaRecord::new("A", "ACGT"),
            FastaRecord::new("B", "ACGT"),
            FastaRecord::new("C", "TTTT"),
        ];
        let by_seq = build_read_pool(&records, None, SamplingUnit::Sequence).unwrap();
        let by_id = build_read_pool(&records, None, SamplingUnit::Identifier).unwrap();

        assert_eq!((by_seq.len(), by_seq.distinct()), (3, 2));
        assert_eq!((by_id.len(), by_id.distinct()), (3, 3));
        assert_eq!(by_seq.symbols()[0], by_seq.symbols()[1]);
    }

    #[test]
    fn zero_abundance_contributes_nothing() {
        let table: AbundanceTable = [("A", "0"), ("B", "4")].into_iter().collect();
        let pool = build_read_pool(&records(), Some(&table), SamplingUnit::Identifier).unwrap();
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.distinct(), 1);
        assert_eq!(pool.count_of("A"), 0);
    }

    #[test]
    fn missing_and_invalid_abundance() {
        let partial: AbundanceTable = [("A", "3")].into_iter().collect();
        assert!(matches!(
            build_read_pool(&records(), Some(&partial), SamplingUnit::Sequence),
            Err(RarefyError::MissingAbundanceEntry { id }) if id == "B"
        ));

        let bad: AbundanceTable = [("A", "3"), ("B", "2.5")].into_iter().collect();
        assert!(matches!(
            build_read_pool(&records(), Some(&bad), SamplingUnit::Sequence),
            Err(RarefyError::InvalidAbundanceValue { .. })
        ));
    }

    #[test]
    fn empty_records_rejected() {
        assert!(matches!(
            build_read_pool(&[], None, SamplingUnit::Sequence),
            Err(RarefyError::EmptyInput)
        ));
    }
}
