//src/abundance.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;

use crate::error::RarefyError;

/// Abundance lookup loaded from a two-column table:
/// ```text
/// <sequence id>\t<abundance>
/// ```
/// Values are kept as written and parsed on lookup, so a malformed count only
/// fails the run when a sequence actually refers to it.
#[derive(Debug, Default, Clone)]
pub struct AbundanceTable {
    entries: AHashMap<String, String>,
}

impl AbundanceTable {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RarefyError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reads whitespace-separated `id count` lines. Blank lines are skipped and
    /// extra columns ignored; a repeated id keeps its last value.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, RarefyError> {
        let mut entries = AHashMap::new();

        for (idx, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let mut fields = line.split_whitespace();
            let Some(id) = fields.next() else {
                continue;
            };
            let Some(value) = fields.next() else {
                return Err(RarefyError::MalformedAbundanceLine {
                    line_no: idx + 1,
                    line: line.trim().to_string(),
                });
            };
            entries.insert(id.to_string(), value.to_string());
        }

        Ok(Self { entries })
    }

    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(id.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Abundance of `id` as a count.
    pub fn abundance(&self, id: &str) -> Result<usize, RarefyError> {
        let value = self
            .entries
            .get(id)
            .ok_or_else(|| RarefyError::MissingAbundanceEntry { id: id.to_string() })?;

        value
            .parse::<usize>()
            .map_err(|_| RarefyError::InvalidAbundanceValue {
                id: id.to_string(),
                value: value.clone(),
            })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AbundanceTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (id, value) in iter {
            table.insert(id, value);
        }
        table
    }
}
