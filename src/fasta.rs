//src/fasta.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use flate2::read::MultiGzDecoder;

use crate::error::RarefyError;
use crate::types::FastaRecord;

/// Minimal FASTA reader that also supports .gz
///
/// Identifiers are the first whitespace-separated word of the header. Sequence
/// lines are concatenated with surrounding whitespace stripped.
pub fn read_fasta_records<P: AsRef<Path>>(path: P) -> Result<Vec<FastaRecord>, RarefyError> {
    let path = path.as_ref();
    let f = File::open(path)?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    parse_fasta(reader)
}

/// Parses FASTA text from any buffered reader.
pub fn parse_fasta<R: BufRead>(mut reader: R) -> Result<Vec<FastaRecord>, RarefyError> {
    let mut records = Vec::new();
    let mut current: Option<FastaRecord> = None;
    let mut line = String::new();
    let mut line_no = 0;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break; // EOF
        }
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('>') {
            let id = header.split_whitespace().next().unwrap_or("");
            if id.is_empty() {
                return Err(RarefyError::MalformedFasta {
                    line_no,
                    reason: "header without identifier".to_string(),
                });
            }
            if let Some(done) = current.take() {
                records.push(done);
            }
            current = Some(FastaRecord::new(id, String::new()));
        } else {
            match current.as_mut() {
                Some(record) => record.seq.push_str(trimmed),
                None => {
                    return Err(RarefyError::MalformedFasta {
                        line_no,
                        reason: "sequence data before the first '>' header".to_string(),
                    })
                }
            }
        }
    }

    if let Some(done) = current {
        records.push(done);
    }
    Ok(records)
}

/// Collapses records that share an identifier. The last occurrence's sequence
/// wins but keeps the position of the first occurrence.
pub fn dedup_by_id(records: Vec<FastaRecord>) -> Vec<FastaRecord> {
    let mut position: AHashMap<String, usize> = AHashMap::with_capacity(records.len());
    let mut unique: Vec<FastaRecord> = Vec::with_capacity(records.len());

    for record in records {
        match position.get(&record.id) {
            Some(&idx) => {
                log::warn!("Duplicate identifier '{}', keeping its last sequence", record.id);
                unique[idx].seq = record.seq;
            }
            None => {
                position.insert(record.id.clone(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    const SAMPLE: &str = ">A first read\nACGT\nAC\n\n>B\nACGG\n";

    #[test]
    fn parses_multiline_records() {
        let records = parse_fasta(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(
            records,
            vec![FastaRecord::new("A", "ACGTAC"), FastaRecord::new("B", "ACGG")]
        );
    }

    #[test]
    fn rejects_sequence_before_header() {
        let err = parse_fasta(Cursor::new("ACGT\n>A\nAC\n")).unwrap_err();
        assert!(matches!(err, RarefyError::MalformedFasta { line_no: 1, .. }));
    }

    #[test]
    fn rejects_empty_identifier() {
        let err = parse_fasta(Cursor::new(">A\nAC\n>  \nGG\n")).unwrap_err();
        assert!(matches!(err, RarefyError::MalformedFasta { line_no: 3, .. }));
    }

    #[test]
    fn reads_plain_and_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("reads.fasta");
        std::fs::write(&plain, SAMPLE).unwrap();

        let gz = dir.path().join("reads.fasta.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let a = read_fasta_records(&plain).unwrap();
        let b = read_fasta_records(&gz).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_fasta_records("/nonexistent/reads.fasta").unwrap_err();
        assert!(matches!(err, RarefyError::Io(_)));
    }

    #[test]
    fn dedup_keeps_first_position_last_sequence() {
        let records = vec![
            FastaRecord::new("A", "AAAA"),
            FastaRecord::new("B", "CCCC"),
            FastaRecord::new("A", "GGGG"),
        ];
        let unique = dedup_by_id(records);
        assert_eq!(
            unique,
            vec![FastaRecord::new("A", "GGGG"), FastaRecord::new("B", "CCCC")]
        );
    }
}
