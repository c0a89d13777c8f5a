//! Reference sequence reader.
//!
//! Produces a header-to-sequence mapping; sequence names are the first
//! whitespace-delimited token of the header line.

use crate::error::{Result, VarcatError};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reads a FASTA file into a name-to-sequence map. Comment lines starting
/// with `;` are skipped.
pub fn read_fasta(path: &Path) -> Result<BTreeMap<String, String>> {
    let file = File::open(path).map_err(|e| VarcatError::io(path, e))?;
    read_fasta_from(BufReader::new(file))
}

pub fn read_fasta_from<R: BufRead>(reader: R) -> Result<BTreeMap<String, String>> {
    let mut sequences = BTreeMap::new();
    let mut name: Option<String> = None;
    let mut sequence = String::new();
    for line in reader.lines() {
        let line = line.map_err(|e| VarcatError::io("<fasta>", e))?;
        let line = line.trim_end();
        if let Some(header) = line.strip_prefix('>') {
            if let Some(previous) = name.take() {
                sequences.insert(previous, std::mem::take(&mut sequence));
            }
            let id = header
                .split_whitespace()
                .next()
                .ok_or_else(|| VarcatError::Reference("empty fasta header".to_string()))?;
            name = Some(id.to_string());
        } else if !line.starts_with(';') && !line.is_empty() {
            if name.is_none() {
                return Err(VarcatError::Reference(
                    "fasta sequence data before first header".to_string(),
                ));
            }
            sequence.push_str(line.trim());
        }
    }
    if let Some(last) = name {
        sequences.insert(last, sequence);
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_two_records() {
        let data = ">chr1 circular\nACGT\nACGT\n>chr2\nTTTT\n";
        let map = read_fasta_from(Cursor::new(data)).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["chr1"], "ACGTACGT");
        assert_eq!(map["chr2"], "TTTT");
    }

    #[test]
    fn test_comment_lines_skipped() {
        let data = ">c\n; comment\nACGT\n";
        let map = read_fasta_from(Cursor::new(data)).unwrap();
        assert_eq!(map["c"], "ACGT");
    }

    #[test]
    fn test_data_before_header_is_error() {
        assert!(read_fasta_from(Cursor::new("ACGT\n")).is_err());
    }
}
