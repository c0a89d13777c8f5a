//! Feature annotation reader (GFF3 subset).
//!
//! Exposes typed records with attribute-based lookup; the engine only needs
//! seqid, coordinates, strand and the attribute map.

use crate::error::{Result, VarcatError};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One annotation record. `start`/`end` are 1-based inclusive as annotated.
#[derive(Debug, Clone)]
pub struct AnnotationRecord {
    pub seqid: String,
    pub feature_type: String,
    pub start: u64,
    pub end: u64,
    pub is_sense: bool,
    pub attributes: BTreeMap<String, String>,
}

/// Parsed annotation file.
#[derive(Debug, Default)]
pub struct AnnotationTable {
    records: Vec<AnnotationRecord>,
}

impl AnnotationTable {
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| VarcatError::io(path, e))?;
        Self::read_from(BufReader::new(file))
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| VarcatError::io("<gff>", e))?;
            if line.starts_with("##FASTA") {
                break;
            }
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 9 {
                return Err(VarcatError::Reference(format!(
                    "malformed annotation record with {} columns",
                    fields.len()
                )));
            }
            let start: u64 = fields[3].parse().map_err(|_| {
                VarcatError::Reference(format!("invalid feature start '{}'", fields[3]))
            })?;
            let end: u64 = fields[4].parse().map_err(|_| {
                VarcatError::Reference(format!("invalid feature end '{}'", fields[4]))
            })?;
            let mut attributes = BTreeMap::new();
            for pair in fields[8].split(';') {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }
                if let Some((key, value)) = pair.split_once('=') {
                    attributes.insert(key.to_string(), value.to_string());
                }
            }
            records.push(AnnotationRecord {
                seqid: fields[0].to_string(),
                feature_type: fields[2].to_string(),
                start,
                end,
                is_sense: fields[6] != "-",
                attributes,
            });
        }
        Ok(AnnotationTable { records })
    }

    /// All records whose attribute `key` equals `value`.
    pub fn select_by_attribute(&self, key: &str, value: &str) -> Vec<&AnnotationRecord> {
        self.records
            .iter()
            .filter(|r| r.attributes.get(key).map(String::as_str) == Some(value))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
