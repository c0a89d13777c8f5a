//! Reference sequence store and feature records. Both are immutable after
//! load and shared freely between worker threads.

use crate::error::{Result, VarcatError};
use crate::sequence;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Holds the reference sequence by contig name.
#[derive(Debug, Default)]
pub struct ReferenceStore {
    contigs: BTreeMap<String, String>,
}

impl ReferenceStore {
    pub fn new(contigs: BTreeMap<String, String>) -> Self {
        ReferenceStore { contigs }
    }

    pub fn contig(&self, name: &str) -> Result<&str> {
        self.contigs
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| VarcatError::Reference(format!("unknown contig '{name}'")))
    }

    pub fn contig_names(&self) -> impl Iterator<Item = &String> {
        self.contigs.keys()
    }

    pub fn contig_length(&self, name: &str) -> Result<u64> {
        Ok(self.contig(name)?.len() as u64)
    }

    /// Subsequence of a contig, 1-based inclusive on both ends.
    pub fn subsequence(&self, contig: &str, start: u64, end: u64) -> Result<String> {
        let sequence = self.contig(contig)?;
        if start < 1 || end < start || end as usize > sequence.len() {
            return Err(VarcatError::Reference(format!(
                "subsequence [{start}, {end}] out of bounds for contig '{contig}' of length {}",
                sequence.len()
            )));
        }
        Ok(sequence[(start - 1) as usize..end as usize].to_string())
    }
}

/// A reference feature subject to analysis: a gene, a plasmid or a whole
/// contig. Coordinates are normalized at construction so `start <= end`
/// always holds, with `is_sense` capturing directionality.
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub contig: String,
    /// 1-based inclusive.
    pub start: u64,
    /// 1-based inclusive.
    pub end: u64,
    pub is_sense: bool,
    pub is_coding_sequence: bool,
    /// Optional structure file for coding features.
    pub structure_path: Option<PathBuf>,
    pub annotations: BTreeMap<String, String>,
}

impl Feature {
    pub fn new(
        name: impl Into<String>,
        contig: impl Into<String>,
        start: u64,
        end: u64,
        is_sense: bool,
    ) -> Result<Self> {
        let name = name.into();
        if start < 1 || end < start {
            return Err(VarcatError::Reference(format!(
                "feature '{name}' has impossible coordinates ({start}, {end})"
            )));
        }
        Ok(Feature {
            name,
            contig: contig.into(),
            start,
            end,
            is_sense,
            is_coding_sequence: false,
            structure_path: None,
            annotations: BTreeMap::new(),
        })
    }

    /// Length of the feature on the reference, in bases.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Reference nucleotide sequence of this feature, always in contig
    /// orientation.
    pub fn reference_sequence(&self, store: &ReferenceStore) -> Result<String> {
        store.subsequence(&self.contig, self.start, self.end)
    }

    /// Translated reference sequence in the feature's reading direction,
    /// with termination and incomplete codons included.
    pub fn translated_reference_sequence(&self, store: &ReferenceStore) -> Result<String> {
        let nucleotide = self.reference_sequence(store)?;
        sequence::translate(&nucleotide, true, true, self.is_sense)
    }
}

/// The sample sentinel carrying the unmodified reference itself.
pub const REFERENCE_SAMPLE: &str = "reference";

/// One analyzed sample: a name and its variant-call source.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub vcf_path: PathBuf,
    pub annotations: BTreeMap<String, String>,
}
