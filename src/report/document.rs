//! The catalog document: the serialized contract between the engine and its
//! consumers.
//!
//! All maps are ordered so that emitting and re-reading a catalog yields a
//! byte-equal document; amino-acid variant keys are ordered numerically by
//! `(position, insertion)`.

use crate::catalog::records::{AaPosition, AlleleEntry, Annotations, ProteoformEntry, VariantRecord};
use crate::config::Parameters;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Top-level catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub software: String,
    pub date: String,
    pub parameters: Parameters,
    pub excluded_positions: BTreeMap<String, BTreeSet<u64>>,
    pub samples: BTreeMap<String, SampleEntry>,
    pub features: BTreeMap<String, FeatureEntry>,
    /// Contig to position to alternate content to record.
    pub nucleotide_variants: BTreeMap<String, BTreeMap<u64, BTreeMap<String, VariantRecord>>>,
}

/// One analyzed sample; `annotations` carries the per-feature assignments
/// under `AL!<feature>` and `PF!<feature>` keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SampleEntry {
    pub name: String,
    pub annotations: Annotations,
}

/// One reference feature with its aggregated alleles and proteoforms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureEntry {
    pub name: String,
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub is_sense: bool,
    pub is_coding_sequence: bool,
    pub nucleotide_sequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_nucleotide_sequence: Option<String>,
    /// Padded chain sequences by chain id; empty without a structure.
    pub protein_sequences: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    pub annotations: Annotations,
    pub alleles: BTreeMap<String, AlleleEntry>,
    pub proteoforms: BTreeMap<String, ProteoformEntry>,
    pub aminoacid_variants: BTreeMap<AaPosition, BTreeMap<String, VariantRecord>>,
}
