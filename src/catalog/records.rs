//! Catalog record types shared by the aggregator, the statistics pass and
//! the emitted document.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Compound amino-acid position `P+I`: `position` is the 1-based residue
/// index on the translated reference, `insertion` the number of inserted
/// residues after it (0 for substitutions and deletions). Ordered
/// numerically, serialized as `P+I`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AaPosition {
    pub position: u32,
    pub insertion: u32,
}

impl AaPosition {
    pub fn new(position: u32, insertion: u32) -> Self {
        AaPosition {
            position,
            insertion,
        }
    }
}

impl fmt::Display for AaPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.position, self.insertion)
    }
}

impl FromStr for AaPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (p, i) = s
            .split_once('+')
            .ok_or_else(|| format!("invalid amino-acid position '{s}'"))?;
        Ok(AaPosition {
            position: p
                .parse()
                .map_err(|_| format!("invalid amino-acid position '{s}'"))?,
            insertion: i
                .parse()
                .map_err(|_| format!("invalid amino-acid position '{s}'"))?,
        })
    }
}

impl Serialize for AaPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AaPosition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AaPositionVisitor;
        impl Visitor<'_> for AaPositionVisitor {
            type Value = AaPosition;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an amino-acid position of the form P+I")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<AaPosition, E> {
                value.parse().map_err(E::custom)
            }
        }
        deserializer.deserialize_str(AaPositionVisitor)
    }
}

/// One allele: an equivalence class of samples sharing a nucleotide-variant
/// set on a feature. Statistics fields are filled after all samples have
/// been processed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlleleEntry {
    /// Canonical `alt!pos[;alt!pos…]` descriptor token; empty for the
    /// reference allele.
    pub variants: String,
    pub samples: BTreeSet<String>,
    pub frequency: String,
    pub substitutions: u32,
    pub insertions: u32,
    pub deletions: u32,
    pub variable_positions: String,
}

impl AlleleEntry {
    pub fn new(variants: String, sample: &str) -> Self {
        AlleleEntry {
            variants,
            samples: BTreeSet::from([sample.to_string()]),
            frequency: String::new(),
            substitutions: 0,
            insertions: 0,
            deletions: 0,
            variable_positions: String::new(),
        }
    }
}

/// One proteoform: an equivalence class of samples sharing an
/// amino-acid-variant set on a coding feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProteoformEntry {
    /// Canonical `alt!P+I[;alt!P+I…]` descriptor token.
    pub variants: String,
    pub samples: BTreeSet<String>,
    pub frequency: String,
    pub substitutions: u32,
    pub insertions: u32,
    pub deletions: u32,
    pub variable_positions: String,
    /// First novel termination `P+I`, or `N/A` when the proteoform
    /// terminates where the reference does.
    pub novel_termination_position: String,
    pub truncation_percentage: String,
}

impl ProteoformEntry {
    pub fn new(variants: String, sample: &str) -> Self {
        ProteoformEntry {
            variants,
            samples: BTreeSet::from([sample.to_string()]),
            frequency: String::new(),
            substitutions: 0,
            insertions: 0,
            deletions: 0,
            variable_positions: String::new(),
            novel_termination_position: "N/A".to_string(),
            truncation_percentage: "0.00".to_string(),
        }
    }
}

/// One alternate content observed at a variant site, with the ids of the
/// alleles or proteoforms it participates in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    pub reference_content: String,
    /// Fraction of analyzed samples carrying this variant, two decimals;
    /// filled by the statistics pass.
    pub frequency: String,
    /// Whether this alternate was the primary call in at least one sample.
    pub primary: bool,
    pub occurrence: BTreeSet<String>,
}

impl VariantRecord {
    pub fn new(reference_content: String) -> Self {
        VariantRecord {
            reference_content,
            frequency: String::new(),
            primary: false,
            occurrence: BTreeSet::new(),
        }
    }
}

/// Per-sample variant observation handed to the aggregator: one accepted
/// nucleotide variant of one sample on one feature.
#[derive(Debug, Clone)]
pub struct NucleotideVariant {
    /// 1-based position on the contig.
    pub position: u64,
    /// Padded alternate content over `ACGTN-`.
    pub alternate: String,
    pub reference: String,
    pub is_primary: bool,
}

impl NucleotideVariant {
    pub fn descriptor(&self) -> String {
        format!("{}!{}", self.alternate, self.position)
    }
}

/// One derived amino-acid variant of one sample on one coding feature.
#[derive(Debug, Clone)]
pub struct AminoacidVariant {
    pub position: AaPosition,
    /// One-letter alternate residue, `-` for deletions, `*` for novel
    /// terminations.
    pub alternate: String,
    pub reference: String,
}

impl AminoacidVariant {
    pub fn descriptor(&self) -> String {
        format!("{}!{}", self.alternate, self.position)
    }
}

/// Maps annotation keys to values; used for samples, features and entries.
pub type Annotations = BTreeMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aa_position_ordering_is_numeric() {
        let mut positions = vec![
            AaPosition::new(10, 0),
            AaPosition::new(2, 1),
            AaPosition::new(2, 0),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![
                AaPosition::new(2, 0),
                AaPosition::new(2, 1),
                AaPosition::new(10, 0),
            ]
        );
    }

    #[test]
    fn test_aa_position_round_trip() {
        let position = AaPosition::new(17, 3);
        let json = serde_json::to_string(&position).unwrap();
        assert_eq!(json, "\"17+3\"");
        let back: AaPosition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, position);
    }

    #[test]
    fn test_descriptors() {
        let nucleotide = NucleotideVariant {
            position: 4,
            alternate: "G".to_string(),
            reference: "A".to_string(),
            is_primary: true,
        };
        assert_eq!(nucleotide.descriptor(), "G!4");
        let aminoacid = AminoacidVariant {
            position: AaPosition::new(2, 0),
            alternate: "*".to_string(),
            reference: "K".to_string(),
        };
        assert_eq!(aminoacid.descriptor(), "*!2+0");
    }
}
