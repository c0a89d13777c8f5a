//! Proteoform-structure reconciliation.
//!
//! Maps the translated reference sequence of a coding feature onto the chain
//! sequences of its allocated structure, pads chains where the structure
//! misses residues and renumbers structure residues so that downstream
//! consumers can index them against the reference translation.

use crate::align::{global_aminoacid_alignment, MarginMode};
use crate::error::{Result, VarcatError};
use crate::io::pdb::PdbStructure;
use crate::sequence::GAP;
use log::warn;
use std::collections::BTreeMap;

/// Gap penalties for chain-to-translation alignment.
const CHAIN_GAP_OPEN: i32 = 5;
const CHAIN_GAP_EXTEND: i32 = 4;

/// Divergent-segment count above which a structure is reported as possibly
/// inappropriate for its feature.
const DIVERGENT_SEGMENT_WARNING: usize = 2;

/// Result of reconciling one structure against a feature translation.
#[derive(Debug, Clone)]
pub struct ReconciledStructure {
    /// Padded chain sequence per chain id: uppercase where the structure has
    /// a residue, lowercase where only the reference translation has one.
    pub protein_sequences: BTreeMap<String, String>,
    /// Renumbered structure text.
    pub structure_text: String,
}

/// Aligns every chain of `structure` against `translated_reference`,
/// producing padded chain sequences and renumbering the structure residues
/// 1..N over the uppercase positions of each padded chain.
///
/// A gap in the aligned translated reference is fatal: the chain cannot be
/// longer than the reference translation in regions absent from it.
pub fn reconcile_structure(
    feature_name: &str,
    mut structure: PdbStructure,
    translated_reference: &str,
) -> Result<ReconciledStructure> {
    let mut protein_sequences = BTreeMap::new();
    let chain_sequences = structure.chain_sequences();
    for (chain_id, chain_sequence) in &chain_sequences {
        let alignment = global_aminoacid_alignment(
            chain_sequence,
            translated_reference,
            CHAIN_GAP_OPEN,
            CHAIN_GAP_EXTEND,
            MarginMode::Free,
            MarginMode::Free,
        )?;
        let mut padded = String::with_capacity(alignment.gapped_a.len());
        for (chain_symbol, reference_symbol) in
            alignment.gapped_a.chars().zip(alignment.gapped_b.chars())
        {
            if chain_symbol == GAP {
                padded.push(reference_symbol.to_ascii_lowercase());
            } else if reference_symbol == GAP {
                return Err(VarcatError::Bio(format!(
                    "failed to allocate structure to feature '{feature_name}': gaps in the \
                     aligned translated reference at chain '{chain_id}'"
                )));
            } else {
                padded.push(chain_symbol);
            }
        }

        let numbers: Vec<u32> = (1..=padded.chars().filter(|c| c.is_ascii_uppercase()).count())
            .map(|n| n as u32)
            .collect();
        structure.renumber_chain(*chain_id, &numbers);

        let divergent = count_divergent_segments(&padded);
        if divergent > DIVERGENT_SEGMENT_WARNING {
            warn!(
                "Feature {feature_name} disaccords in {divergent} segments with allocated \
                 structure chain {chain_id}: the structure may be inappropriate."
            );
        }
        protein_sequences.insert(chain_id.to_string(), padded);
    }
    Ok(ReconciledStructure {
        protein_sequences,
        structure_text: structure.to_pdb_string(),
    })
}

/// Splits the padded sequence before every uppercase letter and counts
/// segments longer than one symbol.
fn count_divergent_segments(padded: &str) -> usize {
    let mut segments = Vec::new();
    let mut current = String::new();
    for symbol in padded.chars() {
        if symbol.is_ascii_uppercase() && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        current.push(symbol);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments.into_iter().filter(|s| s.len() > 1).count()
}
