//! Per-sample feature reconstruction.
//!
//! For one (sample, feature) pair: rebuild the sample's nucleotide sequence
//! from the reference and its accepted variants, derive the nucleotide
//! variant descriptors, and for coding features derive the amino-acid
//! variants by translating and aligning against the translated reference.

use crate::align::{global_aminoacid_alignment, MarginMode};
use crate::catalog::{AaPosition, AminoacidVariant, FeatureCatalog, NucleotideVariant};
use crate::error::Result;
use crate::io::vcf::VariantCall;
use crate::reference::Feature;
use crate::sequence::{self, GAP};
use rustc_hash::FxHashMap;

/// Gap penalties for the protein alignment of a reconstructed feature
/// against its translated reference.
const PROTEIN_GAP_OPEN: i32 = 4;
const PROTEIN_GAP_EXTEND: i32 = 3;

/// Immutable per-feature context shared by all workers, plus the feature's
/// concurrent aggregation state.
pub struct FeatureContext {
    pub feature: Feature,
    /// Reference subsequence of the feature in contig orientation.
    pub reference_sequence: String,
    /// Translated reference, present for coding features.
    pub translated_reference: Option<String>,
    pub catalog: FeatureCatalog,
}

/// Variant sets of one sample on one feature, ready for submission.
#[derive(Debug, Default)]
pub struct FeatureObservation {
    pub nucleotide_variants: Vec<NucleotideVariant>,
    pub aminoacid_variants: Vec<AminoacidVariant>,
}

/// Reconstructs one sample's view of one feature from its accepted calls.
///
/// Calls outside the feature's span are ignored; where a sample carries
/// several accepted alternates at one site, the primary one is applied.
pub fn reconstruct_feature(
    context: &FeatureContext,
    accepted_calls: &[VariantCall],
) -> Result<FeatureObservation> {
    let feature = &context.feature;
    let mut by_position: FxHashMap<u64, &VariantCall> = FxHashMap::default();
    for call in accepted_calls {
        if call.contig != feature.contig
            || call.position < feature.start
            || call.position > feature.end
        {
            continue;
        }
        let replace = by_position.get(&call.position).map_or(true, |existing| {
            !existing.is_primary && (call.is_primary || call.frequency > existing.frequency)
        });
        if replace {
            by_position.insert(call.position, call);
        }
    }
    let mut applied: Vec<&VariantCall> = by_position.into_values().collect();
    applied.sort_by_key(|call| call.position);

    // One cell per reference position; insertions extend their anchor cell,
    // deletions mark covered cells with the gap symbol.
    let mut cells: Vec<String> = context
        .reference_sequence
        .chars()
        .map(String::from)
        .collect();
    let mut nucleotide_variants = Vec::with_capacity(applied.len());
    for call in &applied {
        let offset = (call.position - feature.start) as usize;
        if call.alternate_content.len() > call.reference_content.len() {
            cells[offset] = call.alternate_content.clone();
        } else {
            for (k, symbol) in call.alternate_content.chars().enumerate() {
                if offset + k < cells.len() {
                    cells[offset + k] = symbol.to_string();
                }
            }
        }
        nucleotide_variants.push(NucleotideVariant {
            position: call.position,
            alternate: call.alternate_content.clone(),
            reference: call.reference_content.clone(),
            is_primary: call.is_primary,
        });
    }

    let mut observation = FeatureObservation {
        nucleotide_variants,
        aminoacid_variants: Vec::new(),
    };

    if let Some(translated_reference) = &context.translated_reference {
        let reconstructed: String = cells.concat();
        let degapped: String = reconstructed.chars().filter(|c| *c != GAP).collect();
        let sample_protein = sequence::translate(&degapped, true, true, feature.is_sense)?;
        observation.aminoacid_variants =
            derive_aminoacid_variants(translated_reference, &sample_protein)?;
    }

    Ok(observation)
}

/// Aligns the sample protein against the translated reference and extracts
/// amino-acid variants from the alignment columns.
///
/// The left margin is forbidden (the sample cannot extend before the
/// reference start) and the right margin penalized. Positions are
/// `P+I`: the reference residue index plus the running insertion offset.
pub fn derive_aminoacid_variants(
    translated_reference: &str,
    sample_protein: &str,
) -> Result<Vec<AminoacidVariant>> {
    let alignment = global_aminoacid_alignment(
        translated_reference,
        sample_protein,
        PROTEIN_GAP_OPEN,
        PROTEIN_GAP_EXTEND,
        MarginMode::Forbid,
        MarginMode::Penalize,
    )?;
    let mut variants = Vec::new();
    let mut consecutive_insertions = 0u32;
    let mut total_insertions = 0usize;
    for (column, (reference, sample)) in alignment
        .gapped_a
        .chars()
        .zip(alignment.gapped_b.chars())
        .enumerate()
    {
        if reference == sample {
            consecutive_insertions = 0;
            continue;
        }
        if sample == GAP {
            consecutive_insertions = 0;
        } else if reference == GAP {
            consecutive_insertions += 1;
            total_insertions += 1;
        } else {
            consecutive_insertions = 0;
        }
        let position = (column + 1).saturating_sub(total_insertions) as u32;
        variants.push(AminoacidVariant {
            position: AaPosition::new(position, consecutive_insertions),
            alternate: sample.to_string(),
            reference: reference.to_string(),
        });
    }
    Ok(variants)
}
