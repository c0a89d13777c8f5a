//! Post-aggregation statistics over alleles, proteoforms and variant sites.
//!
//! Runs single-threaded after every sample has been processed; site
//! iteration is in ascending position order.

use crate::catalog::{AaPosition, FeatureCatalog};
use crate::sequence::{GAP, TERMINATION_AA};
use std::collections::BTreeSet;

/// Formats a fraction of `count / total` as a two-decimal percentage-free
/// frequency string.
fn frequency(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", count as f64 / total as f64)
}

fn percentage(count: usize, denominator: f64) -> String {
    if denominator <= 0.0 {
        return "0.00".to_string();
    }
    format!("{:.2}", 100.0 * count as f64 / denominator)
}

/// Parsed `alt!pos` descriptor of a nucleotide variant.
struct NucleotideDescriptor {
    alternate: String,
    position: u64,
}

fn parse_nucleotide_descriptors(variants: &str) -> Vec<NucleotideDescriptor> {
    variants
        .split(';')
        .filter(|d| !d.is_empty())
        .filter_map(|descriptor| {
            let (alternate, position) = descriptor.split_once('!')?;
            Some(NucleotideDescriptor {
                alternate: alternate.to_string(),
                position: position.parse().ok()?,
            })
        })
        .collect()
}

/// Parsed `alt!P+I` descriptor of an amino-acid variant.
struct AminoacidDescriptor {
    alternate: String,
    position: AaPosition,
}

fn parse_aminoacid_descriptors(variants: &str) -> Vec<AminoacidDescriptor> {
    let mut descriptors: Vec<AminoacidDescriptor> = variants
        .split(';')
        .filter(|d| !d.is_empty())
        .filter_map(|descriptor| {
            let (alternate, position) = descriptor.split_once('!')?;
            Some(AminoacidDescriptor {
                alternate: alternate.to_string(),
                position: position.parse().ok()?,
            })
        })
        .collect();
    descriptors.sort_by_key(|d| d.position);
    descriptors
}

/// Fills the statistics fields of every allele, proteoform and variant
/// record of one feature.
///
/// `feature_length` is the reference span in bases, `translated_length` the
/// translated reference length in residues (0 for non-coding features) and
/// `total_samples` the number of analyzed samples.
pub fn compute_feature_statistics(
    catalog: &FeatureCatalog,
    feature_length: u64,
    translated_length: usize,
    total_samples: usize,
) {
    for mut entry in catalog.alleles.iter_mut() {
        let descriptors = parse_nucleotide_descriptors(&entry.variants);
        let mut substitutions = 0;
        let mut insertions = 0;
        let mut deletions = 0;
        for descriptor in &descriptors {
            if descriptor.alternate.contains(GAP) {
                deletions += 1;
            } else if descriptor.alternate.len() > 1 {
                insertions += 1;
            } else {
                substitutions += 1;
            }
        }
        let positions: BTreeSet<u64> = descriptors.iter().map(|d| d.position).collect();
        let allele = entry.value_mut();
        allele.substitutions = substitutions;
        allele.insertions = insertions;
        allele.deletions = deletions;
        allele.frequency = frequency(allele.samples.len(), total_samples);
        allele.variable_positions = percentage(positions.len(), feature_length as f64);
    }

    let gap = GAP.to_string();
    let termination_symbol = TERMINATION_AA.to_string();
    for mut entry in catalog.proteoforms.iter_mut() {
        let descriptors = parse_aminoacid_descriptors(&entry.variants);
        let mut substitutions = 0;
        let mut deletions = 0;
        let mut insertion_anchors: BTreeSet<u32> = BTreeSet::new();
        let mut previous_deletion: Option<u32> = None;
        let mut first_termination: Option<AaPosition> = None;
        for descriptor in &descriptors {
            if descriptor.alternate == gap {
                // Consecutive deleted residues form one deletion event.
                if previous_deletion != Some(descriptor.position.position - 1) {
                    deletions += 1;
                }
                previous_deletion = Some(descriptor.position.position);
            } else if descriptor.position.insertion > 0 {
                insertion_anchors.insert(descriptor.position.position);
            } else {
                substitutions += 1;
            }
            if descriptor.alternate == termination_symbol && first_termination.is_none() {
                first_termination = Some(descriptor.position);
            }
        }

        let segment_length = first_termination
            .map(|t| t.position as usize)
            .unwrap_or(translated_length);
        let variable = descriptors
            .iter()
            .filter(|d| d.position.position as usize <= segment_length)
            .map(|d| d.position)
            .collect::<BTreeSet<AaPosition>>()
            .len();

        let proteoform = entry.value_mut();
        proteoform.substitutions = substitutions;
        proteoform.insertions = insertion_anchors.len() as u32;
        proteoform.deletions = deletions;
        proteoform.frequency = frequency(proteoform.samples.len(), total_samples);
        proteoform.variable_positions = percentage(variable, segment_length as f64);
        if let Some(termination) = first_termination {
            proteoform.novel_termination_position = termination.to_string();
            proteoform.truncation_percentage = if translated_length > 0 {
                format!(
                    "{:.2}",
                    100.0 * (1.0 - termination.position as f64 / translated_length as f64)
                )
            } else {
                "0.00".to_string()
            };
        }
    }

    // Variant-site frequencies: fraction of samples carrying the variant,
    // through the alleles/proteoforms it occurs in.
    for position in catalog.nucleotide_positions() {
        if let Some(site) = catalog.nucleotide_variants.get(&position) {
            for mut record in site.iter_mut() {
                let mut carriers: BTreeSet<String> = BTreeSet::new();
                for id in &record.occurrence {
                    if let Some(allele) = catalog.alleles.get(id) {
                        carriers.extend(allele.samples.iter().cloned());
                    }
                }
                record.frequency = frequency(carriers.len(), total_samples);
            }
        }
    }
    for position in catalog.aminoacid_positions() {
        if let Some(site) = catalog.aminoacid_variants.get(&position) {
            for mut record in site.iter_mut() {
                let mut carriers: BTreeSet<String> = BTreeSet::new();
                for id in &record.occurrence {
                    if let Some(proteoform) = catalog.proteoforms.get(id) {
                        carriers.extend(proteoform.samples.iter().cloned());
                    }
                }
                record.frequency = frequency(carriers.len(), total_samples);
            }
        }
    }
}
