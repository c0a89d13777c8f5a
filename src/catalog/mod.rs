//! Allele/proteoform aggregation core.
//!
//! One [`FeatureCatalog`] per reference feature owns four concurrent
//! indices: alleles, proteoforms, nucleotide variant sites and amino-acid
//! variant sites. Workers submit per-sample variant sets concurrently; the
//! final state is a deterministic function of the sample-to-variants
//! mapping, never of submission order.

pub mod fingerprint;
pub mod records;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeSet;

pub use fingerprint::{
    allele_id, proteoform_id, REFERENCE_ALLELE_ID, REFERENCE_PROTEOFORM_ID,
};
pub use records::{
    AaPosition, AlleleEntry, AminoacidVariant, NucleotideVariant, ProteoformEntry, VariantRecord,
};

/// Concurrent per-feature aggregation state.
///
/// Record creation is at-most-once per fingerprint: the submitter that wins
/// the vacant entry wires the variant sites while still holding the entry
/// guard, so every later submitter observes a fully wired record and only
/// extends its sample set.
#[derive(Debug, Default)]
pub struct FeatureCatalog {
    pub alleles: DashMap<String, AlleleEntry>,
    pub proteoforms: DashMap<String, ProteoformEntry>,
    /// Contig position to alternate content to record.
    pub nucleotide_variants: DashMap<u64, DashMap<String, VariantRecord>>,
    /// Compound amino-acid position to alternate content to record.
    pub aminoacid_variants: DashMap<AaPosition, DashMap<String, VariantRecord>>,
}

impl FeatureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalizes the variant set, interns the allele and assigns the
    /// sample to it. Returns the allele id.
    pub fn submit_allele(&self, sample: &str, variants: &[NucleotideVariant]) -> String {
        let descriptors: BTreeSet<String> =
            variants.iter().map(NucleotideVariant::descriptor).collect();
        let id = allele_id(&descriptors);
        match self.alleles.entry(id.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().samples.insert(sample.to_string());
            }
            Entry::Vacant(vacant) => {
                for variant in variants {
                    let site = self
                        .nucleotide_variants
                        .entry(variant.position)
                        .or_default();
                    let mut record = site
                        .entry(variant.alternate.clone())
                        .or_insert_with(|| VariantRecord::new(variant.reference.clone()));
                    record.occurrence.insert(id.clone());
                    if variant.is_primary {
                        record.primary = true;
                    }
                }
                vacant.insert(AlleleEntry::new(
                    fingerprint::canonical_token(&descriptors),
                    sample,
                ));
            }
        }
        id
    }

    /// Analogous to [`FeatureCatalog::submit_allele`] for proteoforms and
    /// amino-acid variant sites.
    pub fn submit_proteoform(&self, sample: &str, variants: &[AminoacidVariant]) -> String {
        let descriptors: BTreeSet<String> =
            variants.iter().map(AminoacidVariant::descriptor).collect();
        let id = proteoform_id(&descriptors);
        match self.proteoforms.entry(id.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().samples.insert(sample.to_string());
            }
            Entry::Vacant(vacant) => {
                for variant in variants {
                    let site = self.aminoacid_variants.entry(variant.position).or_default();
                    let mut record = site
                        .entry(variant.alternate.clone())
                        .or_insert_with(|| VariantRecord::new(variant.reference.clone()));
                    record.occurrence.insert(id.clone());
                }
                vacant.insert(ProteoformEntry::new(
                    fingerprint::canonical_token(&descriptors),
                    sample,
                ));
            }
        }
        id
    }

    /// Nucleotide variant site positions in ascending order. The statistics
    /// pass and the document assembly depend on visiting sites in position
    /// order.
    pub fn nucleotide_positions(&self) -> Vec<u64> {
        let mut positions: Vec<u64> = self
            .nucleotide_variants
            .iter()
            .map(|entry| *entry.key())
            .collect();
        positions.sort_unstable();
        positions
    }

    /// Amino-acid variant site positions in ascending numeric order.
    pub fn aminoacid_positions(&self) -> Vec<AaPosition> {
        let mut positions: Vec<AaPosition> = self
            .aminoacid_variants
            .iter()
            .map(|entry| *entry.key())
            .collect();
        positions.sort_unstable();
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snp(position: u64, alternate: &str, reference: &str) -> NucleotideVariant {
        NucleotideVariant {
            position,
            alternate: alternate.to_string(),
            reference: reference.to_string(),
            is_primary: true,
        }
    }

    #[test]
    fn test_reference_allele_for_empty_set() {
        let catalog = FeatureCatalog::new();
        let id = catalog.submit_allele("a", &[]);
        assert_eq!(id, REFERENCE_ALLELE_ID);
        assert!(catalog.nucleotide_variants.is_empty());
        assert_eq!(
            catalog.alleles.get(REFERENCE_ALLELE_ID).unwrap().variants,
            ""
        );
    }

    #[test]
    fn test_same_variants_collapse() {
        let catalog = FeatureCatalog::new();
        let first = catalog.submit_allele("a", &[snp(4, "G", "A"), snp(7, "T", "A")]);
        let second = catalog.submit_allele("b", &[snp(7, "T", "A"), snp(4, "G", "A")]);
        assert_eq!(first, second);
        assert_eq!(catalog.alleles.len(), 1);
        let allele = catalog.alleles.get(&first).unwrap();
        assert_eq!(allele.samples.len(), 2);
        assert_eq!(allele.variants, "G!4;T!7");
    }

    #[test]
    fn test_variant_sites_wired_once() {
        let catalog = FeatureCatalog::new();
        let id = catalog.submit_allele("a", &[snp(4, "G", "A")]);
        catalog.submit_allele("b", &[snp(4, "G", "A")]);
        let site = catalog.nucleotide_variants.get(&4).unwrap();
        let record = site.get("G").unwrap();
        assert_eq!(record.occurrence, BTreeSet::from([id]));
        assert_eq!(record.reference_content, "A");
        assert!(record.primary);
    }

    #[test]
    fn test_distinct_alleles_share_site() {
        let catalog = FeatureCatalog::new();
        let first = catalog.submit_allele("a", &[snp(4, "G", "A")]);
        let second = catalog.submit_allele("b", &[snp(4, "G", "A"), snp(7, "T", "A")]);
        assert_ne!(first, second);
        let site = catalog.nucleotide_variants.get(&4).unwrap();
        let record = site.get("G").unwrap();
        assert_eq!(record.occurrence.len(), 2);
    }

    #[test]
    fn test_concurrent_submissions_converge() {
        use std::sync::Arc;

        let catalog = Arc::new(FeatureCatalog::new());
        let mut handles = Vec::new();
        for worker in 0..8 {
            let catalog = Arc::clone(&catalog);
            handles.push(std::thread::spawn(move || {
                let sample = format!("s{worker}");
                let variants = if worker % 2 == 0 {
                    vec![snp(4, "G", "A"), snp(7, "T", "A")]
                } else {
                    vec![snp(7, "T", "A"), snp(4, "G", "A")]
                };
                catalog.submit_allele(&sample, &variants)
            }));
        }
        let ids: BTreeSet<String> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(catalog.alleles.len(), 1);
        let id = ids.into_iter().next().unwrap();
        assert_eq!(catalog.alleles.get(&id).unwrap().samples.len(), 8);
        for position in [4, 7] {
            let site = catalog.nucleotide_variants.get(&position).unwrap();
            assert_eq!(site.len(), 1);
            for record in site.iter() {
                assert_eq!(record.occurrence, BTreeSet::from([id.clone()]));
            }
        }
    }

    #[test]
    fn test_proteoform_submission() {
        let catalog = FeatureCatalog::new();
        let variants = vec![AminoacidVariant {
            position: AaPosition::new(2, 0),
            alternate: "*".to_string(),
            reference: "K".to_string(),
        }];
        let id = catalog.submit_proteoform("a", &variants);
        assert!(id.starts_with("PF"));
        let site = catalog
            .aminoacid_variants
            .get(&AaPosition::new(2, 0))
            .unwrap();
        assert!(site.get("*").unwrap().occurrence.contains(&id));
    }

    #[test]
    fn test_positions_sorted() {
        let catalog = FeatureCatalog::new();
        catalog.submit_allele("a", &[snp(70, "T", "A"), snp(4, "G", "A"), snp(12, "C", "A")]);
        assert_eq!(catalog.nucleotide_positions(), vec![4, 12, 70]);
    }
}
