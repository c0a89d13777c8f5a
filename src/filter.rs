//! Accept/reject decision for variant-call records.

use crate::io::vcf::VariantCall;
use std::collections::{BTreeMap, BTreeSet};

/// Zygosity classification of an accepted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zygosity {
    Homozygous,
    Heterozygous,
}

/// Per-site thresholds applied to every record of every sample.
#[derive(Debug, Clone)]
pub struct VariantFilter {
    pub min_coverage: f64,
    pub min_quality: f64,
    pub min_hom_frequency: f64,
    pub min_het_frequency: f64,
    pub max_het_frequency: f64,
    /// Contig name to 1-based positions removed from analysis.
    pub excluded_positions: BTreeMap<String, BTreeSet<u64>>,
}

impl VariantFilter {
    /// Returns the zygosity of an accepted record, or `None` when the record
    /// is rejected. A record passes when it meets the coverage and quality
    /// thresholds and its frequency falls into the homozygous or the
    /// heterozygous window; frequencies above the heterozygous window are
    /// classified homozygous.
    pub fn evaluate(&self, call: &VariantCall) -> Option<Zygosity> {
        if call.depth < self.min_coverage || call.quality < self.min_quality {
            return None;
        }
        if self.is_excluded(&call.contig, call.position) {
            return None;
        }
        if call.frequency >= self.min_hom_frequency {
            return Some(Zygosity::Homozygous);
        }
        // Above the heterozygous window the call counts as homozygous, and a
        // homozygous call below the homozygous threshold is dropped.
        if call.frequency > self.max_het_frequency {
            return None;
        }
        if call.frequency >= self.min_het_frequency {
            return Some(Zygosity::Heterozygous);
        }
        None
    }

    pub fn is_excluded(&self, contig: &str, position: u64) -> bool {
        self.excluded_positions
            .get(contig)
            .is_some_and(|positions| positions.contains(&position))
    }
}
