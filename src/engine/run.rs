//! Main BUILD run function.
//!
//! Coordinates the whole pipeline: configuration, reference loading,
//! parallel per-sample analysis, aggregation, structure reconciliation,
//! statistics and catalog emission.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use super::reconstruct::{reconstruct_feature, FeatureContext};
use crate::catalog::{records::Annotations, FeatureCatalog, VariantRecord};
use crate::config::BuildConfiguration;
use crate::filter::VariantFilter;
use crate::io::{fasta, gff::AnnotationTable, pdb::PdbStructure, vcf};
use crate::reference::{ReferenceStore, Sample};
use crate::report::{self, CatalogDocument, FeatureEntry, SampleEntry};
use crate::sequence::TERMINATION_AA;
use crate::stats;
use crate::structure::reconcile_structure;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to the JSON build configuration
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

/// Per-sample outcome of the parallel phase: the allele and proteoform
/// assignment for every analyzed feature.
struct SampleResult {
    name: String,
    annotations: Annotations,
    /// Feature name to (allele id, proteoform id).
    assignments: BTreeMap<String, (String, Option<String>)>,
}

pub fn run(args: BuildArgs) -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init()
        .ok();

    let configuration = BuildConfiguration::from_path(&args.config)
        .context("Failed to load build configuration")?;
    let num_threads = if configuration.threads == 0 {
        num_cpus::get()
    } else {
        configuration.threads
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to build thread pool")?;

    info!("Loading reference sequences and annotation...");
    let store = ReferenceStore::new(fasta::read_fasta(&configuration.reference_fasta)?);
    let annotation = AnnotationTable::read(&configuration.reference_annotation)?;
    let features = configuration.resolve_features(&annotation, &store)?;
    info!(
        "Analyzing {} features across {} samples on {} threads.",
        features.len(),
        configuration.samples.len(),
        num_threads
    );

    let mut contexts = Vec::with_capacity(features.len());
    for feature in features {
        let reference_sequence = feature.reference_sequence(&store)?;
        let translated_reference = if feature.is_coding_sequence {
            let translated = feature.translated_reference_sequence(&store)?;
            check_translation(&feature.name, &translated);
            Some(translated)
        } else {
            None
        };
        contexts.push(FeatureContext {
            feature,
            reference_sequence,
            translated_reference,
            catalog: FeatureCatalog::new(),
        });
    }

    let filter = effective_filter(&configuration, &contexts);

    let bar = ProgressBar::new(configuration.samples.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap(),
    );

    let sample_results: Vec<SampleResult> = pool.install(|| {
        configuration
            .samples
            .par_iter()
            .map(|sample| {
                let result = analyze_sample(sample, &contexts, &filter);
                bar.inc(1);
                result
            })
            .collect::<Result<Vec<_>>>()
    })?;
    bar.finish();

    info!("Reconciling structures and computing statistics...");
    let total_samples = sample_results.len();
    let mut reconciled: BTreeMap<String, (BTreeMap<String, String>, String)> = BTreeMap::new();
    for context in &contexts {
        if let (Some(path), Some(translated)) = (
            context.feature.structure_path.as_ref(),
            context.translated_reference.as_ref(),
        ) {
            let structure = PdbStructure::read(path)?;
            let outcome = reconcile_structure(&context.feature.name, structure, translated)?;
            reconciled.insert(
                context.feature.name.clone(),
                (outcome.protein_sequences, outcome.structure_text),
            );
        }
        stats::compute_feature_statistics(
            &context.catalog,
            context.feature.length(),
            context
                .translated_reference
                .as_ref()
                .map_or(0, String::len),
            total_samples,
        );
    }

    let document = assemble_document(&configuration, &contexts, &sample_results, reconciled);
    report::write_catalog(&document, &configuration.output_file)?;
    info!(
        "Catalog written to {}.",
        configuration.output_file.display()
    );
    Ok(())
}

/// Reads and filters one sample, then runs its (sample, feature)
/// reconstruction jobs in parallel.
fn analyze_sample(
    sample: &Sample,
    contexts: &[FeatureContext],
    filter: &VariantFilter,
) -> Result<SampleResult> {
    let calls = vcf::read_sample_calls(&sample.vcf_path)?;
    let accepted: Vec<vcf::VariantCall> = calls
        .into_iter()
        .filter(|call| filter.evaluate(call).is_some())
        .collect();

    let assignments = contexts
        .par_iter()
        .map(|context| {
            let observation = reconstruct_feature(context, &accepted)?;
            let allele_id = context
                .catalog
                .submit_allele(&sample.name, &observation.nucleotide_variants);
            let proteoform_id = context.translated_reference.as_ref().map(|_| {
                context
                    .catalog
                    .submit_proteoform(&sample.name, &observation.aminoacid_variants)
            });
            Ok((context.feature.name.clone(), (allele_id, proteoform_id)))
        })
        .collect::<Result<BTreeMap<String, (String, Option<String>)>>>()?;
    Ok(SampleResult {
        name: sample.name.clone(),
        annotations: sample.annotations.clone(),
        assignments,
    })
}

/// Remaps feature-name keys of the excluded-position mapping onto their
/// contigs so the filter only has to know contigs.
fn effective_filter(
    configuration: &BuildConfiguration,
    contexts: &[FeatureContext],
) -> VariantFilter {
    let mut filter = configuration.variant_filter();
    let by_name: BTreeMap<&str, &str> = contexts
        .iter()
        .map(|c| (c.feature.name.as_str(), c.feature.contig.as_str()))
        .collect();
    let mut remapped: BTreeMap<String, BTreeSet<u64>> = BTreeMap::new();
    for (key, positions) in &filter.excluded_positions {
        let contig = by_name.get(key.as_str()).copied().unwrap_or(key.as_str());
        remapped
            .entry(contig.to_string())
            .or_default()
            .extend(positions.iter().copied());
    }
    filter.excluded_positions = remapped;
    filter
}

/// Warns about translations that terminate early or not at all.
fn check_translation(feature_name: &str, translated: &str) {
    if let Some(body) = translated.strip_suffix(TERMINATION_AA) {
        if body.contains(TERMINATION_AA) {
            warn!(
                "Feature {feature_name} contains internal terminations in its translated \
                 reference sequence."
            );
        }
    } else {
        warn!(
            "Feature {feature_name} does not end with a translated termination and may be \
             inappropriate."
        );
    }
}

/// Assembles the final in-memory catalog from the aggregation state.
fn assemble_document(
    configuration: &BuildConfiguration,
    contexts: &[FeatureContext],
    sample_results: &[SampleResult],
    mut reconciled: BTreeMap<String, (BTreeMap<String, String>, String)>,
) -> CatalogDocument {
    let mut samples = BTreeMap::new();
    for result in sample_results {
        let mut annotations = result.annotations.clone();
        for (feature, (allele_id, proteoform_id)) in &result.assignments {
            annotations.insert(format!("AL!{feature}"), allele_id.clone());
            if let Some(proteoform_id) = proteoform_id {
                annotations.insert(format!("PF!{feature}"), proteoform_id.clone());
            }
        }
        samples.insert(
            result.name.clone(),
            SampleEntry {
                name: result.name.clone(),
                annotations,
            },
        );
    }

    let mut features = BTreeMap::new();
    let mut nucleotide_variants: BTreeMap<String, BTreeMap<u64, BTreeMap<String, VariantRecord>>> =
        BTreeMap::new();
    for context in contexts {
        let feature = &context.feature;
        let (protein_sequences, structure) = match reconciled.remove(&feature.name) {
            Some((sequences, text)) => (sequences, Some(text)),
            None => (BTreeMap::new(), None),
        };

        let mut alleles = BTreeMap::new();
        for entry in context.catalog.alleles.iter() {
            alleles.insert(entry.key().clone(), entry.value().clone());
        }
        let mut proteoforms = BTreeMap::new();
        for entry in context.catalog.proteoforms.iter() {
            proteoforms.insert(entry.key().clone(), entry.value().clone());
        }
        let mut aminoacid_variants = BTreeMap::new();
        for position in context.catalog.aminoacid_positions() {
            if let Some(site) = context.catalog.aminoacid_variants.get(&position) {
                let mut by_alternate = BTreeMap::new();
                for record in site.iter() {
                    by_alternate.insert(record.key().clone(), record.value().clone());
                }
                aminoacid_variants.insert(position, by_alternate);
            }
        }

        let contig_sites = nucleotide_variants.entry(feature.contig.clone()).or_default();
        for position in context.catalog.nucleotide_positions() {
            if let Some(site) = context.catalog.nucleotide_variants.get(&position) {
                let by_alternate = contig_sites.entry(position).or_default();
                for record in site.iter() {
                    by_alternate
                        .entry(record.key().clone())
                        .and_modify(|existing: &mut VariantRecord| {
                            existing
                                .occurrence
                                .extend(record.value().occurrence.iter().cloned());
                            existing.primary |= record.value().primary;
                        })
                        .or_insert_with(|| record.value().clone());
                }
            }
        }

        features.insert(
            feature.name.clone(),
            FeatureEntry {
                name: feature.name.clone(),
                chromosome: feature.contig.clone(),
                start: feature.start,
                end: feature.end,
                is_sense: feature.is_sense,
                is_coding_sequence: feature.is_coding_sequence,
                nucleotide_sequence: context.reference_sequence.clone(),
                translated_nucleotide_sequence: context.translated_reference.clone(),
                protein_sequences,
                structure,
                annotations: feature.annotations.clone(),
                alleles,
                proteoforms,
                aminoacid_variants,
            },
        );
    }

    CatalogDocument {
        software: concat!("varcat ", env!("CARGO_PKG_VERSION")).to_string(),
        date: Utc::now().format("%Y-%m-%d").to_string(),
        parameters: configuration.parameters.clone(),
        excluded_positions: configuration.excluded_positions.clone(),
        samples,
        features,
        nucleotide_variants,
    }
}
