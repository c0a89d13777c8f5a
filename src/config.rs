//! Build configuration: JSON document parsing and validation.
//!
//! The raw document is deserialized with optional fields so that every
//! missing or malformed option produces a targeted configuration error
//! instead of a generic parse failure.

use crate::error::{Result, VarcatError};
use crate::filter::VariantFilter;
use crate::io::gff::AnnotationTable;
use crate::reference::{Feature, ReferenceStore, Sample, REFERENCE_SAMPLE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Raw build document as written by the user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDocument {
    pub min_coverage: Option<f64>,
    pub min_quality: Option<f64>,
    pub min_hom_frequency: Option<f64>,
    pub min_het_frequency: Option<f64>,
    pub max_het_frequency: Option<f64>,
    pub threads: Option<usize>,
    pub genome_analysis: Option<bool>,
    pub excluded_positions: Option<BTreeMap<String, BTreeSet<u64>>>,
    pub reference_fasta: Option<PathBuf>,
    pub reference_annotation: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub samples: Option<BTreeMap<String, SampleDocument>>,
    pub samples_dir: Option<PathBuf>,
    pub features: Option<BTreeMap<String, FeatureDocument>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleDocument {
    pub vcf_file: PathBuf,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDocument {
    pub pdb_file: Option<PathBuf>,
    pub is_coding_sequence: Option<bool>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Carries the `MATCH_<attribute>` entry locating the feature in the
    /// annotation file.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Threshold parameters echoed into the catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    pub min_coverage: f64,
    pub min_quality: f64,
    pub min_hom_frequency: f64,
    pub min_het_frequency: f64,
    pub max_het_frequency: f64,
}

/// A feature request before resolution against the annotation file.
#[derive(Debug, Clone)]
pub struct FeatureRequest {
    pub name: String,
    pub match_key: String,
    pub match_value: String,
    pub pdb_file: Option<PathBuf>,
    pub is_coding_sequence: bool,
    pub annotations: BTreeMap<String, String>,
}

/// Fully validated build configuration.
#[derive(Debug)]
pub struct BuildConfiguration {
    pub parameters: Parameters,
    pub threads: usize,
    pub genome_analysis: bool,
    pub excluded_positions: BTreeMap<String, BTreeSet<u64>>,
    pub reference_fasta: PathBuf,
    pub reference_annotation: PathBuf,
    pub output_file: PathBuf,
    pub samples: Vec<Sample>,
    pub feature_requests: Vec<FeatureRequest>,
}

impl BuildConfiguration {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| VarcatError::io(path, e))?;
        let document: BuildDocument = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| VarcatError::Configuration(format!("malformed build document: {e}")))?;
        Self::from_document(document)
    }

    pub fn from_document(document: BuildDocument) -> Result<Self> {
        let parameters = Parameters {
            min_coverage: require_non_negative(document.min_coverage, "minCoverage")?,
            min_quality: require_non_negative(document.min_quality, "minQuality")?,
            min_hom_frequency: require_fraction(document.min_hom_frequency, "minHomFrequency")?,
            min_het_frequency: require_fraction(document.min_het_frequency, "minHetFrequency")?,
            max_het_frequency: require_fraction(document.max_het_frequency, "maxHetFrequency")?,
        };
        let reference_fasta = require_readable(document.reference_fasta, "referenceFasta")?;
        let reference_annotation =
            require_readable(document.reference_annotation, "referenceAnnotation")?;
        let output_file = document
            .output_file
            .ok_or_else(|| missing("outputFile", "path to file"))?;
        if output_file.exists() {
            return Err(VarcatError::Configuration(format!(
                "specified outputFile '{}' already exists",
                output_file.display()
            )));
        }
        if let Some(parent) = output_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(VarcatError::Configuration(format!(
                    "unable to access output directory '{}'",
                    parent.display()
                )));
            }
        }

        let samples = collect_samples(document.samples, document.samples_dir.as_deref())?;
        if samples.is_empty() {
            return Err(missing("samples or samplesDir", "at least one sample"));
        }

        let genome_analysis = document.genome_analysis.unwrap_or(false);
        let feature_requests = collect_feature_requests(document.features)?;
        if feature_requests.is_empty() && !genome_analysis {
            return Err(missing("features", "at least one entry"));
        }

        Ok(BuildConfiguration {
            parameters,
            threads: document.threads.unwrap_or(0),
            genome_analysis,
            excluded_positions: document.excluded_positions.unwrap_or_default(),
            reference_fasta,
            reference_annotation,
            output_file,
            samples,
            feature_requests,
        })
    }

    /// The per-record filter derived from the thresholds.
    pub fn variant_filter(&self) -> VariantFilter {
        VariantFilter {
            min_coverage: self.parameters.min_coverage,
            min_quality: self.parameters.min_quality,
            min_hom_frequency: self.parameters.min_hom_frequency,
            min_het_frequency: self.parameters.min_het_frequency,
            max_het_frequency: self.parameters.max_het_frequency,
            excluded_positions: self.excluded_positions.clone(),
        }
    }

    /// Resolves feature requests against the annotation table; a request
    /// matching zero or multiple records is fatal. With `genomeAnalysis`,
    /// one non-coding feature per reference contig is appended.
    pub fn resolve_features(
        &self,
        annotation: &AnnotationTable,
        store: &ReferenceStore,
    ) -> Result<Vec<Feature>> {
        let mut features = Vec::with_capacity(self.feature_requests.len());
        for request in &self.feature_requests {
            let matches = annotation.select_by_attribute(&request.match_key, &request.match_value);
            let record = match matches.as_slice() {
                [] => {
                    return Err(VarcatError::Reference(format!(
                        "failed to match feature '{}' with attribute pair {}={}",
                        request.name, request.match_key, request.match_value
                    )))
                }
                [record] => record,
                _ => {
                    return Err(VarcatError::Reference(format!(
                        "feature '{}' was matched {} times with attribute pair {}={}",
                        request.name,
                        matches.len(),
                        request.match_key,
                        request.match_value
                    )))
                }
            };
            let mut feature = Feature::new(
                request.name.clone(),
                record.seqid.clone(),
                record.start,
                record.end,
                record.is_sense,
            )?;
            feature.is_coding_sequence =
                request.is_coding_sequence || request.pdb_file.is_some();
            feature.structure_path = request.pdb_file.clone();
            feature.annotations = request.annotations.clone();
            features.push(feature);
        }
        if self.genome_analysis {
            for contig in store.contig_names() {
                let mut feature = Feature::new(
                    contig.clone(),
                    contig.clone(),
                    1,
                    store.contig_length(contig)?,
                    true,
                )?;
                feature.annotations.insert(
                    "genomeAnalysis".to_string(),
                    "true".to_string(),
                );
                features.push(feature);
            }
        }
        Ok(features)
    }
}

fn collect_samples(
    explicit: Option<BTreeMap<String, SampleDocument>>,
    samples_dir: Option<&Path>,
) -> Result<Vec<Sample>> {
    let mut samples: BTreeMap<String, Sample> = BTreeMap::new();
    if let Some(dir) = samples_dir {
        let entries = std::fs::read_dir(dir).map_err(|e| VarcatError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| VarcatError::io(dir, e))?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "vcf") {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
                samples.insert(
                    name.clone(),
                    Sample {
                        name,
                        vcf_path: path,
                        annotations: BTreeMap::new(),
                    },
                );
            }
        }
    }
    for (name, document) in explicit.unwrap_or_default() {
        if !document.vcf_file.is_file() {
            return Err(VarcatError::Configuration(format!(
                "failed to access vcf file '{}' for sample '{name}'",
                document.vcf_file.display()
            )));
        }
        samples.insert(
            name.clone(),
            Sample {
                name,
                vcf_path: document.vcf_file,
                annotations: document.annotations,
            },
        );
    }
    if samples.contains_key(REFERENCE_SAMPLE) {
        return Err(VarcatError::Configuration(format!(
            "sample name '{REFERENCE_SAMPLE}' is reserved for the reference"
        )));
    }
    Ok(samples.into_values().collect())
}

fn collect_feature_requests(
    features: Option<BTreeMap<String, FeatureDocument>>,
) -> Result<Vec<FeatureRequest>> {
    let mut requests = Vec::new();
    for (name, document) in features.unwrap_or_default() {
        let (match_key, match_value) = document
            .extra
            .iter()
            .find_map(|(key, value)| {
                let attribute = key.strip_prefix("MATCH_")?;
                let value = value.as_str()?;
                Some((attribute.to_string(), value.to_string()))
            })
            .ok_or_else(|| {
                VarcatError::Configuration(format!(
                    "failed to find MATCH_<attribute> key/value pair for feature '{name}'"
                ))
            })?;
        if let Some(pdb) = &document.pdb_file {
            if !pdb.is_file() {
                return Err(VarcatError::Configuration(format!(
                    "failed to access pdb file '{}' for feature '{name}'",
                    pdb.display()
                )));
            }
        }
        requests.push(FeatureRequest {
            name,
            match_key,
            match_value,
            is_coding_sequence: document.is_coding_sequence.unwrap_or(false),
            pdb_file: document.pdb_file,
            annotations: document.annotations,
        });
    }
    Ok(requests)
}

fn missing(option: &str, expected: &str) -> VarcatError {
    VarcatError::Configuration(format!("invalid or missing {option}; expected {expected}"))
}

fn require_non_negative(value: Option<f64>, option: &str) -> Result<f64> {
    match value {
        Some(v) if v >= 0.0 => Ok(v),
        _ => Err(missing(option, "non-negative number")),
    }
}

fn require_fraction(value: Option<f64>, option: &str) -> Result<f64> {
    match value {
        Some(v) if (0.0..=1.0).contains(&v) => Ok(v),
        _ => Err(missing(option, "number between 0.0 and 1.0")),
    }
}

fn require_readable(path: Option<PathBuf>, option: &str) -> Result<PathBuf> {
    let path = path.ok_or_else(|| missing(option, "path to file"))?;
    if !path.is_file() {
        return Err(VarcatError::Configuration(format!(
            "invalid {option}; failed to read '{}'",
            path.display()
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_validation() {
        assert!(require_non_negative(Some(5.0), "minCoverage").is_ok());
        assert!(require_non_negative(Some(-1.0), "minCoverage").is_err());
        assert!(require_non_negative(None, "minCoverage").is_err());
        assert!(require_fraction(Some(0.5), "minHomFrequency").is_ok());
        assert!(require_fraction(Some(1.5), "minHomFrequency").is_err());
    }

    #[test]
    fn test_feature_request_needs_match_entry() {
        let mut features = BTreeMap::new();
        features.insert(
            "g".to_string(),
            FeatureDocument {
                pdb_file: None,
                is_coding_sequence: Some(true),
                annotations: BTreeMap::new(),
                extra: BTreeMap::new(),
            },
        );
        assert!(collect_feature_requests(Some(features)).is_err());
    }

    #[test]
    fn test_feature_request_match_entry_parsed() {
        let mut extra = BTreeMap::new();
        extra.insert(
            "MATCH_locus_tag".to_string(),
            serde_json::Value::String("b0001".to_string()),
        );
        let mut features = BTreeMap::new();
        features.insert(
            "g".to_string(),
            FeatureDocument {
                pdb_file: None,
                is_coding_sequence: Some(true),
                annotations: BTreeMap::new(),
                extra,
            },
        );
        let requests = collect_feature_requests(Some(features)).unwrap();
        assert_eq!(requests[0].match_key, "locus_tag");
        assert_eq!(requests[0].match_value, "b0001");
        assert!(requests[0].is_coding_sequence);
    }
}
