//! Per-sample variant-call reader.
//!
//! Yields one [`VariantCall`] per alternate content. REF/ALT pairs are
//! normalized into the engine's padded representation: a deletion keeps the
//! retained prefix and pads the removed span with gap characters (`ATT→A`
//! becomes `A--`), an insertion keeps its anchor base (`A→AT` stays `AT`),
//! so every alternate content lines up with the reference span it replaces.

use crate::error::{Result, VarcatError};
use crate::sequence::GAP;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A single filtered-input variant observation of one sample.
#[derive(Debug, Clone)]
pub struct VariantCall {
    pub contig: String,
    /// 1-based position on the contig.
    pub position: u64,
    pub reference_content: String,
    /// Padded alternate content over `ACGTN-`.
    pub alternate_content: String,
    pub depth: f64,
    /// Allele frequency of this alternate within the sample's reads.
    pub frequency: f64,
    pub quality: f64,
    /// Whether this is the highest-frequency alternate at its site within
    /// this sample.
    pub is_primary: bool,
}

/// Reads all calls of one sample. Header lines and no-call rows (`ALT = .`)
/// are skipped; multi-allelic rows expand into one call per alternate.
pub fn read_sample_calls(path: &Path) -> Result<Vec<VariantCall>> {
    let file = File::open(path).map_err(|e| VarcatError::io(path, e))?;
    read_sample_calls_from(BufReader::new(file))
}

pub fn read_sample_calls_from<R: BufRead>(reader: R) -> Result<Vec<VariantCall>> {
    let mut calls: Vec<VariantCall> = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| VarcatError::io("<vcf>", e))?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 8 {
            return Err(VarcatError::Bio(format!(
                "malformed variant record with {} columns",
                fields.len()
            )));
        }
        let contig = fields[0].to_string();
        let position: u64 = fields[1]
            .parse()
            .map_err(|_| VarcatError::Bio(format!("invalid variant position '{}'", fields[1])))?;
        let reference = fields[3].to_string();
        if fields[4] == "." {
            continue;
        }
        let alternates: Vec<&str> = fields[4].split(',').collect();
        let quality: f64 = fields[5].parse().unwrap_or(0.0);
        let info = parse_info(fields[7]);
        let depth: f64 = info
            .get("DP")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let frequencies: Vec<f64> = match info.get("AF") {
            Some(af) => af.split(',').map(|v| v.parse().unwrap_or(0.0)).collect(),
            // Without an AF annotation the alternates are taken as a clonal
            // call split evenly.
            None => vec![1.0 / alternates.len() as f64; alternates.len()],
        };
        for (idx, alternate) in alternates.iter().enumerate() {
            let frequency = frequencies.get(idx).copied().unwrap_or(0.0);
            calls.push(VariantCall {
                contig: contig.clone(),
                position,
                reference_content: reference.clone(),
                alternate_content: normalize_alternate(&reference, alternate),
                depth,
                frequency,
                quality,
                is_primary: false,
            });
        }
    }
    mark_primary_calls(&mut calls);
    Ok(calls)
}

/// Pads deletions with gap characters so the alternate covers the replaced
/// reference span; substitutions and insertions pass through.
fn normalize_alternate(reference: &str, alternate: &str) -> String {
    if alternate.len() < reference.len() {
        let mut padded = String::with_capacity(reference.len());
        padded.push_str(alternate);
        for _ in alternate.len()..reference.len() {
            padded.push(GAP);
        }
        padded
    } else {
        alternate.to_string()
    }
}

/// Among all alternates at one `(contig, position)` site, flags the one with
/// the highest frequency.
fn mark_primary_calls(calls: &mut [VariantCall]) {
    let mut best: FxHashMap<(String, u64), (usize, f64)> = FxHashMap::default();
    for (idx, call) in calls.iter().enumerate() {
        let key = (call.contig.clone(), call.position);
        let better = best
            .get(&key)
            .map_or(true, |(_, frequency)| call.frequency > *frequency);
        if better {
            best.insert(key, (idx, call.frequency));
        }
    }
    for (idx, _) in best.values() {
        calls[*idx].is_primary = true;
    }
}

fn parse_info(info: &str) -> FxHashMap<String, String> {
    let mut map = FxHashMap::default();
    for entry in info.split(';') {
        if let Some((key, value)) = entry.split_once('=') {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}
