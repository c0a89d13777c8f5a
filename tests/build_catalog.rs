//! End-to-end tests of the BUILD pipeline: fixture files in, catalog
//! document out.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use varcat::engine::{run, BuildArgs};
use varcat::report::{self, CatalogDocument};

const REFERENCE_FASTA: &str = ">chr1\nATGAAATAA\n";
const REFERENCE_GFF: &str = "##gff-version 3\n\
chr1\ttest\tgene\t1\t9\t.\t+\t.\tID=g;locus_tag=b0001\n";
const VCF_HEADER: &str =
    "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Writes a build configuration for feature `g` over the shared reference
/// and the given sample VCF paths.
fn write_config(dir: &Path, samples: &[(&str, &PathBuf)], output: &Path) -> PathBuf {
    let fasta = write_file(dir, "reference.fasta", REFERENCE_FASTA);
    let gff = write_file(dir, "reference.gff3", REFERENCE_GFF);
    let samples_json: Vec<String> = samples
        .iter()
        .map(|(name, path)| format!("\"{name}\": {{\"vcfFile\": \"{}\"}}", path.display()))
        .collect();
    let config = format!(
        "{{\n\
         \"minCoverage\": 5.0, \"minQuality\": 30.0,\n\
         \"minHomFrequency\": 0.9, \"minHetFrequency\": 0.45, \"maxHetFrequency\": 0.55,\n\
         \"threads\": 2,\n\
         \"referenceFasta\": \"{}\",\n\
         \"referenceAnnotation\": \"{}\",\n\
         \"outputFile\": \"{}\",\n\
         \"samples\": {{{}}},\n\
         \"features\": {{\"g\": {{\"isCodingSequence\": true, \"MATCH_locus_tag\": \"b0001\"}}}}\n\
         }}",
        fasta.display(),
        gff.display(),
        output.display(),
        samples_json.join(", ")
    );
    write_file(dir, "build.json", &config)
}

fn build_catalog(dir: &TempDir, samples: &[(&str, &PathBuf)]) -> CatalogDocument {
    let output = dir.path().join("catalog.json");
    let config = write_config(dir.path(), samples, &output);
    run(BuildArgs {
        config,
        verbose: false,
    })
    .unwrap();
    report::read_catalog(&output).unwrap()
}

fn assert_allele_id_shape(id: &str) {
    assert_eq!(id.len(), 13);
    assert!(id.starts_with("AL"));
    assert!(id[2..].chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn test_sample_without_variants_is_reference() {
    let dir = TempDir::new().unwrap();
    let vcf = write_file(dir.path(), "a.vcf", VCF_HEADER);
    let catalog = build_catalog(&dir, &[("a", &vcf)]);

    let feature = &catalog.features["g"];
    assert_eq!(feature.nucleotide_sequence, "ATGAAATAA");
    assert_eq!(
        feature.translated_nucleotide_sequence.as_deref(),
        Some("MK*")
    );
    assert_eq!(feature.alleles.len(), 1);
    assert!(feature.alleles.contains_key("AL_REFERENCE"));
    assert!(feature.proteoforms.contains_key("PF_REFERENCE"));
    assert_eq!(
        catalog.samples["a"].annotations["AL!g"],
        "AL_REFERENCE"
    );
    assert_eq!(
        catalog.samples["a"].annotations["PF!g"],
        "PF_REFERENCE"
    );
}

#[test]
fn test_shared_snp_collapses_to_one_allele() {
    let dir = TempDir::new().unwrap();
    let row = "chr1\t4\t.\tA\tG\t60\t.\tDP=30;AF=0.97\n";
    let vcf_a = write_file(dir.path(), "a.vcf", &format!("{VCF_HEADER}{row}"));
    let vcf_b = write_file(dir.path(), "b.vcf", &format!("{VCF_HEADER}{row}"));
    let catalog = build_catalog(&dir, &[("a", &vcf_a), ("b", &vcf_b)]);

    let feature = &catalog.features["g"];
    assert_eq!(feature.alleles.len(), 1);
    let (id, allele) = feature.alleles.iter().next().unwrap();
    assert_allele_id_shape(id);
    assert_eq!(allele.variants, "G!4");
    assert_eq!(
        allele.samples.iter().collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    assert_eq!(allele.frequency, "1.00");

    let site = &catalog.nucleotide_variants["chr1"][&4]["G"];
    assert_eq!(site.occurrence.iter().collect::<Vec<_>>(), vec![id]);
    assert_eq!(site.reference_content, "A");
    assert!(site.primary);
}

#[test]
fn test_allele_id_independent_of_sample_order() {
    let row = "chr1\t4\t.\tA\tG\t60\t.\tDP=30;AF=0.97\n";
    let mut ids = Vec::new();
    for names in [["a", "b"], ["b", "a"]] {
        let dir = TempDir::new().unwrap();
        let vcf_0 = write_file(dir.path(), "0.vcf", &format!("{VCF_HEADER}{row}"));
        let vcf_1 = write_file(dir.path(), "1.vcf", VCF_HEADER);
        let catalog = build_catalog(&dir, &[(names[0], &vcf_0), (names[1], &vcf_1)]);
        let feature = &catalog.features["g"];
        let id = feature
            .alleles
            .keys()
            .find(|k| *k != "AL_REFERENCE")
            .unwrap()
            .clone();
        ids.push(id);
    }
    assert_eq!(ids[0], ids[1]);
}

#[test]
fn test_insertion_descriptor_and_counters() {
    let dir = TempDir::new().unwrap();
    // One base inserted after position 6.
    let row = "chr1\t6\t.\tA\tAT\t60\t.\tDP=30;AF=0.97\n";
    let vcf = write_file(dir.path(), "a.vcf", &format!("{VCF_HEADER}{row}"));
    let catalog = build_catalog(&dir, &[("a", &vcf)]);

    let feature = &catalog.features["g"];
    let allele = feature
        .alleles
        .values()
        .find(|a| !a.variants.is_empty())
        .unwrap();
    assert_eq!(allele.variants, "AT!6");
    assert_eq!(allele.insertions, 1);
    assert_eq!(allele.substitutions, 0);

    let proteoform = feature
        .proteoforms
        .values()
        .find(|p| !p.variants.is_empty())
        .unwrap();
    assert_eq!(proteoform.insertions, 1);
    assert!(feature
        .aminoacid_variants
        .keys()
        .any(|position| position.insertion == 1));
}

#[test]
fn test_novel_stop_codon_truncates_proteoform() {
    let dir = TempDir::new().unwrap();
    // A4T turns the second codon into TAA.
    let row = "chr1\t4\t.\tA\tT\t60\t.\tDP=30;AF=0.97\n";
    let vcf = write_file(dir.path(), "a.vcf", &format!("{VCF_HEADER}{row}"));
    let catalog = build_catalog(&dir, &[("a", &vcf)]);

    let feature = &catalog.features["g"];
    let proteoform = feature
        .proteoforms
        .values()
        .find(|p| !p.variants.is_empty())
        .unwrap();
    assert_eq!(proteoform.novel_termination_position, "2+0");
    assert_eq!(proteoform.truncation_percentage, "33.33");
}

#[test]
fn test_two_snps_order_invariant_across_samples() {
    let dir = TempDir::new().unwrap();
    let forward = "chr1\t4\t.\tA\tG\t60\t.\tDP=30;AF=0.97\n\
chr1\t7\t.\tT\tC\t60\t.\tDP=30;AF=0.97\n";
    let backward = "chr1\t7\t.\tT\tC\t60\t.\tDP=30;AF=0.97\n\
chr1\t4\t.\tA\tG\t60\t.\tDP=30;AF=0.97\n";
    let vcf_a = write_file(dir.path(), "a.vcf", &format!("{VCF_HEADER}{forward}"));
    let vcf_b = write_file(dir.path(), "b.vcf", &format!("{VCF_HEADER}{backward}"));
    let catalog = build_catalog(&dir, &[("a", &vcf_a), ("b", &vcf_b)]);

    let feature = &catalog.features["g"];
    assert_eq!(feature.alleles.len(), 1);
    let (id, allele) = feature.alleles.iter().next().unwrap();
    assert_eq!(allele.variants, "C!7;G!4");
    assert_eq!(allele.samples.len(), 2);
    for (position, alternate) in [(4u64, "G"), (7u64, "C")] {
        let site = &catalog.nucleotide_variants["chr1"][&position][alternate];
        assert_eq!(site.occurrence.iter().collect::<Vec<_>>(), vec![id]);
    }
}

#[test]
fn test_sample_sets_partition_analyzed_samples() {
    let dir = TempDir::new().unwrap();
    let row = "chr1\t4\t.\tA\tG\t60\t.\tDP=30;AF=0.97\n";
    let vcf_a = write_file(dir.path(), "a.vcf", &format!("{VCF_HEADER}{row}"));
    let vcf_b = write_file(dir.path(), "b.vcf", VCF_HEADER);
    let vcf_c = write_file(dir.path(), "c.vcf", VCF_HEADER);
    let catalog = build_catalog(&dir, &[("a", &vcf_a), ("b", &vcf_b), ("c", &vcf_c)]);

    let feature = &catalog.features["g"];
    let mut seen = Vec::new();
    for allele in feature.alleles.values() {
        for sample in &allele.samples {
            assert!(!seen.contains(sample));
            seen.push(sample.clone());
        }
    }
    seen.sort();
    assert_eq!(seen, vec!["a", "b", "c"]);
}

#[test]
fn test_rejected_records_leave_reference_allele() {
    let dir = TempDir::new().unwrap();
    // Below coverage, below quality, and between the frequency windows.
    let rows = "chr1\t4\t.\tA\tG\t60\t.\tDP=2;AF=0.97\n\
chr1\t5\t.\tA\tG\t10\t.\tDP=30;AF=0.97\n\
chr1\t7\t.\tT\tC\t60\t.\tDP=30;AF=0.70\n";
    let vcf = write_file(dir.path(), "a.vcf", &format!("{VCF_HEADER}{rows}"));
    let catalog = build_catalog(&dir, &[("a", &vcf)]);

    let feature = &catalog.features["g"];
    assert_eq!(feature.alleles.len(), 1);
    assert!(feature.alleles.contains_key("AL_REFERENCE"));
    assert!(catalog.nucleotide_variants.values().all(|m| m.is_empty()));
}

#[test]
fn test_catalog_round_trip_is_byte_stable() {
    let dir = TempDir::new().unwrap();
    let row = "chr1\t4\t.\tA\tG\t60\t.\tDP=30;AF=0.97\n";
    let vcf = write_file(dir.path(), "a.vcf", &format!("{VCF_HEADER}{row}"));
    let output = dir.path().join("catalog.json");
    let config = write_config(dir.path(), &[("a", &vcf)], &output);
    run(BuildArgs {
        config,
        verbose: false,
    })
    .unwrap();

    let written = fs::read_to_string(&output).unwrap();
    let document = report::read_catalog(&output).unwrap();
    let reserialized = serde_json::to_string_pretty(&document).unwrap();
    assert_eq!(written, reserialized);
}

#[test]
fn test_structure_reconciliation_pads_and_renumbers() {
    let dir = TempDir::new().unwrap();
    // Translation MAAAAK; the structure chain misses the leading methionine
    // and starts its residue numbering at 40.
    let fasta = write_file(dir.path(), "ref2.fasta", ">chr2\nATGGCTGCAGCTGCGAAA\n");
    let gff = write_file(
        dir.path(),
        "ref2.gff3",
        "##gff-version 3\nchr2\ttest\tgene\t1\t18\t.\t+\t.\tID=g2;locus_tag=b0002\n",
    );
    let residues = ["ALA", "ALA", "ALA", "ALA", "LYS"];
    let pdb_lines: Vec<String> = residues
        .iter()
        .enumerate()
        .map(|(i, res)| {
            format!(
                "ATOM  {:>5} CA   {res} A{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}",
                i + 1,
                i + 40,
                1.0,
                2.0,
                3.0,
                1.0,
                0.0
            )
        })
        .collect();
    let pdb = write_file(dir.path(), "g2.pdb", &(pdb_lines.join("\n") + "\nEND\n"));
    let vcf = write_file(dir.path(), "a.vcf", VCF_HEADER);
    let output = dir.path().join("catalog.json");
    let config = format!(
        "{{\n\
         \"minCoverage\": 5.0, \"minQuality\": 30.0,\n\
         \"minHomFrequency\": 0.9, \"minHetFrequency\": 0.45, \"maxHetFrequency\": 0.55,\n\
         \"threads\": 1,\n\
         \"referenceFasta\": \"{}\",\n\
         \"referenceAnnotation\": \"{}\",\n\
         \"outputFile\": \"{}\",\n\
         \"samples\": {{\"a\": {{\"vcfFile\": \"{}\"}}}},\n\
         \"features\": {{\"g2\": {{\"pdbFile\": \"{}\", \"MATCH_locus_tag\": \"b0002\"}}}}\n\
         }}",
        fasta.display(),
        gff.display(),
        output.display(),
        vcf.display(),
        pdb.display()
    );
    let config = write_file(dir.path(), "build.json", &config);
    run(BuildArgs {
        config,
        verbose: false,
    })
    .unwrap();
    let catalog = report::read_catalog(&output).unwrap();

    let feature = &catalog.features["g2"];
    assert!(feature.is_coding_sequence);
    assert_eq!(
        feature.translated_nucleotide_sequence.as_deref(),
        Some("MAAAAK")
    );
    assert_eq!(feature.protein_sequences["A"], "mAAAAK");
    let structure = feature.structure.as_deref().unwrap();
    let numbers: Vec<&str> = structure
        .lines()
        .filter(|l| l.starts_with("ATOM"))
        .map(|l| l[22..26].trim())
        .collect();
    assert_eq!(numbers, vec!["1", "2", "3", "4", "5"]);
}
