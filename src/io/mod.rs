//! Opaque readers for the file formats the engine consumes.

pub mod fasta;
pub mod gff;
pub mod pdb;
pub mod vcf;
