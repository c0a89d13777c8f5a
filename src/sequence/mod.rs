//! Nucleotide sequence kernels: translation and reverse complement.

use crate::error::{Result, VarcatError};

/// One-letter symbol for a translated stop codon.
pub const TERMINATION_AA: char = '*';
/// One-letter symbol for an untranslatable or incomplete codon.
pub const ANY_AA: char = 'X';
/// Alignment gap / deletion symbol, shared by nucleotide and amino-acid space.
pub const GAP: char = '-';

/// Standard genetic code as a 64-entry table indexed by 2-bit packed codons
/// (T=0, C=1, A=2, G=3 per base, most significant base first).
pub struct GeneticCode {
    table: [u8; 64],
}

impl Default for GeneticCode {
    fn default() -> Self {
        Self::standard()
    }
}

impl GeneticCode {
    /// The standard code (translation table 1). Stop codons map to `*`.
    pub fn standard() -> Self {
        let mut table = [0u8; 64];
        table.copy_from_slice(b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG");
        GeneticCode { table }
    }

    /// Translate a single codon. Codons containing any symbol outside ACGT
    /// (notably `N`) yield `X`; stop codons yield `*`.
    pub fn get(&self, codon: &[u8]) -> u8 {
        if codon.len() != 3 {
            return ANY_AA as u8;
        }
        let mut idx = 0usize;
        for &b in codon {
            idx <<= 2;
            match b.to_ascii_uppercase() {
                b'T' => {}
                b'C' => idx |= 1,
                b'A' => idx |= 2,
                b'G' => idx |= 3,
                _ => return ANY_AA as u8,
            }
        }
        self.table[idx]
    }
}

/// Translates a nucleotide sequence into one-letter amino acids.
///
/// Antisense sequences are reverse-complemented before codon partitioning.
/// Stop codons emit `*` when `include_termination`, otherwise nothing. A
/// trailing incomplete codon emits `X` when `include_incomplete` and is an
/// error otherwise.
pub fn translate(
    sequence: &str,
    include_termination: bool,
    include_incomplete: bool,
    as_sense: bool,
) -> Result<String> {
    let oriented;
    let seq = if as_sense {
        sequence
    } else {
        oriented = reverse_complement(sequence);
        &oriented
    };
    let code = GeneticCode::standard();
    let bytes = seq.as_bytes();
    let mut translated = String::with_capacity(bytes.len() / 3 + 1);
    for codon in bytes.chunks(3) {
        if codon.len() != 3 {
            if !include_incomplete {
                return Err(VarcatError::Bio(format!(
                    "unable to translate codon of length {} with incomplete translation disabled",
                    codon.len()
                )));
            }
            translated.push(ANY_AA);
            continue;
        }
        let aa = code.get(codon) as char;
        if aa == TERMINATION_AA && !include_termination {
            continue;
        }
        translated.push(aa);
    }
    Ok(translated)
}

/// Returns the reverse complement of a nucleotide sequence. A↔T and C↔G are
/// swapped; every other symbol passes through unchanged.
pub fn reverse_complement(sequence: &str) -> String {
    sequence.chars().rev().map(complement).collect()
}

/// Complement of a single base; identity for non-ACGT symbols.
pub fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'C' => 'G',
        'G' => 'C',
        'T' => 'A',
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_simple() {
        assert_eq!(translate("ATGAAATAA", true, false, true).unwrap(), "MK*");
        assert_eq!(translate("ATGAAATAA", false, false, true).unwrap(), "MK");
    }

    #[test]
    fn test_translate_ambiguous_codon() {
        assert_eq!(translate("ATGANA", true, false, true).unwrap(), "MX");
    }

    #[test]
    fn test_translate_incomplete_tail() {
        assert!(translate("ATGAA", true, false, true).is_err());
        assert_eq!(translate("ATGAA", true, true, true).unwrap(), "MX");
    }

    #[test]
    fn test_translate_antisense() {
        // Reverse complement of TTACAT is ATGTAA.
        assert_eq!(translate("TTACAT", true, false, false).unwrap(), "M*");
    }

    #[test]
    fn test_translate_strand_symmetry() {
        let s = "ATGGCGAAATAA";
        let rc = reverse_complement(s);
        assert_eq!(
            translate(s, true, false, true).unwrap(),
            translate(&rc, true, false, false).unwrap()
        );
    }

    #[test]
    fn test_reverse_complement_passthrough() {
        assert_eq!(reverse_complement("ACGT"), "ACGT");
        assert_eq!(reverse_complement("AANT"), "ANTT");
        assert_eq!(reverse_complement("AC-G"), "C-GT");
    }
}
