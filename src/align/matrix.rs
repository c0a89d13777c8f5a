//! Substitution matrices for global alignment.

use crate::error::{Result, VarcatError};
use rustc_hash::FxHashMap;

/// Symbol-indexed substitution matrix.
pub struct ScoringMatrix {
    index: FxHashMap<char, usize>,
    scores: &'static [&'static [i32]],
}

impl ScoringMatrix {
    /// Score for a pair of symbols; unknown symbols are a `Bio` error rather
    /// than a silent mismatch.
    pub fn score(&self, a: char, b: char) -> Result<i32> {
        let i = self
            .index
            .get(&a)
            .ok_or_else(|| VarcatError::Bio(format!("symbol '{a}' not covered by scoring matrix")))?;
        let j = self
            .index
            .get(&b)
            .ok_or_else(|| VarcatError::Bio(format!("symbol '{b}' not covered by scoring matrix")))?;
        Ok(self.scores[*i][*j])
    }

    /// Identity matrix over ACGTN: matches score 1, mismatches -1.
    pub fn nucleotide() -> Self {
        const SCORES: &[&[i32]] = &[
            &[1, -1, -1, -1, -1],
            &[-1, 1, -1, -1, -1],
            &[-1, -1, 1, -1, -1],
            &[-1, -1, -1, 1, -1],
            &[-1, -1, -1, -1, 1],
        ];
        let mut index = FxHashMap::default();
        for (i, c) in ['A', 'C', 'G', 'T', 'N'].into_iter().enumerate() {
            index.insert(c, i);
        }
        ScoringMatrix {
            index,
            scores: SCORES,
        }
    }

    /// PAM120 extended with the wildcard `X` (match/mismatch -1 except X/X 0)
    /// and the termination symbol `*` (-4 off-diagonal, 0 on the diagonal).
    pub fn pam120() -> Self {
        const SCORES: &[&[i32]] = &[
            &[1, -1, 0, 0, -1, 0, 0, 0, -1, 0, -1, -1, -1, -1, 0, 0, 0, -2, -1, 0, -1, -4],
            &[-1, 2, 0, -1, -1, 0, -1, -1, 0, -1, -1, 1, 0, -2, 0, 0, -1, 0, -2, -1, -1, -4],
            &[0, 0, 1, 1, -2, 0, 0, 0, 1, -1, -1, 0, -1, -1, -1, 0, 0, -2, -1, -1, -1, -4],
            &[0, -1, 1, 2, -2, 0, 1, 0, 0, -1, -2, 0, -1, -2, -1, 0, 0, -3, -2, -1, -1, -4],
            &[-1, -1, -2, -2, 3, -2, -2, -2, -1, -1, -3, -2, -2, -2, -1, 0, -1, -3, 0, -1, -1, -4],
            &[0, 0, 0, 0, -2, 2, 1, -1, 1, -1, -1, 0, 0, -2, 0, -1, -1, -2, -2, -1, -1, -4],
            &[0, -1, 0, 1, -2, 1, 2, 0, 0, -1, -2, 0, -1, -2, -1, 0, -1, -3, -2, -1, -1, -4],
            &[0, -1, 0, 0, -2, -1, 0, 2, -1, -1, -2, -1, -1, -2, -1, 0, 0, -3, -2, -1, -1, -4],
            &[-1, 0, 1, 0, -1, 1, 0, -1, 2, -1, -1, -1, -1, -1, 0, -1, -1, -1, 0, -1, -1, -4],
            &[0, -1, -1, -1, -1, -1, -1, -1, -1, 2, 0, -1, 1, 0, -1, -1, 0, -2, -1, 1, -1, -4],
            &[-1, -1, -1, -2, -3, -1, -2, -2, -1, 0, 2, -1, 1, 0, -1, -1, -1, -1, -1, 0, -1, -4],
            &[-1, 1, 0, 0, -2, 0, 0, -1, -1, -1, -1, 2, 0, -2, -1, 0, 0, -2, -2, -1, -1, -4],
            &[-1, 0, -1, -1, -2, 0, -1, -1, -1, 1, 1, 0, 3, 0, -1, -1, 0, -2, -1, 0, -1, -4],
            &[-1, -2, -1, -2, -2, -2, -2, -2, -1, 0, 0, -2, 0, 3, -2, -1, -1, 0, 2, -1, -1, -4],
            &[0, 0, -1, -1, -1, 0, -1, -1, 0, -1, -1, -1, -1, -2, 2, 0, 0, -2, -2, -1, -1, -4],
            &[0, 0, 0, 0, 0, -1, 0, 0, -1, -1, -1, 0, -1, -1, 0, 1, 1, -1, -1, -1, -1, -4],
            &[0, -1, 0, 0, -1, -1, -1, 0, -1, 0, -1, 0, 0, -1, 0, 1, 1, -2, -1, 0, -1, -4],
            &[-2, 0, -2, -3, -3, -2, -3, -3, -1, -2, -1, -2, -2, 0, -2, -1, -2, 4, -1, -3, -1, -4],
            &[-1, -2, -1, -2, 0, -2, -2, -2, 0, -1, -1, -2, -1, 2, -2, -1, -1, -1, 3, -1, -1, -4],
            &[0, -1, -1, -1, -1, -1, -1, -1, -1, 1, 0, -1, 0, -1, -1, -1, 0, -3, -1, 2, -1, -4],
            &[-1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, 0, -4],
            &[-4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, 0],
        ];
        let mut index = FxHashMap::default();
        for (i, c) in [
            'A', 'R', 'N', 'D', 'C', 'Q', 'E', 'G', 'H', 'I', 'L', 'K', 'M', 'F', 'P', 'S', 'T',
            'W', 'Y', 'V', 'X', '*',
        ]
        .into_iter()
        .enumerate()
        {
            index.insert(c, i);
        }
        ScoringMatrix {
            index,
            scores: SCORES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nucleotide_scores() {
        let m = ScoringMatrix::nucleotide();
        assert_eq!(m.score('A', 'A').unwrap(), 1);
        assert_eq!(m.score('A', 'G').unwrap(), -1);
        assert_eq!(m.score('N', 'N').unwrap(), 1);
    }

    #[test]
    fn test_pam120_symmetry() {
        let m = ScoringMatrix::pam120();
        for a in "ARNDCQEGHILKMFPSTWYVX*".chars() {
            for b in "ARNDCQEGHILKMFPSTWYVX*".chars() {
                assert_eq!(m.score(a, b).unwrap(), m.score(b, a).unwrap());
            }
        }
    }

    #[test]
    fn test_pam120_wildcard_and_termination() {
        let m = ScoringMatrix::pam120();
        assert_eq!(m.score('X', 'X').unwrap(), 0);
        assert_eq!(m.score('X', 'A').unwrap(), -1);
        assert_eq!(m.score('*', '*').unwrap(), 0);
        assert_eq!(m.score('*', 'W').unwrap(), -4);
    }

    #[test]
    fn test_unknown_symbol_is_error() {
        let m = ScoringMatrix::nucleotide();
        assert!(m.score('A', '-').is_err());
    }
}
