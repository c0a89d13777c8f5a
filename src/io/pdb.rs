//! Protein structure reader and writer (PDB subset).
//!
//! Parses ATOM/HETATM records into residue groups per chain, exposes chain
//! amino-acid sequences and supports residue renumbering with text
//! re-emission. Everything outside the residue number columns is preserved
//! byte-for-byte.

use crate::error::{Result, VarcatError};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone)]
enum PdbRecord {
    Atom {
        raw: String,
        chain: char,
        res_seq: i32,
        i_code: char,
        res_name: String,
    },
    Other(String),
}

/// Parsed structure; record order is file order.
#[derive(Debug, Clone, Default)]
pub struct PdbStructure {
    records: Vec<PdbRecord>,
}

impl PdbStructure {
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| VarcatError::io(path, e))?;
        Self::read_from(BufReader::new(file))
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| VarcatError::io("<pdb>", e))?;
            if line.starts_with("ATOM") || line.starts_with("HETATM") {
                if line.len() < 27 {
                    return Err(VarcatError::Bio(format!(
                        "truncated structure atom record: '{line}'"
                    )));
                }
                let res_name = line[17..20].trim().to_string();
                let chain = line.as_bytes()[21] as char;
                let res_seq: i32 = line[22..26].trim().parse().map_err(|_| {
                    VarcatError::Bio(format!("invalid residue number in '{line}'"))
                })?;
                let i_code = line.as_bytes()[26] as char;
                records.push(PdbRecord::Atom {
                    raw: line,
                    chain,
                    res_seq,
                    i_code,
                    res_name,
                });
            } else {
                records.push(PdbRecord::Other(line));
            }
        }
        Ok(PdbStructure { records })
    }

    /// One-letter amino-acid sequence per chain, one symbol per residue
    /// group; unknown residue names map to `X`.
    pub fn chain_sequences(&self) -> BTreeMap<char, String> {
        let mut sequences: BTreeMap<char, String> = BTreeMap::new();
        let mut last_group: BTreeMap<char, (i32, char)> = BTreeMap::new();
        for record in &self.records {
            if let PdbRecord::Atom {
                chain,
                res_seq,
                i_code,
                res_name,
                ..
            } = record
            {
                if *chain == 'x' {
                    continue;
                }
                let group = (*res_seq, *i_code);
                if last_group.get(chain) == Some(&group) {
                    continue;
                }
                last_group.insert(*chain, group);
                sequences
                    .entry(*chain)
                    .or_default()
                    .push(three_to_one(res_name));
            }
        }
        sequences
    }

    /// Renumbers the residue groups of `chain_id` in order with `numbers`.
    /// Groups beyond the provided numbers are dropped from the structure.
    pub fn renumber_chain(&mut self, chain_id: char, numbers: &[u32]) {
        let mut group_index: Option<usize> = None;
        let mut current_group: Option<(i32, char)> = None;
        let mut kept = Vec::with_capacity(self.records.len());
        for record in self.records.drain(..) {
            match record {
                PdbRecord::Atom {
                    raw,
                    chain,
                    res_seq,
                    i_code,
                    res_name,
                } if chain == chain_id => {
                    if current_group != Some((res_seq, i_code)) {
                        current_group = Some((res_seq, i_code));
                        group_index = Some(group_index.map_or(0, |i| i + 1));
                    }
                    let idx = group_index.unwrap_or(0);
                    if idx >= numbers.len() {
                        continue;
                    }
                    let new_seq = numbers[idx] as i32;
                    kept.push(PdbRecord::Atom {
                        raw: splice_res_seq(&raw, new_seq),
                        chain,
                        res_seq: new_seq,
                        i_code,
                        res_name,
                    });
                }
                other => kept.push(other),
            }
        }
        self.records = kept;
    }

    pub fn to_pdb_string(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            match record {
                PdbRecord::Atom { raw, .. } => out.push_str(raw),
                PdbRecord::Other(line) => out.push_str(line),
            }
            out.push('\n');
        }
        out
    }
}

/// Rewrites the residue sequence number columns (23-26) of an atom record.
fn splice_res_seq(raw: &str, res_seq: i32) -> String {
    let mut line = raw.to_string();
    let formatted = format!("{res_seq:>4}");
    line.replace_range(22..26, &formatted);
    line
}

fn three_to_one(res_name: &str) -> char {
    match res_name {
        "ALA" => 'A',
        "ARG" => 'R',
        "ASN" => 'N',
        "ASP" => 'D',
        "CYS" => 'C',
        "GLU" => 'E',
        "GLN" => 'Q',
        "GLY" => 'G',
        "HIS" => 'H',
        "ILE" => 'I',
        "LEU" => 'L',
        "LYS" => 'K',
        "MET" | "MSE" => 'M',
        "PHE" => 'F',
        "PRO" => 'P',
        "SER" => 'S',
        "THR" => 'T',
        "TRP" => 'W',
        "TYR" => 'Y',
        "VAL" => 'V',
        _ => 'X',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn atom_line(serial: u32, name: &str, res: &str, chain: char, seq: i32) -> String {
        format!(
            "ATOM  {serial:>5} {name:<4} {res} {chain}{seq:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}",
            1.0, 2.0, 3.0, 1.0, 0.0
        )
    }

    fn two_residue_pdb() -> String {
        let mut lines = vec![
            atom_line(1, "N", "MET", 'A', 10),
            atom_line(2, "CA", "MET", 'A', 10),
            atom_line(3, "N", "LYS", 'A', 11),
            atom_line(4, "CA", "LYS", 'A', 11),
        ];
        lines.push("END".to_string());
        lines.join("\n")
    }

    #[test]
    fn test_chain_sequences() {
        let pdb = PdbStructure::read_from(Cursor::new(two_residue_pdb())).unwrap();
        let sequences = pdb.chain_sequences();
        assert_eq!(sequences[&'A'], "MK");
    }

    #[test]
    fn test_renumber_and_reemit() {
        let mut pdb = PdbStructure::read_from(Cursor::new(two_residue_pdb())).unwrap();
        pdb.renumber_chain('A', &[1, 2]);
        let text = pdb.to_pdb_string();
        let reread = PdbStructure::read_from(Cursor::new(text)).unwrap();
        let mut seen = Vec::new();
        for record in &reread.records {
            if let PdbRecord::Atom { res_seq, .. } = record {
                seen.push(*res_seq);
            }
        }
        assert_eq!(seen, vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_renumber_drops_unassigned_groups() {
        let mut pdb = PdbStructure::read_from(Cursor::new(two_residue_pdb())).unwrap();
        pdb.renumber_chain('A', &[7]);
        assert_eq!(pdb.chain_sequences()[&'A'], "M");
    }

    #[test]
    fn test_membrane_chain_skipped() {
        let data = atom_line(1, "CA", "ALA", 'x', 1);
        let pdb = PdbStructure::read_from(Cursor::new(data)).unwrap();
        assert!(pdb.chain_sequences().is_empty());
    }
}
