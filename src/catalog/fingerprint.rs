//! Deterministic allele/proteoform identifiers.
//!
//! An identifier is a pure function of the set of variant descriptors:
//! descriptors are collapsed into a set, sorted lexicographically, joined
//! with a single delimiter and hashed. Submission order, thread interleaving
//! and map iteration order therefore never influence the resulting id.

use std::collections::BTreeSet;

pub const ALLELE_PREFIX: &str = "AL";
pub const PROTEOFORM_PREFIX: &str = "PF";
/// Reserved id for the variant-free allele.
pub const REFERENCE_ALLELE_ID: &str = "AL_REFERENCE";
/// Reserved id for the variant-free proteoform.
pub const REFERENCE_PROTEOFORM_ID: &str = "PF_REFERENCE";

const DELIMITER: char = ';';

/// Canonical serialization of a descriptor set: lexicographically sorted,
/// `;`-joined. Equal sets always produce equal tokens.
pub fn canonical_token(descriptors: &BTreeSet<String>) -> String {
    let mut token = String::new();
    for descriptor in descriptors {
        if !token.is_empty() {
            token.push(DELIMITER);
        }
        token.push_str(descriptor);
    }
    token
}

/// 32-bit polynomial rolling hash of the canonical token.
fn fingerprint(token: &str) -> i32 {
    token
        .bytes()
        .fold(0i32, |hash, byte| hash.wrapping_mul(31).wrapping_add(byte as i32))
}

fn entry_id(prefix: &str, reference_id: &str, descriptors: &BTreeSet<String>) -> String {
    if descriptors.is_empty() {
        return reference_id.to_string();
    }
    let hash = fingerprint(&canonical_token(descriptors));
    let sign = if hash < 0 { '1' } else { '0' };
    format!("{prefix}{sign}{:010}", hash.unsigned_abs())
}

/// Allele id: `AL` + sign digit + zero-padded decimal hash, 13 chars total,
/// or `AL_REFERENCE` for the empty set.
pub fn allele_id(descriptors: &BTreeSet<String>) -> String {
    entry_id(ALLELE_PREFIX, REFERENCE_ALLELE_ID, descriptors)
}

/// Proteoform id, analogous to [`allele_id`].
pub fn proteoform_id(descriptors: &BTreeSet<String>) -> String {
    entry_id(PROTEOFORM_PREFIX, REFERENCE_PROTEOFORM_ID, descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(descriptors: &[&str]) -> BTreeSet<String> {
        descriptors.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_empty_set_is_reference() {
        assert_eq!(allele_id(&BTreeSet::new()), "AL_REFERENCE");
        assert_eq!(proteoform_id(&BTreeSet::new()), "PF_REFERENCE");
    }

    #[test]
    fn test_id_shape() {
        let id = allele_id(&set(&["G!4", "T!7"]));
        assert_eq!(id.len(), 13);
        assert!(id.starts_with("AL"));
        assert!(id[2..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_order_invariance() {
        // BTreeSet already canonicalizes; build from different orders.
        let forward: BTreeSet<String> = ["G!4", "T!7"].iter().map(|s| s.to_string()).collect();
        let backward: BTreeSet<String> = ["T!7", "G!4"].iter().map(|s| s.to_string()).collect();
        assert_eq!(allele_id(&forward), allele_id(&backward));
    }

    #[test]
    fn test_distinct_sets_distinct_tokens() {
        assert_ne!(canonical_token(&set(&["G!4"])), canonical_token(&set(&["T!4"])));
        assert_ne!(allele_id(&set(&["G!4"])), allele_id(&set(&["G!4", "T!7"])));
    }

    #[test]
    fn test_prefix_distinguishes_domains() {
        let descriptors = set(&["*!2+0"]);
        let al = allele_id(&descriptors);
        let pf = proteoform_id(&descriptors);
        assert_eq!(&al[2..], &pf[2..]);
        assert_ne!(al, pf);
    }
}
