// pprl-core/src/bloom.rs
//
// Bloom-filter encoding: map a column's token lists to sets of set-bit
// indices within a filter of `size` bits. Per token and per hash
// replication `i`, a fresh SHA-256 digest is taken over
// `concat(token, i, salt)`, the full 32-byte digest is read as a
// little-endian integer, reduced modulo `size`, and offset — the
// byte-for-byte algorithm `bloom_filters.py`'s `str(gram)+str(i)+str(salt)`
// loop computes, so two independent implementations agree bit-for-bit.
// Only SHA-256 is supported (see spec.md §9, open question 1).

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Reduce a 32-byte SHA-256 digest, interpreted as a little-endian
/// integer, modulo `size` without ever materialising the full-width
/// integer: Horner's method from the most significant byte (index 31)
/// down to the least significant (index 0).
fn digest_mod(digest: &[u8], size: u32) -> u32 {
    let mut acc: u64 = 0;
    for &byte in digest.iter().rev() {
        acc = (acc * 256 + byte as u64) % size as u64;
    }
    acc as u32
}

/// The `num_hashes` indices a single token maps to, within
/// `[offset, offset + size)`, not yet deduplicated against other tokens.
fn hash_token(token: &str, salt: &[u8], size: u32, num_hashes: usize, offset: u32) -> Vec<u32> {
    (0..num_hashes)
        .map(|i| {
            let mut digest = Sha256::new();
            digest.update(token.as_bytes());
            digest.update(i.to_string().as_bytes());
            digest.update(salt);
            let bytes = digest.finalize();
            offset + digest_mod(&bytes, size)
        })
        .collect()
}

/// Bit indices set by one row's token list, deduplicated and sorted.
/// Matches `bloom_filter_vector`: every `(token, i)` pair contributes one
/// raw index, deduplication happens once over the whole row.
pub fn bloom_indices(tokens: &[String], salt: &[u8], size: u32, num_hashes: usize, offset: u32) -> Vec<u32> {
    let mut set = BTreeSet::new();
    for token in tokens {
        for idx in hash_token(token, salt, size, num_hashes, offset) {
            set.insert(idx);
        }
    }
    set.into_iter().collect()
}

/// Fraction of rows whose token list produced fewer set bits than the
/// theoretical maximum (`tokens.len() * num_hashes`) — i.e. where two
/// distinct `(token, i)` pairs hashed to the same index. A diagnostic
/// only — it never blocks embedding.
pub fn collision_fraction(rows: &[(Vec<String>, Vec<u32>)], num_hashes: usize) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let collided = rows
        .iter()
        .filter(|(tokens, indices)| !tokens.is_empty() && indices.len() < tokens.len() * num_hashes)
        .count();
    collided as f64 / rows.len() as f64
}
