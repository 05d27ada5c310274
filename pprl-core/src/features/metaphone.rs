// pprl-core/src/features/metaphone.rs
//
// Double Metaphone phonetic keys, built on `rphonetic` rather than a
// hand-rolled implementation of the algorithm (grounded in the pack's
// `ob-semantic-matcher/src/phonetic.rs`, which reaches for the same crate
// for the same job).

use rphonetic::DoubleMetaphone;

/// For each whitespace-split word in `s`, emit up to two phonetic keys
/// (primary, then alternate if it differs and is non-empty). Empty keys
/// are suppressed.
pub fn gen_double_metaphone(s: &str) -> Vec<String> {
    let encoder = DoubleMetaphone::default();
    let mut out = Vec::new();

    for word in s.split_whitespace() {
        let result = encoder.double_metaphone(word);
        let primary = result.primary();
        let alternate = result.alternate();

        if !primary.is_empty() {
            out.push(primary.to_string());
        }
        if !alternate.is_empty() && alternate != primary {
            out.push(alternate.to_string());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_yields_no_keys() {
        assert!(gen_double_metaphone("").is_empty());
    }

    #[test]
    fn produces_nonempty_keys_for_a_real_word() {
        let keys = gen_double_metaphone("smith");
        assert!(!keys.is_empty());
    }

    #[test]
    fn similar_sounding_words_share_a_key() {
        let a = gen_double_metaphone("stephen");
        let b = gen_double_metaphone("steven");
        assert!(a.iter().any(|k| b.contains(k)));
    }
}
