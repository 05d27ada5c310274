// pprl-core/src/lib.rs
//
// Privacy-preserving record linkage core: tokenize and label raw columns,
// fold them into Bloom filters under a shared embedder, compare two
// embedded tables by soft cosine similarity under a trained affinity
// matrix, and resolve the result to a matching. `train` fits the affinity
// matrix from known-matched data; `serialize` and `private_index` round
// out the parts needed to actually run this across two parties.

pub mod bloom;
pub mod collaborators;
pub mod embedder;
pub mod error;
pub mod features;
pub mod private_index;
pub mod registry;
pub mod serialize;
pub mod similarity;
pub mod table;
pub mod train;

pub use embedder::{ColumnSpec, Embedder, EmbeddedTable};
pub use error::{PprlError, Result};
pub use private_index::{add_private_index, PrivateIndexAssignment};
pub use registry::ColumnKind;
pub use similarity::{compare, MatchParams, MatchedPair, SimilarityMatrix};
pub use table::{RecordTable, Table, Value};
pub use train::{train, TrainParams};

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn name_sex_embedder() -> Embedder {
        Embedder::new(
            128,
            4,
            16,
            b"shared-salt".to_vec(),
            vec![
                ColumnSpec::new("name", ColumnKind::Name),
                ColumnSpec::new("sex", ColumnKind::Sex),
            ],
        )
        .unwrap()
    }

    fn table(names: &[&str], sexes: &[&str]) -> RecordTable {
        RecordTable::from_columns(vec![
            ("name", names.iter().map(|n| Value::from(*n)).collect()),
            ("sex", sexes.iter().map(|s| Value::from(*s)).collect()),
        ])
    }

    /// Small name-match scenario: two tables sharing one genuine match plus
    /// an unrelated row each, run end to end through embed -> norms ->
    /// compare -> one-to-one match.
    #[test]
    fn small_name_match_end_to_end() {
        let embedder = name_sex_embedder();

        let left = table(&["alice smith", "zzz nobody"], &["f", "m"]);
        let right = table(&["alice smith", "yyy nobody"], &["f", "f"]);

        let mut left = embedder.embed(&left).unwrap();
        let mut right = embedder.embed(&right).unwrap();
        left.update_norms(&embedder).unwrap();
        right.update_norms(&embedder).unwrap();

        let sim = compare(&embedder, &left, &right).unwrap();
        let pairs = sim
            .match_pairs(&MatchParams { abs_cutoff: 0.5, one_to_one: true, ..Default::default() })
            .unwrap();

        assert!(pairs.iter().any(|p| p.left == 0 && p.right == 0));
    }

    /// Concrete scenario A: an untrained embedder over `name` alone,
    /// `bf_size = 1024`, `num_hashes = 1`, bigrams only, must resolve to
    /// exactly `({0,1,3}, {1,0,2})` (Bob-Rob, Sally-Saly, John-Jon;
    /// Samina/Ade excluded) under `abs_cutoff = 0.2`, one-to-one matching.
    #[test]
    fn scenario_a_small_name_match_resolves_the_expected_pairing() {
        use crate::features::{FeatureArgs, NameFeatureArgs};

        let bigrams_only = NameFeatureArgs { ngram_length: vec![2], ..NameFeatureArgs::default() };
        let colspec = ColumnSpec::new("name", ColumnKind::Name).with_args(FeatureArgs::Name(bigrams_only));
        let embedder = Embedder::new(1024, 1, 0, Vec::new(), vec![colspec]).unwrap();

        let left = RecordTable::from_columns(vec![(
            "name",
            vec!["Bob", "Sally", "Samina", "John"].into_iter().map(Value::from).collect(),
        )]);
        let right = RecordTable::from_columns(vec![(
            "name",
            vec!["Saly", "Rob", "Jon", "Ade"].into_iter().map(Value::from).collect(),
        )]);

        let mut left = embedder.embed(&left).unwrap();
        let mut right = embedder.embed(&right).unwrap();
        left.update_norms(&embedder).unwrap();
        right.update_norms(&embedder).unwrap();

        let sim = compare(&embedder, &left, &right).unwrap();
        let pairs = sim
            .match_pairs(&MatchParams { rel_cutoff: None, abs_cutoff: 0.2, one_to_one: true })
            .unwrap();

        let mut found: Vec<(usize, usize)> = pairs.iter().map(|p| (p.left, p.right)).collect();
        found.sort_unstable();
        assert_eq!(found, vec![(0, 1), (1, 0), (3, 2)]);
    }

    #[test]
    fn full_pipeline_round_trips_through_serialisation() {
        let embedder = name_sex_embedder();
        let bytes = serialize::to_bytes(&embedder).unwrap();
        let restored = serialize::from_bytes(&bytes).unwrap();

        let left = table(&["bob jones"], &["m"]);
        let embedded_original = embedder.embed(&left).unwrap();
        let embedded_restored = restored.embed(&left).unwrap();
        assert_eq!(embedded_original.indices(), embedded_restored.indices());
    }

    #[test]
    fn private_index_matches_what_the_matcher_found() {
        let embedder = name_sex_embedder();
        let left_table = table(&["alice smith", "zzz nobody"], &["f", "m"]);
        let right_table = table(&["alice smith", "yyy nobody"], &["f", "f"]);

        let mut left = embedder.embed(&left_table).unwrap();
        let mut right = embedder.embed(&right_table).unwrap();
        left.update_norms(&embedder).unwrap();
        right.update_norms(&embedder).unwrap();

        let sim = compare(&embedder, &left, &right).unwrap();
        let pairs = sim
            .match_pairs(&MatchParams { abs_cutoff: 0.5, one_to_one: true, ..Default::default() })
            .unwrap();
        let matches: Vec<(usize, usize)> = pairs.iter().map(|p| (p.left, p.right)).collect();

        let assignment = add_private_index(left.len(), right.len(), &matches, 1000).unwrap();
        for (l, r) in matches {
            assert_eq!(assignment.left[l], assignment.right[r]);
        }
    }
}
