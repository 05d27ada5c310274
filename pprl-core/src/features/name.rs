// pprl-core/src/features/name.rs
//
// Name column feature function: lowercase -> n-grams (+ optional skip
// grams / double metaphone keys). Also the general-purpose `gen_features`
// used by both the `name` and `misc_shingled` column kinds.

use super::metaphone::gen_double_metaphone;
use super::tokenize::{gen_ngram, gen_skip_grams, split_string_underscore};
use crate::table::Value;

/// Options controlling which feature families `gen_features`/name/
/// misc_shingled produce. Mirrors the keyword arguments on the original
/// `gen_features` function.
#[derive(Debug, Clone)]
pub struct NameFeatureArgs {
    pub ngram_length: Vec<usize>,
    pub use_gen_ngram: bool,
    pub use_gen_skip_grams: bool,
    pub use_double_metaphone: bool,
}

impl Default for NameFeatureArgs {
    fn default() -> Self {
        Self {
            ngram_length: vec![2, 3],
            use_gen_ngram: true,
            use_gen_skip_grams: false,
            use_double_metaphone: false,
        }
    }
}

/// Generate n-grams, skip-2-grams, and/or double metaphone keys from a
/// single string, per `args`. The string is lowercased before tokenizing.
pub fn gen_features(s: &str, args: &NameFeatureArgs) -> Vec<String> {
    let lower = s.to_lowercase();
    let split_tokens = split_string_underscore(&lower);

    let mut out = Vec::new();
    if args.use_gen_ngram {
        out.extend(gen_ngram(&split_tokens, &args.ngram_length));
    }
    if args.use_gen_skip_grams {
        out.extend(gen_skip_grams(&split_tokens));
    }
    if args.use_double_metaphone {
        out.extend(gen_double_metaphone(&lower));
    }
    out
}

/// Column-kind feature function for `name`: one token list per row.
/// Missing values yield `[]`.
pub fn gen_name_features(names: &[Value], args: &NameFeatureArgs) -> Vec<Vec<String>> {
    names
        .iter()
        .map(|name| {
            let s = name.as_feature_str();
            if s.is_empty() {
                Vec::new()
            } else {
                gen_features(&s, args)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_yields_no_tokens() {
        let out = gen_name_features(&[Value::Null], &NameFeatureArgs::default());
        assert_eq!(out, vec![Vec::<String>::new()]);
    }

    #[test]
    fn default_ngrams_cover_2_and_3() {
        let tokens = gen_features("Bob", &NameFeatureArgs::default());
        assert!(tokens.iter().any(|t| t.len() == 2));
        assert!(tokens.iter().any(|t| t.len() == 3));
    }

    #[test]
    fn skip_grams_and_metaphone_are_opt_in() {
        let plain = gen_features("stephen", &NameFeatureArgs::default());
        let args = NameFeatureArgs {
            use_gen_skip_grams: true,
            use_double_metaphone: true,
            ..NameFeatureArgs::default()
        };
        let enriched = gen_features("stephen", &args);
        assert!(enriched.len() > plain.len());
    }
}
