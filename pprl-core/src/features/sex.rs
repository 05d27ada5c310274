// pprl-core/src/features/sex.rs
//
// Sex column feature function: a single labelled token from the casefolded
// first character, or the empty-data sentinel `""` for missing input.
//
// Only genuine string cells produce a token — a numeric cell is treated as
// missing rather than stringified, the same way pandas's `.str` accessor
// turns non-string values into NaN before the label is built.

use crate::table::Value;

/// Column-kind feature function for `sex`: `["sex<x>"]` where `x` is the
/// casefolded first character of the input, or `[""]` for missing/
/// non-string data.
pub fn gen_sex_features(sexes: &[Value]) -> Vec<Vec<String>> {
    sexes
        .iter()
        .map(|v| match v.as_str_strict().filter(|s| !s.is_empty()) {
            Some(s) => {
                let first = s.to_lowercase().chars().next().unwrap();
                vec![format!("sex<{first}>")]
            }
            None => vec![String::new()],
        })
        .collect()
}
