// pprl-core/src/features/misc.rs
//
// Catch-all categorical and shingled-string column feature functions. Both
// take an explicit `label` to keep their tokens in a disjoint part of the
// token universe from names/dates/sex (see the module doc in mod.rs).

use super::name::{gen_features, NameFeatureArgs};
use crate::table::Value;

/// Column-kind feature function for `misc(label)`: `["label<value>"]` with
/// the value casefolded, or `[""]` for a genuinely missing cell. Unlike
/// `sex`, any scalar type is stringified — only an actual null is missing.
pub fn gen_misc_features(field: &[Value], label: &str) -> Vec<Vec<String>> {
    field
        .iter()
        .map(|v| match v.as_display_string() {
            Some(s) => vec![format!("{label}<{}>", s.to_lowercase())],
            None => vec![String::new()],
        })
        .collect()
}

/// Column-kind feature function for `misc_shingled(label)`: n-grams (and
/// optionally skip-grams) of the value, each wrapped as `label<gram>`.
pub fn gen_misc_shingled_features(
    field: &[Value],
    label: &str,
    args: &NameFeatureArgs,
) -> Vec<Vec<String>> {
    field
        .iter()
        .map(|v| {
            let s = v.as_feature_str();
            if s.is_empty() {
                return Vec::new();
            }
            gen_features(&s, args)
                .into_iter()
                .map(|feature| format!("{label}<{feature}>"))
                .collect()
        })
        .collect()
}
