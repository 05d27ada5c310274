// pprl-core/src/features/mod.rs
//
// Pure functions from a column of raw values to a column of token lists,
// one family per semantic column kind (`name`, `dob`, `sex`, `misc`,
// `misc_shingled`). The label prefixes each kind applies (`sex<...>`,
// `day<...>`, `label<...>`) guarantee tokens from different kinds live in
// disjoint parts of the token universe before hashing, so a `sex` value of
// `"m"` can never collide with a name fragment starting with `m`.

pub mod dob;
pub mod metaphone;
pub mod misc;
pub mod name;
pub mod tokenize;

pub use dob::{gen_dateofbirth_features, DobFeatureArgs};
pub use metaphone::gen_double_metaphone;
pub use misc::{gen_misc_features, gen_misc_shingled_features};
pub use name::{gen_features, gen_name_features, NameFeatureArgs};
pub use sex::gen_sex_features;
pub use tokenize::{gen_ngram, gen_skip_grams, split_string_underscore};

mod sex;

use crate::registry::ColumnKind;
use crate::table::Value;

/// Per-kind option set, keyed by `ColumnKind` in `Embedder::ff_args`. The
/// `Misc`/`MiscShingled` variants carry an explicit label override; when
/// `None`, the column name from `colspec` is used, matching the
/// `label = label or field.name or "misc"` fallback in the original
/// feature generators.
#[derive(Debug, Clone)]
pub enum FeatureArgs {
    Name(NameFeatureArgs),
    Dob(DobFeatureArgs),
    Sex,
    Misc { label: Option<String> },
    MiscShingled { label: Option<String>, shingle: NameFeatureArgs },
}

impl FeatureArgs {
    pub fn default_for(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Name => FeatureArgs::Name(NameFeatureArgs::default()),
            ColumnKind::Dob => FeatureArgs::Dob(DobFeatureArgs::default()),
            ColumnKind::Sex => FeatureArgs::Sex,
            ColumnKind::Misc => FeatureArgs::Misc { label: None },
            ColumnKind::MiscShingled => FeatureArgs::MiscShingled {
                label: None,
                shingle: NameFeatureArgs::default(),
            },
        }
    }
}

/// Apply the feature function for `kind` to a column's values, using
/// `column_name` as the fallback label for `misc`/`misc_shingled`.
pub fn apply(kind: ColumnKind, column_name: &str, values: &[Value], args: &FeatureArgs) -> Vec<Vec<String>> {
    match (kind, args) {
        (ColumnKind::Name, FeatureArgs::Name(a)) => gen_name_features(values, a),
        (ColumnKind::Dob, FeatureArgs::Dob(a)) => gen_dateofbirth_features(values, a),
        (ColumnKind::Sex, FeatureArgs::Sex) => gen_sex_features(values),
        (ColumnKind::Misc, FeatureArgs::Misc { label }) => {
            gen_misc_features(values, label.as_deref().unwrap_or(column_name))
        }
        (ColumnKind::MiscShingled, FeatureArgs::MiscShingled { label, shingle }) => {
            gen_misc_shingled_features(values, label.as_deref().unwrap_or(column_name), shingle)
        }
        (kind, _) => {
            // ff_args carried the wrong variant for this column's kind — a
            // caller bug, not a data problem. Fall back to that kind's
            // defaults rather than panicking on a batch job.
            apply(kind, column_name, values, &FeatureArgs::default_for(kind))
        }
    }
}
