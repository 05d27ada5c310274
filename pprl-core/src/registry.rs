// pprl-core/src/registry.rs
//
// Stable identities for the feature factory, replacing a pickled mapping
// of column-kind -> closure (see the embedder module notes and spec.md §9,
// redesign flag "pickle-based transport"). `Embedder` keeps a set of
// `ColumnKind`s it knows how to embed; each kind's registry key is mixed
// into the checksum and is what gets serialised, never a function pointer.
// Two parties agree on compatibility by sharing this enum, not by shipping
// code to one another.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum ColumnKind {
    Name,
    Dob,
    Sex,
    Misc,
    MiscShingled,
}

impl ColumnKind {
    /// Stable string identity, mixed into the embedder checksum and used
    /// as the serialised key for `feature_factory`/`ff_args`.
    pub const fn registry_key(self) -> &'static str {
        match self {
            ColumnKind::Name => "name",
            ColumnKind::Dob => "dob",
            ColumnKind::Sex => "sex",
            ColumnKind::Misc => "misc",
            ColumnKind::MiscShingled => "misc_shingled",
        }
    }

    pub fn all() -> [ColumnKind; 5] {
        [
            ColumnKind::Name,
            ColumnKind::Dob,
            ColumnKind::Sex,
            ColumnKind::Misc,
            ColumnKind::MiscShingled,
        ]
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.registry_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keys_are_distinct() {
        let keys: std::collections::HashSet<_> =
            ColumnKind::all().iter().map(|k| k.registry_key()).collect();
        assert_eq!(keys.len(), ColumnKind::all().len());
    }
}
