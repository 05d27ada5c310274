// pprl-core/src/serialize.rs
//
// Stable byte encoding for `Embedder`, so two parties (or one party across
// a restart) can exchange the exact parameters a checksum was computed
// over. Matrices are flattened to `Vec<f32>` plus their dimensions rather
// than relying on `nalgebra`'s own (unstable-across-versions) binary
// layout; column kinds are serialised as their registry keys, never as
// closures, per the registry module's whole reason for existing.

use serde::{Deserialize, Serialize};

use crate::embedder::{ColumnSpec, Embedder};
use crate::error::{PprlError, Result};
use crate::features::FeatureArgs;
use crate::registry::ColumnKind;

#[derive(Debug, Serialize, Deserialize)]
struct FlatMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl FlatMatrix {
    fn from_matrix(m: &nalgebra::DMatrix<f32>) -> Self {
        Self { rows: m.nrows(), cols: m.ncols(), data: m.iter().copied().collect() }
    }

    fn into_matrix(self) -> Result<nalgebra::DMatrix<f32>> {
        if self.data.len() != self.rows * self.cols {
            return Err(PprlError::LoadError("matrix dimensions do not match data length".to_string()));
        }
        Ok(nalgebra::DMatrix::from_vec(self.rows, self.cols, self.data))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireColumnSpec {
    name: String,
    kind_key: String,
    args: FeatureArgsWire,
}

/// Wire form of `FeatureArgs`; mirrors its shape field for field so
/// `bincode` can round-trip it without relying on `ColumnKind` identity
/// (the registry key carries that separately, for the checksum's sake).
#[derive(Debug, Serialize, Deserialize)]
enum FeatureArgsWire {
    Name { ngram_length: Vec<usize>, use_gen_ngram: bool, use_gen_skip_grams: bool, use_double_metaphone: bool },
    Dob { dayfirst: bool, yearfirst: bool, default: Vec<String> },
    Sex,
    Misc { label: Option<String> },
    MiscShingled {
        label: Option<String>,
        ngram_length: Vec<usize>,
        use_gen_ngram: bool,
        use_gen_skip_grams: bool,
        use_double_metaphone: bool,
    },
}

impl From<&FeatureArgs> for FeatureArgsWire {
    fn from(args: &FeatureArgs) -> Self {
        match args {
            FeatureArgs::Name(a) => FeatureArgsWire::Name {
                ngram_length: a.ngram_length.clone(),
                use_gen_ngram: a.use_gen_ngram,
                use_gen_skip_grams: a.use_gen_skip_grams,
                use_double_metaphone: a.use_double_metaphone,
            },
            FeatureArgs::Dob(a) => FeatureArgsWire::Dob {
                dayfirst: a.dayfirst,
                yearfirst: a.yearfirst,
                default: a.default.clone(),
            },
            FeatureArgs::Sex => FeatureArgsWire::Sex,
            FeatureArgs::Misc { label } => FeatureArgsWire::Misc { label: label.clone() },
            FeatureArgs::MiscShingled { label, shingle } => FeatureArgsWire::MiscShingled {
                label: label.clone(),
                ngram_length: shingle.ngram_length.clone(),
                use_gen_ngram: shingle.use_gen_ngram,
                use_gen_skip_grams: shingle.use_gen_skip_grams,
                use_double_metaphone: shingle.use_double_metaphone,
            },
        }
    }
}

impl From<FeatureArgsWire> for FeatureArgs {
    fn from(wire: FeatureArgsWire) -> Self {
        use crate::features::{DobFeatureArgs, NameFeatureArgs};
        match wire {
            FeatureArgsWire::Name { ngram_length, use_gen_ngram, use_gen_skip_grams, use_double_metaphone } => {
                FeatureArgs::Name(NameFeatureArgs { ngram_length, use_gen_ngram, use_gen_skip_grams, use_double_metaphone })
            }
            FeatureArgsWire::Dob { dayfirst, yearfirst, default } => {
                FeatureArgs::Dob(DobFeatureArgs { dayfirst, yearfirst, default })
            }
            FeatureArgsWire::Sex => FeatureArgs::Sex,
            FeatureArgsWire::Misc { label } => FeatureArgs::Misc { label },
            FeatureArgsWire::MiscShingled { label, ngram_length, use_gen_ngram, use_gen_skip_grams, use_double_metaphone } => {
                FeatureArgs::MiscShingled {
                    label,
                    shingle: NameFeatureArgs { ngram_length, use_gen_ngram, use_gen_skip_grams, use_double_metaphone },
                }
            }
        }
    }
}

fn kind_from_key(key: &str) -> Result<ColumnKind> {
    ColumnKind::all()
        .into_iter()
        .find(|k| k.registry_key() == key)
        .ok_or_else(|| PprlError::LoadError(format!("unknown column kind registry key '{key}'")))
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEmbedder {
    size: u32,
    num_hashes: usize,
    offset: u32,
    salt: Vec<u8>,
    columns: Vec<WireColumnSpec>,
    affinity: FlatMatrix,
    freq_matched: FlatMatrix,
    freq_unmatched: FlatMatrix,
    checksum: String,
}

/// Encode `embedder` to its stable byte form.
pub fn to_bytes(embedder: &Embedder) -> Result<Vec<u8>> {
    let columns = embedder
        .colspecs()
        .iter()
        .map(|c| WireColumnSpec {
            name: c.name.clone(),
            kind_key: c.kind.registry_key().to_string(),
            args: FeatureArgsWire::from(&c.args),
        })
        .collect();

    let wire = WireEmbedder {
        size: embedder.size(),
        num_hashes: embedder.num_hashes(),
        offset: embedder.offset(),
        salt: embedder.salt().to_vec(),
        columns,
        affinity: FlatMatrix::from_matrix(embedder.affinity()),
        freq_matched: FlatMatrix::from_matrix(embedder.freq_matched()),
        freq_unmatched: FlatMatrix::from_matrix(embedder.freq_unmatched()),
        checksum: embedder.checksum().to_string(),
    };

    bincode::serialize(&wire).map_err(|e| PprlError::LoadError(e.to_string()))
}

/// Decode and reconstruct an `Embedder`, rejecting the payload if its
/// recomputed checksum doesn't match the one it was serialised with — this
/// is fatal (`LoadError`), never a `ChecksumMismatch` that a caller might
/// choose to ignore, because a tampered or corrupted payload cannot be
/// trusted at all.
pub fn from_bytes(bytes: &[u8]) -> Result<Embedder> {
    let wire: WireEmbedder = bincode::deserialize(bytes).map_err(|e| PprlError::LoadError(e.to_string()))?;

    let colspecs = wire
        .columns
        .into_iter()
        .map(|c| {
            let kind = kind_from_key(&c.kind_key)?;
            Ok(ColumnSpec::new(c.name, kind).with_args(FeatureArgs::from(c.args)))
        })
        .collect::<Result<Vec<ColumnSpec>>>()?;

    let embedder = Embedder::from_parts(
        wire.size,
        wire.num_hashes,
        wire.offset,
        wire.salt,
        colspecs,
        wire.affinity.into_matrix()?,
        wire.freq_matched.into_matrix()?,
        wire.freq_unmatched.into_matrix()?,
    )?;

    if embedder.checksum() != wire.checksum {
        return Err(PprlError::LoadError(format!(
            "checksum mismatch on load: expected {}, computed {}",
            wire.checksum,
            embedder.checksum()
        )));
    }

    Ok(embedder)
}
