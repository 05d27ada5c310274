// pprl-core/src/embedder.rs
//
// The Embedder (E) and EmbeddedTable (T) from the system overview: E holds
// the fixed Bloom parameters and the trainable affinity matrix; T is an
// embedded table wrapping a `Table` by composition rather than by
// subclassing one (see the registry module notes and the redesign flags
// this crate follows). Every `EmbeddedTable` method checks its
// `embedder_checksum` against the `Embedder` it's paired with before doing
// anything, so a table embedded under one party's parameters can never be
// silently compared under another's.

use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::bloom::bloom_indices;
use crate::error::{PprlError, Result};
use crate::features::{self, FeatureArgs};
use crate::registry::ColumnKind;
use crate::table::Table;

/// One column's role in the embedding: which semantic kind it is, and the
/// arguments its feature function takes.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub args: FeatureArgs,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        let args = FeatureArgs::default_for(kind);
        Self { name: name.into(), kind, args }
    }

    pub fn with_args(mut self, args: FeatureArgs) -> Self {
        self.args = args;
        self
    }
}

/// Fixed Bloom/feature parameters plus the trainable affinity matrix. The
/// central object that crosses party boundaries: both parties must embed
/// under byte-identical `Embedder`s (verified via `checksum`) for a
/// comparison to be meaningful.
#[derive(Debug, Clone)]
pub struct Embedder {
    size: u32,
    num_hashes: usize,
    offset: u32,
    salt: Vec<u8>,
    colspecs: Vec<ColumnSpec>,
    /// Symmetric PSD, dimension `size + offset`. Starts as the identity —
    /// an untrained embedder behaves as plain Jaccard-style overlap on the
    /// Bloom vectors until `train()` fits it.
    affinity: DMatrix<f32>,
    freq_matched: DMatrix<f32>,
    freq_unmatched: DMatrix<f32>,
    checksum: String,
}

impl Embedder {
    pub fn new(
        size: u32,
        num_hashes: usize,
        offset: u32,
        salt: Vec<u8>,
        colspecs: Vec<ColumnSpec>,
    ) -> Result<Self> {
        if size == 0 {
            return Err(PprlError::InvalidParameters("size must be positive".into()));
        }
        if num_hashes == 0 {
            return Err(PprlError::InvalidParameters("num_hashes must be at least 1".into()));
        }
        if colspecs.is_empty() {
            return Err(PprlError::InvalidParameters("at least one column must be specified".into()));
        }

        let dim = (size + offset) as usize;
        let mut embedder = Self {
            size,
            num_hashes,
            offset,
            salt,
            colspecs,
            affinity: DMatrix::identity(dim, dim),
            freq_matched: DMatrix::zeros(dim, dim),
            freq_unmatched: DMatrix::zeros(dim, dim),
            checksum: String::new(),
        };
        embedder.checksum = embedder.compute_checksum();
        info!(size, num_hashes, offset, columns = embedder.colspecs.len(), "embedder constructed");
        Ok(embedder)
    }

    /// Reconstruct an embedder from already-deserialised parts, skipping
    /// the identity-matrix initialisation `new` performs — used by the
    /// serialiser when restoring a previously trained embedder. Does not
    /// validate the checksum; callers compare it against the wire
    /// checksum themselves.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        size: u32,
        num_hashes: usize,
        offset: u32,
        salt: Vec<u8>,
        colspecs: Vec<ColumnSpec>,
        affinity: DMatrix<f32>,
        freq_matched: DMatrix<f32>,
        freq_unmatched: DMatrix<f32>,
    ) -> Result<Self> {
        if size == 0 {
            return Err(PprlError::InvalidParameters("size must be positive".into()));
        }
        if num_hashes == 0 {
            return Err(PprlError::InvalidParameters("num_hashes must be at least 1".into()));
        }
        let mut embedder = Self {
            size,
            num_hashes,
            offset,
            salt,
            colspecs,
            affinity,
            freq_matched,
            freq_unmatched,
            checksum: String::new(),
        };
        embedder.checksum = embedder.compute_checksum();
        Ok(embedder)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn dim(&self) -> usize {
        (self.size + self.offset) as usize
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn affinity(&self) -> &DMatrix<f32> {
        &self.affinity
    }

    pub fn colspecs(&self) -> &[ColumnSpec] {
        &self.colspecs
    }

    /// Deterministic digest of everything that must match for two parties'
    /// embeddings to be comparable: each column's `(name, registry key)` in
    /// sorted order, the affinity matrix's entries, and the three scalar
    /// Bloom parameters.
    pub fn compute_checksum(&self) -> String {
        let mut ctx = md5::Context::new();

        let mut columns: Vec<&ColumnSpec> = self.colspecs.iter().collect();
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        for col in columns {
            ctx.consume(col.name.as_bytes());
            ctx.consume(col.kind.registry_key().as_bytes());
        }
        for value in self.affinity.iter() {
            ctx.consume(value.to_le_bytes());
        }
        ctx.consume(self.size.to_le_bytes());
        ctx.consume((self.num_hashes as u64).to_le_bytes());
        ctx.consume(self.offset.to_le_bytes());

        hex::encode(ctx.compute().0)
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Verify `other` was computed against this exact embedder.
    pub fn verify_checksum(&self, other: &str) -> Result<()> {
        let expected = self.compute_checksum();
        if expected != other {
            return Err(PprlError::ChecksumMismatch {
                expected,
                found: other.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn freq_matched_mut(&mut self) -> &mut DMatrix<f32> {
        &mut self.freq_matched
    }

    pub(crate) fn freq_unmatched_mut(&mut self) -> &mut DMatrix<f32> {
        &mut self.freq_unmatched
    }

    pub(crate) fn freq_matched(&self) -> &DMatrix<f32> {
        &self.freq_matched
    }

    pub(crate) fn freq_unmatched(&self) -> &DMatrix<f32> {
        &self.freq_unmatched
    }

    pub(crate) fn set_affinity(&mut self, affinity: DMatrix<f32>) {
        self.affinity = affinity;
        self.checksum = self.compute_checksum();
    }

    /// Generate a Bloom index set per row of `table`, one column at a time,
    /// concatenating every column's labelled tokens into a single shared
    /// bit space before hashing — this is what lets a `sex<m>` token and a
    /// `name` n-gram both influence the same similarity score.
    pub fn embed(&self, table: &dyn Table) -> Result<EmbeddedTable> {
        let n = table.len();
        debug!(rows = n, "embedding table");

        let mut per_column_tokens: Vec<Vec<Vec<String>>> = Vec::with_capacity(self.colspecs.len());
        for col in &self.colspecs {
            let values = table.column(&col.name).ok_or_else(|| {
                PprlError::InvalidParameters(format!("column '{}' not present in table", col.name))
            })?;
            per_column_tokens.push(features::apply(col.kind, &col.name, values, &col.args));
        }

        let mut rows: Vec<Vec<String>> = vec![Vec::new(); n];
        for column in per_column_tokens {
            for (row, tokens) in rows.iter_mut().zip(column.into_iter()) {
                row.extend(tokens);
            }
        }

        let salt = &self.salt;
        let size = self.size;
        let offset = self.offset;
        let num_hashes = self.num_hashes;
        let indices: Vec<Vec<u32>> = rows
            .par_iter()
            .map(|tokens| bloom_indices(tokens, salt, size, num_hashes, offset))
            .collect();

        Ok(EmbeddedTable {
            indices,
            norms: None,
            thresholds: None,
            embedder_checksum: self.checksum.clone(),
        })
    }
}

/// A table that has been embedded under a specific `Embedder`: one Bloom
/// index set per row, plus optional norms and self-thresholds computed on
/// demand. Composition over the original table rather than subclassing it.
#[derive(Debug, Clone)]
pub struct EmbeddedTable {
    indices: Vec<Vec<u32>>,
    norms: Option<Vec<f64>>,
    thresholds: Option<Vec<f64>>,
    embedder_checksum: String,
}

impl EmbeddedTable {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[Vec<u32>] {
        &self.indices
    }

    pub fn embedder_checksum(&self) -> &str {
        &self.embedder_checksum
    }

    pub fn norms(&self) -> Option<&[f64]> {
        self.norms.as_deref()
    }

    pub fn thresholds(&self) -> Option<&[f64]> {
        self.thresholds.as_deref()
    }

    /// `sqrt(x_i^T A x_i)` for each row's indicator vector `x_i`, computed
    /// by summing `A[i, j]` over set-bit pairs rather than materialising
    /// `x_i` densely — `O(|I|^2)` per row instead of `O(size^2)`.
    pub fn update_norms(&mut self, embedder: &Embedder) -> Result<()> {
        embedder.verify_checksum(&self.embedder_checksum)?;
        let a = embedder.affinity();

        self.norms = Some(
            self.indices
                .par_iter()
                .map(|idx| {
                    let mut acc = 0f32;
                    for &i in idx {
                        for &j in idx {
                            acc += a[(i as usize, j as usize)];
                        }
                    }
                    (acc.max(0.0) as f64).sqrt()
                })
                .collect(),
        );
        Ok(())
    }

    /// Compare this table against itself with the diagonal masked out, and
    /// record each row's strongest off-diagonal similarity as its
    /// threshold — the level a genuine cross-table match must clear to be
    /// distinguishable from this row's background self-similarity.
    pub fn update_thresholds(&mut self, embedder: &Embedder) -> Result<()> {
        embedder.verify_checksum(&self.embedder_checksum)?;
        if self.norms.is_none() {
            self.update_norms(embedder)?;
        }
        let norms = self.norms.as_ref().expect("norms just computed");
        let a = embedder.affinity();

        let thresholds: Vec<f64> = (0..self.indices.len())
            .into_par_iter()
            .map(|i| {
                let mut best = 0f64;
                for j in 0..self.indices.len() {
                    if i == j {
                        continue;
                    }
                    let raw = sparse_quadratic(a, &self.indices[i], &self.indices[j]);
                    let denom = norms[i] * norms[j];
                    let score = if denom > 0.0 { raw as f64 / denom } else { 0.0 };
                    if score > best {
                        best = score;
                    }
                }
                best
            })
            .collect();

        self.thresholds = Some(thresholds);
        Ok(())
    }

    pub fn require_thresholds(&self) -> Result<&[f64]> {
        self.thresholds.as_deref().ok_or(PprlError::MissingThresholds)
    }
}

/// `x_i^T A x_j` for two index sets, without materialising either indicator
/// vector.
pub(crate) fn sparse_quadratic(a: &DMatrix<f32>, left: &[u32], right: &[u32]) -> f32 {
    let mut acc = 0f32;
    for &i in left {
        for &j in right {
            acc += a[(i as usize, j as usize)];
        }
    }
    acc
}
