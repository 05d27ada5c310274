// pprl-core/src/similarity.rs
//
// Similarity engine S: soft-cosine comparison of two embedded tables under
// an embedder's affinity matrix, `S = D1 . X1 . A . X2^T . D2`, computed by
// sparse accumulation over each pair's Bloom index sets rather than
// materialising the dense indicator matrices. Matching layers threshold
// and cutoff masking on top, with an optional one-to-one Hungarian
// resolution.

use nalgebra::DMatrix;
use pathfinding::prelude::{kuhn_munkres, Matrix};
use tracing::{debug, info};

use crate::embedder::{sparse_quadratic, Embedder, EmbeddedTable};
use crate::error::{PprlError, Result};

/// Dense `left.len() x right.len()` similarity scores plus the optional
/// self-thresholds each side carried in from `update_thresholds`.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    scores: DMatrix<f64>,
    left_thresholds: Option<Vec<f64>>,
    right_thresholds: Option<Vec<f64>>,
    embedder_checksum: String,
}

impl SimilarityMatrix {
    pub fn nrows(&self) -> usize {
        self.scores.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.scores.ncols()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.scores[(i, j)]
    }

    pub fn scores(&self) -> &DMatrix<f64> {
        &self.scores
    }

    pub fn embedder_checksum(&self) -> &str {
        &self.embedder_checksum
    }
}

/// `D1 . X1 . A . X2^T . D2`: compare every row of `left` against every row
/// of `right`. Both tables must carry norms (`update_norms`) computed
/// under the same `embedder`.
pub fn compare(embedder: &Embedder, left: &EmbeddedTable, right: &EmbeddedTable) -> Result<SimilarityMatrix> {
    embedder.verify_checksum(left.embedder_checksum())?;
    embedder.verify_checksum(right.embedder_checksum())?;

    let left_norms = left.norms().ok_or(PprlError::MissingThresholds)?;
    let right_norms = right.norms().ok_or(PprlError::MissingThresholds)?;

    let a = embedder.affinity();
    debug!(left = left.len(), right = right.len(), "computing similarity matrix");

    let mut scores = DMatrix::<f64>::zeros(left.len(), right.len());
    for i in 0..left.len() {
        let li = &left.indices()[i];
        let dl = left_norms[i];
        for j in 0..right.len() {
            if dl == 0.0 || right_norms[j] == 0.0 {
                continue;
            }
            let raw = sparse_quadratic(a, li, &right.indices()[j]);
            scores[(i, j)] = raw as f64 / (dl * right_norms[j]);
        }
    }

    Ok(SimilarityMatrix {
        scores,
        left_thresholds: left.thresholds().map(|t| t.to_vec()),
        right_thresholds: right.thresholds().map(|t| t.to_vec()),
        embedder_checksum: embedder.checksum().to_string(),
    })
}

/// Matching strategy controlling how the similarity matrix is reduced to a
/// set of row/column pairs.
#[derive(Debug, Clone, Copy)]
pub struct MatchParams {
    /// A pair must score at least this much above both rows' self-similarity
    /// thresholds. Requires both sides of `compare` to carry thresholds.
    pub rel_cutoff: Option<f64>,
    /// A pair must score at least this in absolute terms, independent of
    /// `rel_cutoff`.
    pub abs_cutoff: f64,
    /// Resolve surviving candidates to a one-to-one assignment via maximum
    /// weight bipartite matching. When `false`, every surviving pair is
    /// returned (rows/columns may repeat).
    pub one_to_one: bool,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self { rel_cutoff: None, abs_cutoff: 0.0, one_to_one: false }
    }
}

/// A matched pair with its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    pub left: usize,
    pub right: usize,
    pub score: f64,
}

/// Fixed-precision scaling factor used to convert `f64` similarity scores
/// into the non-negative integer weights `pathfinding::kuhn_munkres`
/// requires.
const HUNGARIAN_SCALE: f64 = 1_000_000.0;

impl SimilarityMatrix {
    /// Reduce this matrix to a set of matched pairs under `params`.
    pub fn match_pairs(&self, params: &MatchParams) -> Result<Vec<MatchedPair>> {
        if params.rel_cutoff.is_some() && (self.left_thresholds.is_none() || self.right_thresholds.is_none()) {
            return Err(PprlError::MissingThresholds);
        }

        let mut mask = vec![vec![false; self.ncols()]; self.nrows()];
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                let score = self.get(i, j);
                if score < params.abs_cutoff {
                    continue;
                }
                if let Some(rel) = params.rel_cutoff {
                    let lt = self.left_thresholds.as_ref().unwrap()[i];
                    let rt = self.right_thresholds.as_ref().unwrap()[j];
                    if score < lt + rel || score < rt + rel {
                        continue;
                    }
                }
                mask[i][j] = true;
            }
        }

        let pairs = if params.one_to_one {
            self.hungarian_pairs(&mask)
        } else {
            let mut out = Vec::new();
            for i in 0..self.nrows() {
                for j in 0..self.ncols() {
                    if mask[i][j] {
                        out.push(MatchedPair { left: i, right: j, score: self.get(i, j) });
                    }
                }
            }
            out
        };

        info!(pairs = pairs.len(), one_to_one = params.one_to_one, "matched pairs");
        Ok(pairs)
    }

    /// Maximum-weight bipartite matching over the masked survivors, using
    /// the pre-mask survivor set to filter out zero-weight "assignments"
    /// `kuhn_munkres` still returns when one side outnumbers the other.
    /// `kuhn_munkres` requires rows <= columns, so the smaller axis is
    /// always placed on the row side, transposing back afterwards.
    fn hungarian_pairs(&self, mask: &[Vec<bool>]) -> Vec<MatchedPair> {
        let nrows = self.nrows();
        let ncols = self.ncols();
        if nrows == 0 || ncols == 0 {
            return Vec::new();
        }

        let weight_at = |i: usize, j: usize| -> i64 {
            if mask[i][j] {
                (self.get(i, j) * HUNGARIAN_SCALE).round().max(0.0) as i64
            } else {
                0
            }
        };

        let transposed = nrows > ncols;
        let (rows, cols) = if transposed { (ncols, nrows) } else { (nrows, ncols) };
        let weights = Matrix::from_fn(rows, cols, |(r, c)| {
            if transposed { weight_at(c, r) } else { weight_at(r, c) }
        });

        let (_, assignment) = kuhn_munkres(&weights);
        assignment
            .into_iter()
            .enumerate()
            .map(|(r, c)| if transposed { (c, r) } else { (r, c) })
            .filter(|&(i, j)| mask[i][j])
            .map(|(i, j)| MatchedPair { left: i, right: j, score: self.get(i, j) })
            .collect()
    }
}
