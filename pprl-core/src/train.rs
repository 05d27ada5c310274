// pprl-core/src/train.rs
//
// Trainer R: fits an embedder's affinity matrix from two embedded tables
// known to be row-aligned matches. Accumulates joint-occurrence counts
// into `freq_matched`/`freq_unmatched`, takes a log-ratio of the
// normalised frequencies, and projects the result onto the PSD cone by
// eigendecomposition, clamping negative eigenvalues to a floor.

use nalgebra::{DMatrix, SymmetricEigen};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::embedder::{Embedder, EmbeddedTable};
use crate::error::{PprlError, Result};

/// Default log-ratio epsilon, keeping `log(freq + eps)` finite for index
/// pairs that never co-occurred. Not the PSD eigenvalue floor, which is a
/// fixed internal constant (see `PSD_EIGENVALUE_FLOOR`).
pub const DEFAULT_EPS: f32 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct TrainParams {
    /// Whether to accumulate onto the existing frequency matrices
    /// (`F += lr·J`) or reset them to `I + lr·J` first, discarding any
    /// prior training.
    pub update: bool,
    /// Must lie in `(0, 1]`; scales how much this call's joint-occurrence
    /// counts move the frequency matrices.
    pub learning_rate: f32,
    pub eps: f32,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self { update: true, learning_rate: 1.0, eps: DEFAULT_EPS }
    }
}

/// Fit `embedder`'s affinity matrix from two row-aligned embedded tables
/// (`matched_left[i]` is known to be the same entity as `matched_right[i]`).
/// Both tables must have been embedded under `embedder` and must be the
/// same length. `rng` drives the uniform permutation of the right-hand
/// indices used to sample non-matching pairs.
///
/// Mutates `embedder` in place via `&mut self`; the borrow checker makes
/// concurrent `train()` calls on the same embedder a compile error, the
/// single-writer requirement from the concurrency notes enforced
/// statically rather than with a runtime lock.
pub fn train(
    embedder: &mut Embedder,
    matched_left: &EmbeddedTable,
    matched_right: &EmbeddedTable,
    params: &TrainParams,
    rng: &mut impl Rng,
) -> Result<()> {
    if matched_left.len() != matched_right.len() {
        return Err(PprlError::InvalidParameters(
            "matched_left and matched_right must have equal length".to_string(),
        ));
    }
    if !(params.learning_rate > 0.0 && params.learning_rate <= 1.0) {
        return Err(PprlError::InvalidParameters(format!(
            "learning_rate must lie in (0, 1], got {}",
            params.learning_rate
        )));
    }
    if params.eps < 0.0 {
        return Err(PprlError::InvalidParameters(format!("eps must be non-negative, got {}", params.eps)));
    }
    embedder.verify_checksum(matched_left.embedder_checksum())?;
    embedder.verify_checksum(matched_right.embedder_checksum())?;

    let dim = embedder.dim();
    info!(pairs = matched_left.len(), dim, update = params.update, "training affinity matrix");

    let mut joint_matched = DMatrix::zeros(dim, dim);
    accumulate_joint(&mut joint_matched, matched_left.indices(), matched_right.indices());

    // Random non-matches: a uniform permutation of the right-hand indices,
    // independent of the left-hand row order.
    let mut jumbled_right: Vec<&Vec<u32>> = matched_right.indices().iter().collect();
    jumbled_right.shuffle(rng);
    let mut joint_unmatched = DMatrix::zeros(dim, dim);
    accumulate_joint_refs(&mut joint_unmatched, matched_left.indices(), &jumbled_right);

    if params.update {
        *embedder.freq_matched_mut() += joint_matched * params.learning_rate;
        *embedder.freq_unmatched_mut() += joint_unmatched * params.learning_rate;
    } else {
        *embedder.freq_matched_mut() = DMatrix::identity(dim, dim) + joint_matched * params.learning_rate;
        *embedder.freq_unmatched_mut() = DMatrix::identity(dim, dim) + joint_unmatched * params.learning_rate;
    }

    let log_ratio = log_ratio_matrix(embedder.freq_matched(), embedder.freq_unmatched(), dim, params.eps);
    let projected = project_to_psd(&log_ratio);

    embedder.set_affinity(projected);
    Ok(())
}

fn accumulate_joint(freq: &mut DMatrix<f32>, left: &[Vec<u32>], right: &[Vec<u32>]) {
    let refs: Vec<&Vec<u32>> = right.iter().collect();
    accumulate_joint_refs(freq, left, &refs);
}

fn accumulate_joint_refs(freq: &mut DMatrix<f32>, left: &[Vec<u32>], right: &[&Vec<u32>]) {
    for (li, ri) in left.iter().zip(right.iter()) {
        for &i in li {
            for &j in ri.iter() {
                freq[(i as usize, j as usize)] += 1.0;
                if i != j {
                    freq[(j as usize, i as usize)] += 1.0;
                }
            }
        }
    }
}

/// `log(matched_ij + eps) - log(unmatched_ij + eps)`, the pointwise
/// mutual-information analogue: `eps` keeps the log finite for index pairs
/// that never co-occurred in one of the two pools.
fn log_ratio_matrix(matched: &DMatrix<f32>, unmatched: &DMatrix<f32>, dim: usize, eps: f32) -> DMatrix<f32> {
    DMatrix::from_fn(dim, dim, |i, j| (matched[(i, j)] + eps).ln() - (unmatched[(i, j)] + eps).ln())
}

/// Floor applied to negative eigenvalues during PSD projection — fixed,
/// independent of the caller's `eps` (which only keeps `log_ratio_matrix`
/// finite), matching `nearest_pos_semi_definite`'s own hardcoded floor.
const PSD_EIGENVALUE_FLOOR: f32 = 1e-6;

/// Symmetrise `m`, eigendecompose, clamp negative eigenvalues to
/// `PSD_EIGENVALUE_FLOOR`, and reconstruct — the nearest positive
/// semi-definite matrix in the Frobenius sense, the direct analogue of
/// `np.linalg.eig` plus `nearest_pos_semi_definite`.
fn project_to_psd(m: &DMatrix<f32>) -> DMatrix<f32> {
    let symmetric = (m + m.transpose()) * 0.5;
    let eigen = SymmetricEigen::new(symmetric);

    let clamped_values: Vec<f32> =
        eigen.eigenvalues.iter().map(|&lambda| lambda.max(PSD_EIGENVALUE_FLOOR)).collect();
    let clamped = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(clamped_values));

    &eigen.eigenvectors * clamped * eigen.eigenvectors.transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::ColumnSpec;
    use crate::registry::ColumnKind;
    use crate::table::{RecordTable, Value};

    fn embedder() -> Embedder {
        Embedder::new(32, 3, 4, b"salt".to_vec(), vec![ColumnSpec::new("name", ColumnKind::Name)]).unwrap()
    }

    fn table(names: &[&str]) -> RecordTable {
        RecordTable::from_columns(vec![("name", names.iter().map(|n| Value::from(*n)).collect())])
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let e = embedder();
        let left = e.embed(&table(&["alice smith"])).unwrap();
        let right = e.embed(&table(&["alice smith", "bob jones"])).unwrap();
        let mut e = e;
        let result = train(&mut e, &left, &right, &TrainParams::default(), &mut rand::thread_rng());
        assert!(result.is_err());
    }

    #[test]
    fn learning_rate_out_of_range_is_rejected() {
        let mut e = embedder();
        let left = e.embed(&table(&["alice smith"])).unwrap();
        let right = e.embed(&table(&["alice smith"])).unwrap();
        let params = TrainParams { learning_rate: 0.0, ..TrainParams::default() };
        let result = train(&mut e, &left, &right, &params, &mut rand::thread_rng());
        assert!(result.is_err());
    }

    #[test]
    fn training_updates_checksum_and_stays_symmetric() {
        let mut e = embedder();
        let left = e.embed(&table(&["alice smith", "bob jones", "carol white"])).unwrap();
        let right = e.embed(&table(&["alice smith", "bob jones", "carol white"])).unwrap();
        let before = e.checksum().to_string();

        train(&mut e, &left, &right, &TrainParams::default(), &mut rand::thread_rng()).unwrap();

        assert_ne!(before, e.checksum());
        let a = e.affinity();
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                assert!((a[(i, j)] - a[(j, i)]).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn affinity_eigenvalues_respect_psd_floor() {
        let mut e = embedder();
        let left = e.embed(&table(&["alice smith", "bob jones"])).unwrap();
        let right = e.embed(&table(&["alice smith", "bob jones"])).unwrap();
        train(&mut e, &left, &right, &TrainParams::default(), &mut rand::thread_rng()).unwrap();

        let eigen = SymmetricEigen::new(e.affinity().clone());
        assert!(eigen.eigenvalues.iter().all(|&lambda| lambda >= PSD_EIGENVALUE_FLOOR - 1e-7));
    }

    #[test]
    fn learning_rate_scales_the_frequency_update() {
        // With update=false and a half learning rate, F_match should be
        // exactly I + 0.5 * J(x, y) — check one off-diagonal cell directly
        // rather than the whole downstream log-ratio/PSD pipeline.
        let mut e = embedder();
        let left = e.embed(&table(&["alice smith", "bob jones"])).unwrap();
        let right = e.embed(&table(&["alice smith", "bob jones"])).unwrap();

        let mut full = embedder();
        train(
            &mut full,
            &left,
            &right,
            &TrainParams { update: false, learning_rate: 1.0, eps: DEFAULT_EPS },
            &mut rand::thread_rng(),
        )
        .unwrap();

        let mut half = embedder();
        train(
            &mut half,
            &left,
            &right,
            &TrainParams { update: false, learning_rate: 0.5, eps: DEFAULT_EPS },
            &mut rand::thread_rng(),
        )
        .unwrap();

        let dim = full.dim();
        let identity_only = DMatrix::<f32>::identity(dim, dim);
        let full_joint = full.freq_matched() - &identity_only;
        let half_joint = half.freq_matched() - &identity_only;
        for i in 0..dim {
            for j in 0..dim {
                assert!((half_joint[(i, j)] - full_joint[(i, j)] * 0.5).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn update_false_discards_prior_training() {
        // Whatever garbage accumulated from prior calls, a reset call must
        // land on exactly the same frequency matrix a single fresh call
        // would produce — history must not leak through.
        let reset_params = TrainParams { update: false, learning_rate: 1.0, eps: DEFAULT_EPS };

        // Each `train()` call mutates the embedder's checksum, so repeat
        // calls against the same tables must re-embed in between.
        let mut seasoned = embedder();
        for _ in 0..2 {
            let left = seasoned.embed(&table(&["alice smith", "bob jones"])).unwrap();
            let right = seasoned.embed(&table(&["alice smith", "bob jones"])).unwrap();
            train(&mut seasoned, &left, &right, &TrainParams::default(), &mut rand::thread_rng()).unwrap();
        }
        let left = seasoned.embed(&table(&["alice smith", "bob jones"])).unwrap();
        let right = seasoned.embed(&table(&["alice smith", "bob jones"])).unwrap();
        train(&mut seasoned, &left, &right, &reset_params, &mut rand::thread_rng()).unwrap();

        let mut fresh = embedder();
        let fresh_left = fresh.embed(&table(&["alice smith", "bob jones"])).unwrap();
        let fresh_right = fresh.embed(&table(&["alice smith", "bob jones"])).unwrap();
        train(&mut fresh, &fresh_left, &fresh_right, &reset_params, &mut rand::thread_rng()).unwrap();

        for i in 0..fresh.dim() {
            for j in 0..fresh.dim() {
                assert!((seasoned.freq_matched()[(i, j)] - fresh.freq_matched()[(i, j)]).abs() < 1e-4);
            }
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::embedder::ColumnSpec;
    use crate::registry::ColumnKind;
    use crate::table::{RecordTable, Value};
    use proptest::prelude::*;

    proptest! {
        // Property #8: after train(), the affinity matrix's minimum
        // eigenvalue never falls below the fixed PSD floor, for arbitrary
        // row-aligned name pairs, update flags, and learning rates.
        #[test]
        fn affinity_is_always_psd_after_training(
            names in proptest::collection::vec("[a-z]{2,8} [a-z]{2,8}", 1..6),
            update in any::<bool>(),
            learning_rate in 0.01f32..1.0,
        ) {
            let mut e = Embedder::new(32, 3, 4, b"salt".to_vec(), vec![ColumnSpec::new("name", ColumnKind::Name)]).unwrap();
            let t = RecordTable::from_columns(vec![("name", names.iter().map(|n| Value::from(n.as_str())).collect())]);
            let left = e.embed(&t).unwrap();
            let right = e.embed(&t).unwrap();

            let params = TrainParams { update, learning_rate, eps: DEFAULT_EPS };
            train(&mut e, &left, &right, &params, &mut rand::thread_rng()).unwrap();

            let eigen = SymmetricEigen::new(e.affinity().clone());
            prop_assert!(eigen.eigenvalues.iter().all(|&lambda| lambda >= PSD_EIGENVALUE_FLOOR - 1e-6));
        }
    }
}
