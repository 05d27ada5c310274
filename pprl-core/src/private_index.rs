// pprl-core/src/private_index.rs
//
// Private-index assignment: given a verified one-to-one set of matched
// pairs plus the sizes of both parties' tables, assign every row (matched
// or not) a slot in a shared index space without revealing which rows
// matched to either party's raw identifiers. Every slot — matched pairs
// (who share one) and unmatched rows alike (who each get a distinct one)
// — is drawn from the same shuffled pool, so a slot's value never betrays
// whether its row matched.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;

use crate::error::{PprlError, Result};

/// One private-index assignment per side, same length as that side's
/// table: `left[i]` is the shared slot assigned to left row `i`.
#[derive(Debug, Clone)]
pub struct PrivateIndexAssignment {
    pub left: Vec<u64>,
    pub right: Vec<u64>,
}

/// Assign a shared private index over `left_len` left rows and
/// `right_len` right rows, given `matches` as verified `(left_row,
/// right_row)` pairs. `size_assumed` bounds the unmatched slot space
/// (`[size_assumed, 3 * size_assumed)`); it must be large enough to hold
/// every unmatched row on both sides or assignment fails rather than
/// silently wrapping.
///
/// `matches` must be one-to-one: no left or right row index may appear
/// more than once.
pub fn add_private_index(
    left_len: usize,
    right_len: usize,
    matches: &[(usize, usize)],
    size_assumed: u64,
) -> Result<PrivateIndexAssignment> {
    let mut seen_left = vec![false; left_len];
    let mut seen_right = vec![false; right_len];
    for &(l, r) in matches {
        if l >= left_len || r >= right_len {
            return Err(PprlError::InvalidParameters(format!(
                "match ({l}, {r}) out of bounds for table sizes ({left_len}, {right_len})"
            )));
        }
        if seen_left[l] || seen_right[r] {
            return Err(PprlError::InvalidParameters(
                "matches must be one-to-one: a row cannot appear in more than one pair".to_string(),
            ));
        }
        seen_left[l] = true;
        seen_right[r] = true;
    }

    // Every value handed out — matched and unmatched alike — comes from the
    // same shuffled range, so a value's origin (which dataset, matched or
    // not) can never be inferred from its range alone.
    let outer_join_size = left_len + right_len - matches.len();
    let pool_size = 2 * size_assumed;
    if outer_join_size as u64 > pool_size {
        return Err(PprlError::InvalidParameters(format!(
            "size_assumed {size_assumed} too small: {outer_join_size} rows need distinct slots in a pool of {pool_size}"
        )));
    }

    let mut pool: Vec<u64> = (size_assumed..3 * size_assumed).collect();
    pool.shuffle(&mut OsRng);
    let mut private_index = pool.into_iter().take(outer_join_size);

    let mut left = vec![0u64; left_len];
    let mut right = vec![0u64; right_len];

    for &(l, r) in matches {
        let slot = private_index.next().expect("pool sized for every matched pair");
        left[l] = slot;
        right[r] = slot;
    }
    for (i, slot) in left.iter_mut().enumerate() {
        if !seen_left[i] {
            *slot = private_index.next().expect("pool sized for every unmatched left row");
        }
    }
    for (i, slot) in right.iter_mut().enumerate() {
        if !seen_right[i] {
            *slot = private_index.next().expect("pool sized for every unmatched right row");
        }
    }

    Ok(PrivateIndexAssignment { left, right })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_rows_share_a_slot() {
        let assignment = add_private_index(3, 3, &[(0, 1), (1, 0)], 100).unwrap();
        assert_eq!(assignment.left[0], assignment.right[1]);
        assert_eq!(assignment.left[1], assignment.right[0]);
    }

    #[test]
    fn matched_slots_are_drawn_from_the_same_pool_as_unmatched() {
        // Property #11: every value, matched or not, lies in
        // [size_assumed, 3*size_assumed) — a matched slot must not be
        // distinguishable from an unmatched one by its range.
        let assignment = add_private_index(3, 3, &[(0, 1), (1, 0)], 50).unwrap();
        assert!((50..150).contains(&assignment.left[0]));
        assert!((50..150).contains(&assignment.left[1]));
    }

    #[test]
    fn all_slots_are_disjoint_and_in_range() {
        let assignment = add_private_index(3, 3, &[(0, 0)], 50).unwrap();
        let all: Vec<u64> = vec![
            assignment.left[0],
            assignment.left[1],
            assignment.left[2],
            assignment.right[0],
            assignment.right[1],
            assignment.right[2],
        ];
        let mut sorted = all.clone();
        sorted.sort_unstable();
        sorted.dedup();
        // Matched pair (0,0) shares one value, so 6 slots collapse to 5 distinct.
        assert_eq!(sorted.len(), all.len() - 1);
        assert!(all.iter().all(|&s| (50..150).contains(&s)));
    }

    #[test]
    fn duplicate_match_on_same_row_is_rejected() {
        let result = add_private_index(3, 3, &[(0, 0), (0, 1)], 100);
        assert!(result.is_err());
    }

    #[test]
    fn out_of_bounds_match_is_rejected() {
        let result = add_private_index(2, 2, &[(5, 0)], 100);
        assert!(result.is_err());
    }

    #[test]
    fn pool_too_small_is_rejected() {
        let result = add_private_index(10, 10, &[], 1);
        assert!(result.is_err());
    }
}
