//! Seeded sampling: hold-out split, subsampling and fold assignment
//!
//! All draws come from `StdRng::seed_from_u64`, so the same seed always
//! yields the same partition. Returned index lists are sorted.

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use serde::Serialize;
use windmesh_core::{Error, Result};

/// Indices into the input data for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitPlan {
    /// Everything not held out; used for final prediction.
    pub train: Vec<usize>,
    /// Held-out points, touched only by hold-out evaluation.
    pub test: Vec<usize>,
    /// Subset of `train` used for variogram estimation and CV.
    pub subsample: Vec<usize>,
}

/// Hold out `test_pct`% of `n` points, then subsample `subsample_pct`% of
/// the rest.
///
/// # Errors
/// - `InvalidArgument` if `test_pct ∉ [0, 100)` or `subsample_pct ∉ (0, 100]`
/// - `InsufficientData` if a positive `test_pct` resolves to ≤ 1 point,
///   fewer than 2 training points remain, or the subsample has ≤ 1 point
pub fn plan_split(n: usize, test_pct: f64, subsample_pct: f64, seed: u64) -> Result<SplitPlan> {
    let (train, test) = holdout_split(n, test_pct, seed)?;
    let picked = subsample(train.len(), subsample_pct, seed.wrapping_add(1))?;
    let subsample = picked.into_iter().map(|i| train[i]).collect();
    Ok(SplitPlan {
        train,
        test,
        subsample,
    })
}

/// Split `0..n` into `(train, test)` with `round(n·test_pct/100)` test points.
pub fn holdout_split(n: usize, test_pct: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..100.0).contains(&test_pct) {
        return Err(Error::invalid("test_pct", test_pct, "must be in [0, 100)"));
    }

    let n_test = (n as f64 * test_pct / 100.0).round() as usize;
    if test_pct > 0.0 && n_test <= 1 {
        return Err(Error::InsufficientData {
            what: "hold-out points",
            count: n_test,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut test = index::sample(&mut rng, n, n_test).into_vec();
    test.sort_unstable();

    let mut is_test = vec![false; n];
    for &i in &test {
        is_test[i] = true;
    }
    let train: Vec<usize> = (0..n).filter(|&i| !is_test[i]).collect();
    if train.len() < 2 {
        return Err(Error::InsufficientData {
            what: "training points",
            count: train.len(),
        });
    }
    Ok((train, test))
}

/// Draw `round(n·pct/100)` sorted indices from `0..n`.
pub fn subsample(n: usize, pct: f64, seed: u64) -> Result<Vec<usize>> {
    if !(pct > 0.0 && pct <= 100.0) {
        return Err(Error::invalid("subsample_pct", pct, "must be in (0, 100]"));
    }
    let count = ((n as f64 * pct / 100.0).round() as usize).min(n);
    if count <= 1 {
        return Err(Error::InsufficientData {
            what: "subsampled points",
            count,
        });
    }
    if count == n {
        return Ok((0..n).collect());
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, n, count).into_vec();
    picked.sort_unstable();
    Ok(picked)
}

/// Assign each of `n` points to one of `min(n_folds, n)` folds of
/// near-equal size.
pub fn fold_assignments(n: usize, n_folds: usize, seed: u64) -> Result<Vec<usize>> {
    if n_folds < 2 {
        return Err(Error::invalid("n_folds", n_folds, "must be at least 2"));
    }
    if n < 2 {
        return Err(Error::InsufficientData {
            what: "cross-validation points",
            count: n,
        });
    }
    let k = n_folds.min(n);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut folds = vec![0; n];
    for (rank, &i) in order.iter().enumerate() {
        folds[i] = rank % k;
    }
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let plan = plan_split(64, 10.0, 50.0, 42).unwrap();
        assert_eq!(plan.test.len(), 6);
        assert_eq!(plan.train.len(), 58);
        assert_eq!(plan.subsample.len(), 29);

        for t in &plan.test {
            assert!(!plan.train.contains(t));
            assert!(!plan.subsample.contains(t));
        }
        for s in &plan.subsample {
            assert!(plan.train.contains(s));
        }
        let mut all: Vec<usize> = plan.train.iter().chain(&plan.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        assert_eq!(plan_split(100, 10.0, 80.0, 7).unwrap(), plan_split(100, 10.0, 80.0, 7).unwrap());
        assert_ne!(
            plan_split(100, 10.0, 80.0, 7).unwrap().test,
            plan_split(100, 10.0, 80.0, 8).unwrap().test
        );
    }

    #[test]
    fn test_zero_pct_disables_holdout() {
        let plan = plan_split(4, 0.0, 100.0, 1).unwrap();
        assert!(plan.test.is_empty());
        assert_eq!(plan.train, vec![0, 1, 2, 3]);
        assert_eq!(plan.subsample, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_tiny_holdout_is_insufficient() {
        // 10% of 9 points rounds to 1
        assert!(matches!(
            plan_split(9, 10.0, 100.0, 1),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_tiny_subsample_is_insufficient() {
        assert!(matches!(subsample(10, 5.0, 1), Err(Error::InsufficientData { .. })));
        assert!(matches!(subsample(10, 0.0, 1), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_invalid_percentages() {
        assert!(holdout_split(10, 100.0, 1).is_err());
        assert!(holdout_split(10, -1.0, 1).is_err());
        assert!(subsample(10, 120.0, 1).is_err());
    }

    #[test]
    fn test_fold_sizes_are_balanced() {
        let folds = fold_assignments(23, 5, 42).unwrap();
        let mut sizes = [0usize; 5];
        for f in folds {
            sizes[f] += 1;
        }
        assert!(sizes.iter().all(|&s| s == 4 || s == 5), "{sizes:?}");
    }

    #[test]
    fn test_folds_clamped_to_points() {
        let folds = fold_assignments(3, 10, 0).unwrap();
        let mut sorted = folds.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
        assert!(fold_assignments(1, 5, 0).is_err());
        assert!(fold_assignments(10, 1, 0).is_err());
    }
}
