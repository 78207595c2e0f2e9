//! Universal Kriging (UK) without a fitted covariance
//!
//! Extends Ordinary Kriging by incorporating a polynomial drift model
//! (spatial trend) into the kriging system. Used for the `Universal`
//! model sentinel: there is no fitted variogram, so the linear generalized
//! covariance γ(h) = h stands in for it and only the drift is modelled.
//!
//! The UK system for n sample points with p drift functions:
//! ```text
//! [γ(xᵢ,xⱼ) | fₖ(xᵢ)] [wᵢ]   [γ(xᵢ,x₀)]
//! [-----------+--------] [  ] = [----------]
//! [fₖ(xᵢ)ᵀ  |    0   ] [μₖ]   [fₖ(x₀)   ]
//! ```
//! where fₖ are the drift functions: {1} for constant drift (OK),
//! {1, x, y} for linear drift. Coordinates are centred on x₀ and scaled by
//! the neighbourhood radius so the system stays well conditioned.
//!
//! Reference:
//! Matheron, G. (1969). Le Krigeage Universel. Cahiers du CMMM.
//! Cressie, N. (1993). Statistics for Spatial Data. Wiley.

use ndarray::{Array1, Array2};
use tracing::debug;
use windmesh_core::{Error, Result};

use super::kdtree::{KdTree, NearestResult};
use super::kriging::{NeighborSearch, COINCIDENT_EPS};
use super::linalg::solve;
use super::{Prediction, SamplePoint};
use crate::maybe_rayon::*;

/// Polynomial drift order for Universal Kriging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftOrder {
    /// Constant mean: f = {1}, equivalent to Ordinary Kriging.
    Constant,
    /// Linear trend: f = {1, x, y} → 3 drift functions
    Linear,
}

impl DriftOrder {
    /// Number of drift functions
    #[inline]
    fn n_drift(self) -> usize {
        match self {
            DriftOrder::Constant => 1,
            DriftOrder::Linear => 3,
        }
    }

    /// Drift basis at centred, scaled coordinates (u, v).
    #[inline]
    fn values(self, u: f64, v: f64) -> [f64; 3] {
        match self {
            DriftOrder::Constant => [1.0, 0.0, 0.0],
            DriftOrder::Linear => [1.0, u, v],
        }
    }
}

/// Universal Kriging from scattered samples to target locations.
///
/// Each target with fewer than `n_drift + 1` neighbours, or whose linear
/// drift system is singular (e.g. collinear neighbours), is retried with a
/// constant drift.
///
/// # Errors
/// - `InsufficientData` if `points` is empty
/// - `Computation` if even the constant-drift system is singular
pub fn universal_kriging(
    points: &[SamplePoint],
    targets: &[(f64, f64)],
    drift: DriftOrder,
    search: &NeighborSearch,
) -> Result<Prediction> {
    if points.is_empty() {
        return Err(Error::InsufficientData {
            what: "universal kriging sample points",
            count: 0,
        });
    }

    let tree = KdTree::build(points);
    let output: Vec<(f64, f64)> = targets
        .into_par_iter()
        .map(|&(x0, y0)| {
            let neighbours = search.neighbours(&tree, x0, y0);
            uk_at(&neighbours, drift, x0, y0)
        })
        .collect::<Result<_>>()?;

    Ok(Prediction::from_pairs(output))
}

fn uk_at(neighbours: &[NearestResult], drift: DriftOrder, x0: f64, y0: f64) -> Result<(f64, f64)> {
    let Some(first) = neighbours.first() else {
        return Ok((f64::NAN, f64::NAN));
    };
    if first.distance() < COINCIDENT_EPS {
        return Ok((first.point.value, 0.0));
    }

    if drift == DriftOrder::Linear && neighbours.len() > DriftOrder::Linear.n_drift() {
        match solve_system(neighbours, DriftOrder::Linear, x0, y0) {
            Ok(result) => return Ok(result),
            Err(e) => debug!(x0, y0, error = %e, "linear drift singular, using constant drift"),
        }
    }

    solve_system(neighbours, DriftOrder::Constant, x0, y0).map_err(|e| {
        Error::Computation(format!(
            "universal kriging at ({x0:.3}, {y0:.3}) with {} neighbours: {e}",
            neighbours.len()
        ))
    })
}

fn solve_system(
    neighbours: &[NearestResult],
    drift: DriftOrder,
    x0: f64,
    y0: f64,
) -> Result<(f64, f64)> {
    let k = neighbours.len();
    let p = drift.n_drift();
    let m = k + p;
    let scale = neighbours
        .iter()
        .fold(0.0_f64, |s, c| s.max(c.distance()))
        .max(COINCIDENT_EPS);

    let mut mat = Array2::<f64>::zeros((m, m));
    let mut rhs = Array1::<f64>::zeros(m);

    for i in 0..k {
        let pi = &neighbours[i].point;
        for j in (i + 1)..k {
            // linear generalized covariance: γ(h) = h
            let g = pi.dist(neighbours[j].point.x, neighbours[j].point.y);
            mat[[i, j]] = g;
            mat[[j, i]] = g;
        }
        let f = drift.values((pi.x - x0) / scale, (pi.y - y0) / scale);
        for l in 0..p {
            mat[[i, k + l]] = f[l];
            mat[[k + l, i]] = f[l];
        }
        rhs[i] = neighbours[i].distance();
    }
    let f0 = drift.values(0.0, 0.0);
    for l in 0..p {
        rhs[k + l] = f0[l];
    }

    let gamma0 = rhs.clone();
    let solution = solve(mat, rhs)?;

    let mut estimate = 0.0;
    let mut variance = 0.0;
    for i in 0..k {
        estimate += solution[i] * neighbours[i].point.value;
        variance += solution[i] * gamma0[i];
    }
    for l in 0..p {
        variance += solution[k + l] * f0[l];
    }

    Ok((estimate, variance.max(0.0)))
}
