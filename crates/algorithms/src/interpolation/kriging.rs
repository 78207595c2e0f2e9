//! Ordinary Kriging interpolation
//!
//! Best Linear Unbiased Estimator (BLUE) for spatial data. Uses a fitted
//! variogram model to compute optimal interpolation weights that minimize
//! estimation variance while satisfying an unbiasedness constraint.
//!
//! The kriging system for n sample points:
//! ```text
//! [γ(x₁,x₁) ... γ(x₁,xₙ) 1] [w₁]   [γ(x₁,x₀)]
//! [   ...     ...    ...    .]  [. ] = [   ...    ]
//! [γ(xₙ,x₁) ... γ(xₙ,xₙ) 1] [wₙ]   [γ(xₙ,x₀)]
//! [  1       ...    1       0] [μ ]   [    1     ]
//! ```
//! where γ is the semivariance from the fitted variogram, x₀ is the
//! target location, and μ is the Lagrange multiplier ensuring Σwᵢ = 1.
//!
//! Reference:
//! Matheron, G. (1963). Principles of geostatistics. Economic Geology.
//! Cressie, N. (1993). Statistics for Spatial Data. Wiley.

use ndarray::{Array1, Array2};
use windmesh_core::{Error, Result};

use super::kdtree::{KdTree, NearestResult};
use super::linalg::solve;
use super::variogram::VariogramFit;
use super::{Prediction, SamplePoint};
use crate::maybe_rayon::*;

/// Distance below which a target is treated as coinciding with a sample.
pub(crate) const COINCIDENT_EPS: f64 = 1e-12;

/// Local neighbourhood used for each kriging system.
#[derive(Debug, Clone, Default)]
pub struct NeighborSearch {
    /// Use at most this many nearest samples. `None` means no count limit.
    pub max_neighbors: Option<usize>,
    /// Ignore samples farther than this (inclusive). `None` means global.
    pub cutoff: Option<f64>,
}

impl NeighborSearch {
    pub fn new(max_neighbors: Option<usize>, cutoff: Option<f64>) -> Self {
        Self {
            max_neighbors,
            cutoff,
        }
    }

    /// Neighbours of (x, y) sorted by ascending distance.
    pub(crate) fn neighbours(&self, tree: &KdTree, x: f64, y: f64) -> Vec<NearestResult> {
        let k = self.max_neighbors.unwrap_or(tree.len());
        let mut found = tree.k_nearest(x, y, k);
        if let Some(r) = self.cutoff {
            found.retain(|c| c.distance_sq <= r * r);
        }
        found
    }

    fn validate(&self) -> Result<()> {
        if let Some(k) = self.max_neighbors
            && k < 1
        {
            return Err(Error::invalid("max_neighbors", k, "must be at least 1"));
        }
        if let Some(r) = self.cutoff
            && !(r > 0.0)
        {
            return Err(Error::invalid("cutoff", r, "must be positive"));
        }
        Ok(())
    }
}

/// Ordinary Kriging from scattered samples to target locations.
///
/// # Returns
/// [`Prediction`] with one estimate and kriging variance per target. A target
/// coinciding with a sample gets that sample's value and variance 0; a target
/// with no sample inside the neighbourhood gets `NaN` for both.
///
/// # Errors
/// - `InsufficientData` if `points` is empty
/// - `Computation` if the kriging system is singular at any target
pub fn ordinary_kriging(
    points: &[SamplePoint],
    targets: &[(f64, f64)],
    variogram: &VariogramFit,
    search: &NeighborSearch,
) -> Result<Prediction> {
    search.validate()?;
    if points.is_empty() {
        return Err(Error::InsufficientData {
            what: "kriging sample points",
            count: 0,
        });
    }

    let tree = KdTree::build(points);
    let output: Vec<(f64, f64)> = targets
        .into_par_iter()
        .map(|&(x0, y0)| {
            let neighbours = search.neighbours(&tree, x0, y0);
            krige_at(&neighbours, variogram, x0, y0)
        })
        .collect::<Result<_>>()?;

    Ok(Prediction::from_pairs(output))
}

/// Solve one ordinary kriging system for target (x0, y0).
fn krige_at(
    neighbours: &[NearestResult],
    variogram: &VariogramFit,
    x0: f64,
    y0: f64,
) -> Result<(f64, f64)> {
    let Some(first) = neighbours.first() else {
        return Ok((f64::NAN, f64::NAN));
    };
    if first.distance() < COINCIDENT_EPS {
        return Ok((first.point.value, 0.0));
    }

    let k = neighbours.len();
    let m = k + 1;
    let mut mat = Array2::<f64>::zeros((m, m));
    let mut rhs = Array1::<f64>::zeros(m);

    for i in 0..k {
        let pi = &neighbours[i].point;
        for j in (i + 1)..k {
            let g = variogram.evaluate(pi.dist(neighbours[j].point.x, neighbours[j].point.y));
            mat[[i, j]] = g;
            mat[[j, i]] = g;
        }
        // Lagrange constraint row and column
        mat[[i, k]] = 1.0;
        mat[[k, i]] = 1.0;
        rhs[i] = variogram.evaluate(neighbours[i].distance());
    }
    rhs[k] = 1.0;

    let gamma0 = rhs.clone();
    let solution = solve(mat, rhs).map_err(|e| {
        Error::Computation(format!(
            "ordinary kriging at ({x0:.3}, {y0:.3}) with {k} neighbours: {e}"
        ))
    })?;

    let mut estimate = 0.0;
    // σ² = Σ wᵢ·γ(xᵢ,x₀) + μ
    let mut variance = solution[k];
    for i in 0..k {
        estimate += solution[i] * neighbours[i].point.value;
        variance += solution[i] * gamma0[i];
    }

    Ok((estimate, variance.max(0.0)))
}
