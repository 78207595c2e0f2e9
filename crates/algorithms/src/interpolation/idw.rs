//! Inverse Distance Weighting (IDW) interpolation
//!
//! Estimates values at unknown locations as a weighted average of nearby
//! sample points, where weights are inversely proportional to distance
//! raised to a power parameter.
//!
//! Reference:
//! Shepard, D. (1968). A two-dimensional interpolation function for
//! irregularly-spaced data. ACM National Conference.

use windmesh_core::{Error, Result};

use super::kdtree::{KdTree, NearestResult};
use super::{Prediction, SamplePoint};
use crate::maybe_rayon::*;

/// Parameters for IDW interpolation
#[derive(Debug, Clone)]
pub struct IdwParams {
    /// Power parameter (default: 2.0).
    /// Higher values give more weight to nearby points.
    pub power: f64,
    /// Maximum search radius (inclusive). Points beyond this distance are
    /// ignored. `None` means all points are used (global IDW).
    pub max_radius: Option<f64>,
    /// Maximum number of nearest points to use.
    /// `None` means use all points within radius.
    pub max_points: Option<usize>,
    /// If a sample point is this close to the target, its value is used
    /// directly and every other sample gets weight 0.
    pub snap_distance: f64,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            max_radius: None,
            max_points: None,
            snap_distance: 1e-6,
        }
    }
}

/// Perform IDW interpolation from scattered points to target locations.
///
/// # Algorithm
///
/// For each target at position (x, y):
///
/// ```text
/// z(x,y) = Σ(wi * zi) / Σ(wi)
/// where wi = 1 / d(x,y, xi,yi)^p
/// ```
///
/// # Returns
/// One value per target; targets with no sample within `max_radius` are
/// `NaN`. IDW has no stochastic model, so every variance is `NaN`.
///
/// # Errors
/// `InsufficientData` if `points` is empty, `InvalidArgument` for a
/// non-positive power or radius.
pub fn inverse_distance(
    points: &[SamplePoint],
    targets: &[(f64, f64)],
    params: &IdwParams,
) -> Result<Prediction> {
    if points.is_empty() {
        return Err(Error::InsufficientData {
            what: "IDW sample points",
            count: 0,
        });
    }
    if !(params.power > 0.0 && params.power.is_finite()) {
        return Err(Error::invalid("power", params.power, "must be positive"));
    }
    if let Some(r) = params.max_radius
        && !(r > 0.0)
    {
        return Err(Error::invalid("max_radius", r, "must be positive"));
    }

    let tree = KdTree::build(points);
    let snap_sq = params.snap_distance * params.snap_distance;

    let values: Vec<f64> = targets
        .into_par_iter()
        .map(|&(tx, ty)| {
            let candidates = neighbourhood(&tree, tx, ty, params);
            if candidates.is_empty() {
                return f64::NAN;
            }

            if let Some(hit) = candidates
                .iter()
                .filter(|c| c.distance_sq <= snap_sq)
                .min_by(|a, b| a.distance_sq.total_cmp(&b.distance_sq))
            {
                return hit.point.value;
            }

            let mut sum_w = 0.0;
            let mut sum_wz = 0.0;
            for c in &candidates {
                let w = 1.0 / c.distance().powf(params.power);
                sum_w += w;
                sum_wz += w * c.point.value;
            }

            if sum_w > 0.0 {
                sum_wz / sum_w
            } else {
                f64::NAN
            }
        })
        .collect();

    let variances = vec![f64::NAN; values.len()];
    Ok(Prediction { values, variances })
}

/// Samples that may influence a target under the radius/count limits.
fn neighbourhood(tree: &KdTree, tx: f64, ty: f64, params: &IdwParams) -> Vec<NearestResult> {
    match (params.max_points, params.max_radius) {
        (Some(k), radius) => {
            let mut found = tree.k_nearest(tx, ty, k);
            if let Some(r) = radius {
                found.retain(|c| c.distance_sq <= r * r);
            }
            found
        }
        (None, Some(r)) => tree.within_radius(tx, ty, r),
        (None, None) => tree.k_nearest(tx, ty, tree.len()),
    }
}
