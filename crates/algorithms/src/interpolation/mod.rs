//! Spatial interpolation of scattered scalar fields
//!
//! Predict values at arbitrary target locations from scattered samples:
//! - k-d tree: k-nearest-neighbour and radius search
//! - Variogram: empirical semivariogram and parametric model fitting
//! - Selection: k-fold cross-validated choice among fitted models, IDW fallback
//! - IDW: Inverse Distance Weighting
//! - Ordinary Kriging: BLUE with a fitted variogram
//! - Universal Kriging: drift-only kriging without a fitted covariance
//! - Regression Kriging: OLS trend on a covariate + OK on residuals

mod idw;
pub mod kdtree;
pub mod kriging;
mod linalg;
pub mod metrics;
mod predictor;
mod regression_kriging;
mod selection;
mod universal_kriging;
pub mod variogram;

pub use idw::{inverse_distance, IdwParams};
pub use kdtree::{knn, KdTree, NearestResult, Neighbors};
pub use kriging::{ordinary_kriging, NeighborSearch};
pub use metrics::{accuracy, bias, rsr, AccuracyMetrics};
pub use predictor::{predict, predict_samples};
pub use regression_kriging::{
    ols_fit, regression_krige, RegressionKrigingParams, RegressionKrigingResult,
    RegressionSummary,
};
pub use selection::{
    cross_validate, select_model, CandidateScore, ModelSelection, SelectionParams,
};
pub use universal_kriging::{universal_kriging, DriftOrder};
pub use variogram::{
    empirical_variogram, fit_first_variogram, fit_variogram, sample_variance, semivariogram,
    EmpiricalVariogram, ModelFamily, VariogramFit, VariogramFitParams, VariogramModel,
};

use windmesh_core::{PointSet, Result};

/// A sample point with x, y coordinates and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Squared Euclidean distance to another point
    #[inline]
    pub fn dist_sq(&self, other_x: f64, other_y: f64) -> f64 {
        let dx = self.x - other_x;
        let dy = self.y - other_y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn dist(&self, other_x: f64, other_y: f64) -> f64 {
        self.dist_sq(other_x, other_y).sqrt()
    }
}

/// Predicted values and prediction variances for a batch of targets.
///
/// Both sequences have one entry per target. Variance is `NaN` where the
/// method has no stochastic model (IDW) and both are `NaN` for targets with
/// no usable neighbours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    pub values: Vec<f64>,
    pub variances: Vec<f64>,
}

impl Prediction {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn from_pairs(pairs: Vec<(f64, f64)>) -> Self {
        let (values, variances) = pairs.into_iter().unzip();
        Self { values, variances }
    }
}

/// Extract `(x, y, field)` samples, skipping rows whose value is not finite.
pub fn samples(points: &PointSet, field: &str) -> Result<Vec<SamplePoint>> {
    let values = points.column(field)?;
    Ok(points
        .coords()
        .zip(values)
        .filter(|(_, v)| v.is_finite())
        .map(|((x, y), &v)| SamplePoint::new(x, y, v))
        .collect())
}

/// Coordinates of every point, in order.
pub fn targets(points: &PointSet) -> Vec<(f64, f64)> {
    points.coords().collect()
}
