//! Model-driven prediction
//!
//! Dispatches a [`VariogramModel`] to the interpolator it stands for:
//! IDW for the `Idw` sentinel, drift-only universal kriging for
//! `Universal`, ordinary kriging with the fitted covariance otherwise.

use tracing::debug;
use windmesh_core::{Error, PointSet, Result};

use super::idw::{inverse_distance, IdwParams};
use super::kriging::{ordinary_kriging, NeighborSearch};
use super::universal_kriging::{universal_kriging, DriftOrder};
use super::variogram::VariogramModel;
use super::{samples, targets, Prediction, SamplePoint};

/// Predict `field` at every point of `target_points`.
///
/// Training rows with a non-finite `field` value are skipped.
///
/// # Errors
/// `InvalidArgument` for a non-positive cutoff, `max_neighbors < 1` or a
/// missing field; `Computation` if a kriging system is singular.
pub fn predict(
    field: &str,
    model: &VariogramModel,
    training_points: &PointSet,
    target_points: &PointSet,
    cutoff: f64,
    max_neighbors: usize,
) -> Result<Prediction> {
    let training = samples(training_points, field)?;
    let targets = targets(target_points);
    debug!(
        field,
        model = model.name(),
        training = training.len(),
        targets = targets.len(),
        "predicting"
    );
    predict_samples(model, &training, &targets, cutoff, max_neighbors)
}

/// [`predict`] over raw samples and target coordinates.
pub fn predict_samples(
    model: &VariogramModel,
    training: &[SamplePoint],
    targets: &[(f64, f64)],
    cutoff: f64,
    max_neighbors: usize,
) -> Result<Prediction> {
    if !(cutoff > 0.0 && cutoff.is_finite()) {
        return Err(Error::invalid("cutoff", cutoff, "must be positive and finite"));
    }
    if max_neighbors < 1 {
        return Err(Error::invalid("max_neighbors", max_neighbors, "must be at least 1"));
    }

    match model {
        VariogramModel::Idw => {
            let params = IdwParams {
                max_radius: Some(cutoff),
                ..Default::default()
            };
            inverse_distance(training, targets, &params)
        }
        VariogramModel::Universal => {
            let search = NeighborSearch::new(Some(max_neighbors), Some(cutoff));
            universal_kriging(training, targets, DriftOrder::Linear, &search)
        }
        VariogramModel::Fitted(fit) => {
            let search = NeighborSearch::new(Some(max_neighbors), Some(cutoff));
            ordinary_kriging(training, targets, fit, &search)
        }
    }
}
