//! Variogram model selection by k-fold cross-validation
//!
//! Every family in [`ModelFamily::ALL`] is fitted to the empirical
//! variogram; each surviving fit is scored by k-fold cross-validated
//! ordinary kriging, and the lowest finite RSR wins. Any numerical failure
//! removes the candidate, and when nothing is left the selector returns the
//! IDW sentinel instead of an error.

use serde::Serialize;
use tracing::{debug, info, warn};
use windmesh_core::{Error, PointSet, Result};

use super::kriging::{ordinary_kriging, NeighborSearch};
use super::metrics::{accuracy, AccuracyMetrics};
use super::variogram::{
    fit_variogram, EmpiricalVariogram, ModelFamily, VariogramFit, VariogramFitParams,
    VariogramModel,
};
use super::{samples, SamplePoint};
use crate::sampling::fold_assignments;

/// Parameters for [`select_model`].
#[derive(Debug, Clone)]
pub struct SelectionParams {
    /// Number of cross-validation folds (default 5), clamped to the number
    /// of points.
    pub n_folds: usize,
    /// Neighbour limit for the cross-validation kriging (default 16).
    pub max_neighbors: usize,
    /// Search radius for the cross-validation kriging; `None` is global.
    /// Set it to the prediction cutoff so candidates are scored under the
    /// neighbourhood they will predict with.
    pub cutoff: Option<f64>,
    /// Seed for the fold partition (default 42).
    pub seed: u64,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            n_folds: 5,
            max_neighbors: 16,
            cutoff: None,
            seed: 42,
        }
    }
}

/// Cross-validation score of one fitted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub family: ModelFamily,
    pub fit: VariogramFit,
    pub rsr: f64,
    pub bias: f64,
    /// Number of (observed, predicted) pairs scored
    pub n: usize,
}

/// Outcome of [`select_model`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSelection {
    pub selected: VariogramModel,
    /// Candidates that survived fitting and cross-validation, in priority
    /// order. Empty when the field has no fittable structure.
    pub candidates: Vec<CandidateScore>,
}

impl ModelSelection {
    /// Score of the selected candidate, if a fitted model won.
    pub fn selected_score(&self) -> Option<&CandidateScore> {
        let fit = self.selected.fit()?;
        self.candidates.iter().find(|c| c.fit == *fit)
    }

    fn fallback(candidates: Vec<CandidateScore>) -> Self {
        Self {
            selected: VariogramModel::Idw,
            candidates,
        }
    }
}

/// Choose a variogram model for `field` over `cv_points`.
///
/// # Errors
/// `InvalidArgument` for `n_folds < 2`, `max_neighbors < 1`, a
/// non-positive cutoff or a missing field; `InsufficientData` when fits survive but fewer than two points are
/// available to cross-validate them.
pub fn select_model(
    cv_points: &PointSet,
    empirical: &EmpiricalVariogram,
    field: &str,
    params: &SelectionParams,
) -> Result<ModelSelection> {
    if params.n_folds < 2 {
        return Err(Error::invalid("n_folds", params.n_folds, "must be at least 2"));
    }
    if params.max_neighbors < 1 {
        return Err(Error::invalid(
            "max_neighbors",
            params.max_neighbors,
            "must be at least 1",
        ));
    }
    if let Some(r) = params.cutoff
        && !(r > 0.0 && r.is_finite())
    {
        return Err(Error::invalid("cutoff", r, "must be positive and finite"));
    }

    let data = samples(cv_points, field)?;
    let values: Vec<f64> = data.iter().map(|p| p.value).collect();
    let seed = VariogramFitParams::seeded_from(&values);

    let fits: Vec<VariogramFit> = ModelFamily::ALL
        .iter()
        .filter_map(|&family| match fit_variogram(empirical, family, &seed) {
            Ok(fit) => {
                debug!(field, %family, nugget = fit.nugget, sill = fit.sill(), range = fit.range, "fitted");
                Some(fit)
            }
            Err(e) => {
                debug!(field, %family, error = %e, "fit discarded");
                None
            }
        })
        .collect();

    if fits.is_empty() {
        warn!(field, "no variogram model could be fitted, falling back to IDW");
        return Ok(ModelSelection::fallback(Vec::new()));
    }
    if data.len() < 2 {
        return Err(Error::InsufficientData {
            what: "cross-validation points",
            count: data.len(),
        });
    }

    let search = NeighborSearch::new(Some(params.max_neighbors), params.cutoff);
    let candidates: Vec<CandidateScore> = fits
        .into_iter()
        .filter_map(|fit| {
            match cross_validate(&data, &fit, params.n_folds, &search, params.seed) {
                Ok(m) => {
                    debug!(field, family = %fit.family, rsr = m.rsr, bias = m.bias, "cross-validated");
                    Some(CandidateScore {
                        family: fit.family,
                        fit,
                        rsr: m.rsr,
                        bias: m.bias,
                        n: m.n,
                    })
                }
                Err(e) => {
                    debug!(field, family = %fit.family, error = %e, "cross-validation failed");
                    None
                }
            }
        })
        .collect();

    // strict `<` keeps the earliest family on ties
    let best = candidates
        .iter()
        .filter(|c| c.rsr.is_finite())
        .fold(None::<&CandidateScore>, |best, c| match best {
            Some(b) if b.rsr <= c.rsr => Some(b),
            _ => Some(c),
        })
        .map(|c| c.fit);

    match best {
        Some(fit) => {
            info!(field, model = fit.family.short_name(), "variogram model selected");
            Ok(ModelSelection {
                selected: VariogramModel::Fitted(fit),
                candidates,
            })
        }
        None => {
            warn!(field, "no candidate has a finite cross-validation RSR, falling back to IDW");
            Ok(ModelSelection::fallback(candidates))
        }
    }
}

/// k-fold cross-validated ordinary kriging with a fixed model.
///
/// Points are split into `n_folds` seeded folds; each fold is predicted from
/// the others, and RSR/Bias are computed over all pairs at once. Held-out
/// points with no neighbour inside the search radius are left unscored.
///
/// # Errors
/// `InsufficientData` below two points, `Computation` from the kriging solve.
pub fn cross_validate(
    points: &[SamplePoint],
    fit: &VariogramFit,
    n_folds: usize,
    search: &NeighborSearch,
    seed: u64,
) -> Result<AccuracyMetrics> {
    let folds = fold_assignments(points.len(), n_folds, seed)?;
    let n_folds = n_folds.min(points.len());
    let mut observed = Vec::with_capacity(points.len());
    let mut predicted = Vec::with_capacity(points.len());

    for fold in 0..n_folds {
        let (held, kept): (Vec<&SamplePoint>, Vec<&SamplePoint>) =
            points.iter().zip(&folds).fold((Vec::new(), Vec::new()), |(mut h, mut k), (p, &f)| {
                if f == fold {
                    h.push(p);
                } else {
                    k.push(p);
                }
                (h, k)
            });
        if held.is_empty() {
            continue;
        }
        let train: Vec<SamplePoint> = kept.into_iter().copied().collect();
        let targets: Vec<(f64, f64)> = held.iter().map(|p| (p.x, p.y)).collect();
        let prediction = ordinary_kriging(&train, &targets, fit, search)?;

        observed.extend(held.iter().map(|p| p.value));
        predicted.extend(prediction.values);
    }

    Ok(accuracy(&observed, &predicted))
}
