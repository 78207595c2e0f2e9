//! Regression Kriging (RK) interpolation
//!
//! Hybrid method that decomposes the spatial field into:
//! ```text
//! Z(x) = m(x) + ε(x)
//! ```
//! where m(x) = β₀ + β₁·c(x) is a linear trend on an auxiliary covariate c
//! (terrain elevation for wind) estimated by OLS, and ε(x) is a spatially
//! correlated residual interpolated by Ordinary Kriging.
//!
//! The covariate is only known at training points, so it is first carried
//! to the targets by IDW.
//!
//! Reference:
//! Hengl, T. et al. (2007). About regression-kriging. Computers & Geosciences.
//! Odeh, I.O.A. et al. (1995). Further results on prediction of soil
//! properties from terrain attributes. Geoderma, 67.

use serde::Serialize;
use tracing::{debug, info};
use windmesh_core::{Error, PointSet, Result};

use super::idw::{inverse_distance, IdwParams};
use super::kriging::{ordinary_kriging, NeighborSearch};
use super::variogram::{
    fit_first_variogram, semivariogram, EmpiricalVariogram, ModelFamily, VariogramFit,
    VariogramFitParams,
};
use super::{targets, Prediction, SamplePoint};

/// Residual variogram families, tried in this order; the first fit wins.
const RESIDUAL_FAMILIES: [ModelFamily; 3] = [
    ModelFamily::Exponential,
    ModelFamily::Gaussian,
    ModelFamily::Spherical,
];

/// Parameters for Regression Kriging
#[derive(Debug, Clone)]
pub struct RegressionKrigingParams {
    /// Covariate column (default `topo`)
    pub covariate: String,
    /// Variogram cutoff and kriging search radius (default 1000)
    pub cutoff: f64,
    /// Lag bin width for the residual variogram (default 50)
    pub bin_width: f64,
    /// Maximum neighbours for the residual kriging and the covariate IDW
    /// (default 16)
    pub max_neighbors: usize,
}

impl Default for RegressionKrigingParams {
    fn default() -> Self {
        Self {
            covariate: "topo".to_string(),
            cutoff: 1000.0,
            bin_width: 50.0,
            max_neighbors: 16,
        }
    }
}

/// Result of Regression Kriging
#[derive(Debug, Clone)]
pub struct RegressionKrigingResult {
    /// Final predictions: trend + kriged residual
    pub predictions: Vec<f64>,
    /// Trend m(x) at each target
    pub trend: Vec<f64>,
    /// Kriged residual and its variance at each target
    pub residual: Prediction,
    /// Covariate interpolated onto the targets
    pub covariate_at_targets: Vec<f64>,
    pub intercept: f64,
    pub slope: f64,
    /// Variogram model fitted to the residuals
    pub residual_model: VariogramFit,
    pub residual_variogram: EmpiricalVariogram,
}

/// Trend coefficients and residual model, without the per-target vectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionSummary {
    pub intercept: f64,
    pub slope: f64,
    pub residual_model: VariogramFit,
}

impl RegressionKrigingResult {
    pub fn summary(&self) -> RegressionSummary {
        RegressionSummary {
            intercept: self.intercept,
            slope: self.slope,
            residual_model: self.residual_model,
        }
    }
}

/// Perform Regression Kriging of `field` on the covariate.
///
/// Steps:
/// 1. IDW the covariate from `training_points` onto `target_points`
/// 2. Fit OLS: field = β₀ + β₁·covariate over `training_points`
/// 3. Compute residuals ε = field − m
/// 4. Fit the residual variogram over `cv_points`, first family that fits
/// 5. Krige the residuals and add the trend
///
/// # Errors
/// - `InvalidArgument` for a missing column or non-positive cutoff
/// - `Computation` if no family fits the residual variogram, or a kriging
///   system is singular
pub fn regression_krige(
    field: &str,
    training_points: &PointSet,
    target_points: &PointSet,
    cv_points: &PointSet,
    params: &RegressionKrigingParams,
) -> Result<RegressionKrigingResult> {
    let covariate = params.covariate.as_str();
    let train_cov = training_points.column(covariate)?;
    let train_val = training_points.column(field)?;
    let targets = targets(target_points);

    // Step 1: covariate at targets
    let cov_samples: Vec<SamplePoint> = training_points
        .coords()
        .zip(train_cov)
        .filter(|(_, c)| c.is_finite())
        .map(|((x, y), &c)| SamplePoint::new(x, y, c))
        .collect();
    let idw = IdwParams {
        max_points: Some(params.max_neighbors),
        ..Default::default()
    };
    let covariate_at_targets = inverse_distance(&cov_samples, &targets, &idw)?.values;

    // Step 2: OLS trend
    let (intercept, slope) = ols_fit(train_cov, train_val)?;
    debug!(field, covariate, intercept, slope, "trend fitted");

    // Step 3: residuals at training points
    let residuals: Vec<SamplePoint> = training_points
        .coords()
        .zip(train_cov.iter().zip(train_val))
        .filter(|(_, (c, v))| c.is_finite() && v.is_finite())
        .map(|((x, y), (&c, &v))| SamplePoint::new(x, y, v - (intercept + slope * c)))
        .collect();

    // Step 4: residual variogram on the CV subsample
    let cv_cov = cv_points.column(covariate)?;
    let cv_val = cv_points.column(field)?;
    let cv_residuals: Vec<SamplePoint> = cv_points
        .coords()
        .zip(cv_cov.iter().zip(cv_val))
        .filter(|(_, (c, v))| c.is_finite() && v.is_finite())
        .map(|((x, y), (&c, &v))| SamplePoint::new(x, y, v - (intercept + slope * c)))
        .collect();
    let residual_variogram = semivariogram(&cv_residuals, params.cutoff, params.bin_width)?;
    let values: Vec<f64> = cv_residuals.iter().map(|p| p.value).collect();
    let residual_model = fit_first_variogram(
        &residual_variogram,
        &RESIDUAL_FAMILIES,
        &VariogramFitParams::seeded_from(&values),
    )
    .map_err(|e| {
        Error::Computation(format!("no variogram model fits the {field} residuals: {e}"))
    })?;
    info!(field, model = residual_model.family.short_name(), "residual variogram fitted");

    // Step 5: trend + kriged residual
    let search = NeighborSearch::new(Some(params.max_neighbors), Some(params.cutoff));
    let residual = ordinary_kriging(&residuals, &targets, &residual_model, &search)?;
    let trend: Vec<f64> = covariate_at_targets
        .iter()
        .map(|&c| intercept + slope * c)
        .collect();
    let predictions = trend
        .iter()
        .zip(&residual.values)
        .map(|(t, r)| t + r)
        .collect();

    Ok(RegressionKrigingResult {
        predictions,
        trend,
        residual,
        covariate_at_targets,
        intercept,
        slope,
        residual_model,
        residual_variogram,
    })
}

/// Fit OLS regression: response = β₀ + β₁·covariate.
///
/// Rows where either value is not finite are ignored. A constant covariate
/// gives slope 0 and the response mean as intercept.
///
/// # Errors
/// `InsufficientData` with fewer than two usable rows.
pub fn ols_fit(covariate: &[f64], response: &[f64]) -> Result<(f64, f64)> {
    let pairs: Vec<(f64, f64)> = covariate
        .iter()
        .zip(response)
        .filter(|(c, r)| c.is_finite() && r.is_finite())
        .map(|(&c, &r)| (c, r))
        .collect();
    if pairs.len() < 2 {
        return Err(Error::InsufficientData {
            what: "regression rows",
            count: pairs.len(),
        });
    }

    let n = pairs.len() as f64;
    let mean_c = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_r = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(c, r) in &pairs {
        sxx += (c - mean_c) * (c - mean_c);
        sxy += (c - mean_c) * (r - mean_r);
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    Ok((mean_r - slope * mean_c, slope))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcg(seed: u64) -> impl FnMut() -> f64 {
        let mut rng = seed;
        move || {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (rng >> 33) as f64 / (1u64 << 31) as f64
        }
    }

    /// 12×12 lattice where u = 2 + 0.01·topo + correlated noise.
    fn training() -> PointSet {
        let mut next = lcg(5);
        let mut coords = Vec::new();
        let mut topo = Vec::new();
        let mut u = Vec::new();
        for r in 0..12 {
            for c in 0..12 {
                let x = c as f64 * 100.0;
                let y = r as f64 * 100.0;
                let t = 300.0 + 0.4 * x - 0.2 * y + 30.0 * (x / 250.0).sin();
                coords.push((x, y));
                topo.push(t);
                u.push(2.0 + 0.01 * t + 0.8 * (y / 300.0).cos() + 0.1 * next());
            }
        }
        PointSet::from_coords(&coords)
            .unwrap()
            .with_column("topo", topo)
            .unwrap()
            .with_column("u", u)
            .unwrap()
    }

    fn params() -> RegressionKrigingParams {
        RegressionKrigingParams {
            cutoff: 700.0,
            bin_width: 50.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_ols_exact_line() {
        let (a, b) = ols_fit(&[1.0, 2.0, 3.0, 4.0], &[3.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((a - 1.0).abs() < 1e-12);
        assert!((b - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ols_constant_covariate() {
        let (a, b) = ols_fit(&[5.0, 5.0, 5.0], &[1.0, 2.0, 6.0]).unwrap();
        assert_eq!(b, 0.0);
        assert!((a - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ols_too_few_rows() {
        assert!(matches!(
            ols_fit(&[1.0, f64::NAN], &[2.0, 3.0]),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_rk_is_trend_plus_residual() {
        let train = training();
        let targets =
            PointSet::from_coords(&[(50.0, 50.0), (550.0, 320.0), (1020.0, 870.0)]).unwrap();
        let result = regression_krige("u", &train, &targets, &train, &params()).unwrap();

        assert!(result.slope > 0.0, "slope {}", result.slope);
        for i in 0..targets.len() {
            let trend = result.intercept + result.slope * result.covariate_at_targets[i];
            let expected = trend + result.residual.values[i];
            assert!(
                (result.predictions[i] - expected).abs() < 1e-12,
                "target {i}: {} vs {expected}",
                result.predictions[i]
            );
            assert!(result.predictions[i].is_finite());
        }
    }

    #[test]
    fn test_rk_exact_at_training_point() {
        let train = training();
        let targets = PointSet::from_coords(&[(300.0, 400.0)]).unwrap();
        let result = regression_krige("u", &train, &targets, &train, &params()).unwrap();
        let idx = 4 * 12 + 3;
        let observed = train.column("u").unwrap()[idx];
        assert!((result.predictions[0] - observed).abs() < 1e-9);
    }

    #[test]
    fn test_rk_fails_hard_when_no_residual_model_fits() {
        // only the 100 m lag falls inside the cutoff: one bin, nothing fits
        let train = training();
        let targets = PointSet::from_coords(&[(50.0, 50.0)]).unwrap();
        let p = RegressionKrigingParams {
            cutoff: 120.0,
            bin_width: 50.0,
            ..Default::default()
        };
        let result = regression_krige("u", &train, &targets, &train, &p);
        assert!(matches!(result, Err(Error::Computation(_))));
    }

    #[test]
    fn test_rk_missing_covariate() {
        let train = PointSet::from_coords(&[(0.0, 0.0), (1.0, 1.0)])
            .unwrap()
            .with_column("u", vec![1.0, 2.0])
            .unwrap();
        let result = regression_krige("u", &train, &train, &train, &params());
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }
}
