//! Variogram computation and model fitting
//!
//! Computes the empirical (experimental) semivariogram of a scalar field and
//! fits parametric models (spherical, exponential, Gaussian) to it.
//! Prerequisite for kriging interpolation.
//!
//! The semivariance γ(h) measures spatial dissimilarity as a function of
//! separation distance h:
//! ```text
//! γ(h) = (1/N(h)) Σ ½[z(xᵢ) - z(xⱼ)]²   over pairs with ⌊|xᵢ-xⱼ| / w⌋ = bin(h)
//! ```
//!
//! Models use the practical-range convention: γ reaches ~95% of the sill
//! at h = range for the exponential and Gaussian families.
//!
//! Reference:
//! Matheron, G. (1963). Principles of geostatistics. Economic Geology.
//! Cressie, N. (1985). Fitting variogram models by weighted least squares.
//! Mathematical Geology, 17(5).

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::debug;
use windmesh_core::{Error, PointSet, Result};

use super::linalg::solve;
use super::SamplePoint;

/// Empirical variogram: averaged semivariance per distance bin.
///
/// Only non-empty bins are kept, in ascending distance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmpiricalVariogram {
    /// Bin midpoints
    pub lags: Vec<f64>,
    /// Semivariance values γ(h) at each bin
    pub semivariance: Vec<f64>,
    /// Number of point pairs contributing to each bin
    pub pair_counts: Vec<usize>,
}

impl EmpiricalVariogram {
    pub fn len(&self) -> usize {
        self.lags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lags.is_empty()
    }

    /// `(mid_distance, semivariance, pair_count)` triples.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.lags
            .iter()
            .zip(&self.semivariance)
            .zip(&self.pair_counts)
            .map(|((&h, &g), &n)| (h, g, n))
    }
}

/// Compute the empirical semivariogram of `field` over a point set.
///
/// # Errors
/// `InvalidArgument` if `cutoff` or `bin_width` is not positive, or the
/// field does not exist.
pub fn empirical_variogram(
    points: &PointSet,
    field: &str,
    cutoff: f64,
    bin_width: f64,
) -> Result<EmpiricalVariogram> {
    let samples = super::samples(points, field)?;
    semivariogram(&samples, cutoff, bin_width)
}

/// Compute the empirical semivariogram of sample points.
///
/// Every pair with separation ≤ `cutoff` contributes ½(zᵢ - zⱼ)² to bin
/// `⌊d / bin_width⌋`. O(n²) in the number of samples; callers subsample
/// large inputs first.
pub fn semivariogram(
    points: &[SamplePoint],
    cutoff: f64,
    bin_width: f64,
) -> Result<EmpiricalVariogram> {
    if !(cutoff > 0.0 && cutoff.is_finite()) {
        return Err(Error::invalid("cutoff", cutoff, "must be positive and finite"));
    }
    if !(bin_width > 0.0 && bin_width.is_finite()) {
        return Err(Error::invalid("bin_width", bin_width, "must be positive and finite"));
    }

    // bin -> (sum of half squared differences, pair count), ascending by bin
    let mut bins: BTreeMap<usize, (f64, usize)> = BTreeMap::new();

    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let d = points[i].dist(points[j].x, points[j].y);
            if d > cutoff {
                continue;
            }
            let dz = points[i].value - points[j].value;
            let entry = bins.entry((d / bin_width).floor() as usize).or_insert((0.0, 0));
            entry.0 += 0.5 * dz * dz;
            entry.1 += 1;
        }
    }

    let mut vgm = EmpiricalVariogram::default();
    for (k, (sum, count)) in bins {
        vgm.lags.push((k as f64 + 0.5) * bin_width);
        vgm.semivariance.push(sum / count as f64);
        vgm.pair_counts.push(count);
    }
    Ok(vgm)
}

/// Parametric variogram family.
///
/// Declaration order is the tie-breaking priority used by model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelFamily {
    /// γ(h) = c₀ + c·[1.5(h/a) - 0.5(h/a)³] for h ≤ a; c₀+c for h > a
    Spherical,
    /// γ(h) = c₀ + c·[1 - exp(-3h/a)]
    Exponential,
    /// γ(h) = c₀ + c·[1 - exp(-3h²/a²)]
    Gaussian,
}

impl ModelFamily {
    /// All families in priority order.
    pub const ALL: [ModelFamily; 3] = [
        ModelFamily::Spherical,
        ModelFamily::Exponential,
        ModelFamily::Gaussian,
    ];

    /// Short gstat-style name (`Sph`, `Exp`, `Gau`).
    pub fn short_name(self) -> &'static str {
        match self {
            ModelFamily::Spherical => "Sph",
            ModelFamily::Exponential => "Exp",
            ModelFamily::Gaussian => "Gau",
        }
    }

    /// Unit-sill shape f(h; a) with f(0) = 0 and f → 1.
    #[inline]
    fn shape(self, h: f64, a: f64) -> f64 {
        match self {
            ModelFamily::Spherical => {
                if h >= a {
                    1.0
                } else {
                    let t = h / a;
                    1.5 * t - 0.5 * t * t * t
                }
            }
            ModelFamily::Exponential => 1.0 - (-3.0 * h / a).exp(),
            ModelFamily::Gaussian => 1.0 - (-3.0 * h * h / (a * a)).exp(),
        }
    }

    /// ∂f/∂a
    #[inline]
    fn shape_d_range(self, h: f64, a: f64) -> f64 {
        match self {
            ModelFamily::Spherical => {
                if h >= a {
                    0.0
                } else {
                    let t = h / a;
                    -(1.5 - 1.5 * t * t) * h / (a * a)
                }
            }
            ModelFamily::Exponential => -(3.0 * h / (a * a)) * (-3.0 * h / a).exp(),
            ModelFamily::Gaussian => {
                -(6.0 * h * h / (a * a * a)) * (-3.0 * h * h / (a * a)).exp()
            }
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Fitted parametric variogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariogramFit {
    pub family: ModelFamily,
    /// Nugget (c₀): discontinuity at h → 0
    pub nugget: f64,
    /// Partial sill (c): sill minus nugget
    pub partial_sill: f64,
    /// Range (a)
    pub range: f64,
}

impl VariogramFit {
    pub fn new(family: ModelFamily, nugget: f64, partial_sill: f64, range: f64) -> Self {
        Self {
            family,
            nugget,
            partial_sill,
            range,
        }
    }

    /// Total sill (c₀ + c).
    pub fn sill(&self) -> f64 {
        self.nugget + self.partial_sill
    }

    /// Evaluate γ(h). γ(0) = 0 by convention.
    pub fn evaluate(&self, h: f64) -> f64 {
        if h < 1e-12 {
            return 0.0;
        }
        self.nugget + self.partial_sill * self.family.shape(h, self.range)
    }

    fn is_valid(&self) -> bool {
        self.nugget.is_finite()
            && self.partial_sill.is_finite()
            && self.range.is_finite()
            && self.nugget >= 0.0
            && self.partial_sill >= 0.0
            && self.range > 0.0
            && self.sill() > 0.0
    }
}

/// Model consumed by the predictor.
///
/// Every consumer matches exhaustively, so adding a variant is a compile
/// error until all of them handle it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariogramModel {
    /// No spatial-correlation model: inverse distance weighting.
    Idw,
    /// Kriging without a fitted covariance (linear drift, linear variogram).
    Universal,
    /// Kriging with a fitted variogram.
    Fitted(VariogramFit),
}

impl VariogramModel {
    /// Export name: `Sph`/`Exp`/`Gau`, `IDW` or `Universal`.
    pub fn name(&self) -> &'static str {
        match self {
            VariogramModel::Idw => "IDW",
            VariogramModel::Universal => "Universal",
            VariogramModel::Fitted(fit) => fit.family.short_name(),
        }
    }

    pub fn fit(&self) -> Option<&VariogramFit> {
        match self {
            VariogramModel::Fitted(fit) => Some(fit),
            VariogramModel::Idw | VariogramModel::Universal => None,
        }
    }

    pub fn nugget(&self) -> Option<f64> {
        self.fit().map(|f| f.nugget)
    }

    pub fn sill(&self) -> Option<f64> {
        self.fit().map(VariogramFit::sill)
    }

    pub fn range(&self) -> Option<f64> {
        self.fit().map(|f| f.range)
    }
}

impl std::fmt::Display for VariogramModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariogramModel::Fitted(fit) => write!(
                f,
                "{}(nugget={:.4}, sill={:.4}, range={:.1})",
                fit.family,
                fit.nugget,
                fit.sill(),
                fit.range
            ),
            other => f.write_str(other.name()),
        }
    }
}

/// Starting point and stopping rules for the least-squares fit.
#[derive(Debug, Clone)]
pub struct VariogramFitParams {
    /// Initial partial sill, normally the sample variance of the field.
    pub initial_partial_sill: f64,
    /// Initial nugget (default 0).
    pub initial_nugget: f64,
    /// Initial range. `None` uses one third of the largest lag.
    pub initial_range: Option<f64>,
    /// Maximum Levenberg–Marquardt iterations (default 200).
    pub max_iterations: usize,
    /// Relative change in weighted SSE that counts as converged (default 1e-10).
    pub tolerance: f64,
}

impl Default for VariogramFitParams {
    fn default() -> Self {
        Self {
            initial_partial_sill: 1.0,
            initial_nugget: 0.0,
            initial_range: None,
            max_iterations: 200,
            tolerance: 1e-10,
        }
    }
}

impl VariogramFitParams {
    /// Seed with nugget 0 and partial sill = sample variance of `values`.
    pub fn seeded_from(values: &[f64]) -> Self {
        Self {
            initial_partial_sill: sample_variance(values),
            ..Default::default()
        }
    }
}

/// Unbiased sample variance of the finite entries; `NaN` below two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return f64::NAN;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    finite.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)
}

/// Minimum number of non-empty bins needed to fit three parameters.
const MIN_BINS: usize = 3;

/// Fit one parametric family to an empirical variogram.
///
/// Weighted nonlinear least squares (weights N(h)/h², as in gstat's default
/// fit method) solved by Levenberg–Marquardt, projected onto nugget ≥ 0,
/// partial sill ≥ 0, range > 0.
///
/// # Errors
/// `FitFailure` if there are too few bins, the field has no variance, or the
/// result is degenerate or non-finite.
pub fn fit_variogram(
    empirical: &EmpiricalVariogram,
    family: ModelFamily,
    params: &VariogramFitParams,
) -> Result<VariogramFit> {
    let bins: Vec<(f64, f64, f64)> = empirical
        .bins()
        .filter(|&(h, g, n)| h > 0.0 && g.is_finite() && n > 0)
        .map(|(h, g, n)| (h, g, n as f64 / (h * h)))
        .collect();

    if bins.len() < MIN_BINS {
        return Err(Error::FitFailure(format!(
            "{family}: need at least {MIN_BINS} non-empty lag bins, got {}",
            bins.len()
        )));
    }
    if !(params.initial_partial_sill > 0.0 && params.initial_partial_sill.is_finite()) {
        return Err(Error::FitFailure(format!(
            "{family}: field has no variance (initial sill {})",
            params.initial_partial_sill
        )));
    }
    if bins.iter().all(|&(_, g, _)| g <= 0.0) {
        return Err(Error::FitFailure(format!("{family}: all semivariances are zero")));
    }

    let max_lag = bins.iter().fold(0.0_f64, |m, b| m.max(b.0));
    let min_range = max_lag * 1e-6;
    let project = |theta: [f64; 3]| [theta[0].max(0.0), theta[1].max(0.0), theta[2].max(min_range)];

    let wsse = |theta: &[f64; 3]| -> f64 {
        let fit = VariogramFit::new(family, theta[0], theta[1], theta[2]);
        bins.iter()
            .map(|&(h, g, w)| {
                let r = g - fit.evaluate(h);
                w * r * r
            })
            .sum()
    };

    let mut theta = project([
        params.initial_nugget,
        params.initial_partial_sill,
        params.initial_range.unwrap_or(max_lag / 3.0),
    ]);
    let mut sse = wsse(&theta);
    let mut lambda = 1e-3;
    let mut converged = false;

    for _ in 0..params.max_iterations {
        // normal equations JᵀWJ δ = JᵀWr
        let mut jtj = Array2::<f64>::zeros((3, 3));
        let mut jtr = Array1::<f64>::zeros(3);
        for &(h, g, w) in &bins {
            let shape = family.shape(h, theta[2]);
            let jac = [1.0, shape, theta[1] * family.shape_d_range(h, theta[2])];
            let r = g - (theta[0] + theta[1] * shape);
            for a in 0..3 {
                jtr[a] += w * jac[a] * r;
                for b in 0..3 {
                    jtj[[a, b]] += w * jac[a] * jac[b];
                }
            }
        }

        let max_diag = (0..3).fold(0.0_f64, |m, k| m.max(jtj[[k, k]]));
        let mut stepped = false;
        while lambda < 1e12 {
            let mut damped = jtj.clone();
            for k in 0..3 {
                damped[[k, k]] += lambda * jtj[[k, k]].max(1e-9 * max_diag);
            }
            if let Ok(delta) = solve(damped, jtr.clone()) {
                let trial = project([
                    theta[0] + delta[0],
                    theta[1] + delta[1],
                    theta[2] + delta[2],
                ]);
                let trial_sse = wsse(&trial);
                if trial_sse.is_finite() && trial_sse <= sse {
                    let improvement = sse - trial_sse;
                    theta = trial;
                    sse = trial_sse;
                    lambda = (lambda / 10.0).max(1e-12);
                    stepped = true;
                    if improvement <= params.tolerance * sse.max(f64::MIN_POSITIVE) {
                        converged = true;
                    }
                    break;
                }
            }
            lambda *= 10.0;
        }
        if !stepped {
            // no descent direction left: local minimum
            converged = true;
        }
        if converged {
            break;
        }
    }

    if !converged {
        debug!(%family, sse, "variogram fit hit the iteration limit");
    }

    let fit = VariogramFit::new(family, theta[0], theta[1], theta[2]);
    if !fit.is_valid() {
        return Err(Error::FitFailure(format!(
            "{family}: degenerate parameters (nugget={}, psill={}, range={})",
            fit.nugget, fit.partial_sill, fit.range
        )));
    }
    Ok(fit)
}

/// Fit families in the given order and return the first that succeeds.
///
/// # Errors
/// `FitFailure` carrying the last failure when none fits.
pub fn fit_first_variogram(
    empirical: &EmpiricalVariogram,
    families: &[ModelFamily],
    params: &VariogramFitParams,
) -> Result<VariogramFit> {
    let mut last = Error::FitFailure("no candidate families given".into());
    for &family in families {
        match fit_variogram(empirical, family, params) {
            Ok(fit) => return Ok(fit),
            Err(e) => {
                debug!(%family, error = %e, "variogram candidate rejected");
                last = e;
            }
        }
    }
    Err(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_spatially_correlated(n: usize, range: f64, seed: u64) -> Vec<SamplePoint> {
        let mut points = Vec::with_capacity(n);
        let mut rng = seed;
        let mut next = || {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (rng >> 33) as f64 / (1u64 << 31) as f64
        };
        for _ in 0..n {
            let x = next() * 100.0;
            let y = next() * 100.0;
            let value = 0.5 * x + 0.3 * y + 10.0 * ((x / range).sin() + (y / range).sin());
            let noise = next() * 2.0 - 1.0;
            points.push(SamplePoint::new(x, y, value + noise));
        }
        points
    }

    fn seeded(points: &[SamplePoint]) -> VariogramFitParams {
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        VariogramFitParams::seeded_from(&values)
    }

    #[test]
    fn test_semivariogram_hand_computed() {
        // three collinear points: pairs at d=1 (twice) and d=2
        let points = vec![
            SamplePoint::new(0.0, 0.0, 1.0),
            SamplePoint::new(1.0, 0.0, 3.0),
            SamplePoint::new(2.0, 0.0, 4.0),
        ];
        let vgm = semivariogram(&points, 10.0, 1.5).unwrap();
        // bin 0: [0, 1.5) holds d=1 pairs: ½·4 and ½·1 → mean 1.25
        // bin 1: [1.5, 3.0) holds d=2 pair: ½·9 = 4.5
        assert_eq!(vgm.pair_counts, vec![2, 1]);
        assert!((vgm.semivariance[0] - 1.25).abs() < 1e-12);
        assert!((vgm.semivariance[1] - 4.5).abs() < 1e-12);
        assert!((vgm.lags[0] - 0.75).abs() < 1e-12);
        assert!((vgm.lags[1] - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_semivariogram_respects_cutoff_and_drops_empty_bins() {
        let points = vec![
            SamplePoint::new(0.0, 0.0, 0.0),
            SamplePoint::new(1.0, 0.0, 1.0),
            SamplePoint::new(10.0, 0.0, 5.0),
        ];
        let vgm = semivariogram(&points, 2.0, 0.5).unwrap();
        assert_eq!(vgm.len(), 1, "only the d=1 pair is within cutoff");
        assert_eq!(vgm.pair_counts, vec![1]);
        assert!((vgm.lags[0] - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_semivariogram_invalid_arguments() {
        let points = generate_spatially_correlated(10, 20.0, 1);
        assert!(matches!(
            semivariogram(&points, 0.0, 1.0),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            semivariogram(&points, 10.0, -1.0),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_semivariogram_fine_bins_over_long_cutoff() {
        // 1e15 potential bins, one occupied
        let points = vec![SamplePoint::new(0.0, 0.0, 1.0), SamplePoint::new(3.0, 4.0, 3.0)];
        let vgm = semivariogram(&points, 1.0e6, 1.0e-9).unwrap();
        assert_eq!(vgm.pair_counts, vec![1]);
        assert!((vgm.lags[0] - 5.0).abs() < 1e-6, "lag {}", vgm.lags[0]);
        assert!((vgm.semivariance[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_semivariogram_too_few_points_is_empty() {
        let points = vec![SamplePoint::new(0.0, 0.0, 1.0)];
        assert!(semivariogram(&points, 10.0, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_empirical_variogram_unknown_field() {
        let pts = PointSet::from_coords(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        assert!(matches!(
            empirical_variogram(&pts, "u", 5.0, 1.0),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_semivariance_increases_for_correlated_field() {
        let points = generate_spatially_correlated(150, 20.0, 42);
        let vgm = semivariogram(&points, 60.0, 4.0).unwrap();
        assert!(vgm.len() >= 10);
        let first = vgm.semivariance[0];
        let last = *vgm.semivariance.last().unwrap();
        assert!(first < last, "first={first:.2}, last={last:.2}");
    }

    #[test]
    fn test_fit_all_families() {
        let points = generate_spatially_correlated(200, 15.0, 123);
        let vgm = semivariogram(&points, 60.0, 4.0).unwrap();
        let params = seeded(&points);
        for family in ModelFamily::ALL {
            let fit = fit_variogram(&vgm, family, &params).unwrap();
            assert!(fit.nugget >= 0.0, "{family}: nugget {}", fit.nugget);
            assert!(fit.partial_sill >= 0.0);
            assert!(fit.range > 0.0);
            assert!(fit.sill() > 0.0);
        }
    }

    #[test]
    fn test_fit_recovers_synthetic_exponential() {
        let truth = VariogramFit::new(ModelFamily::Exponential, 0.5, 4.0, 30.0);
        let lags: Vec<f64> = (1..=20).map(|k| k as f64 * 3.0).collect();
        let vgm = EmpiricalVariogram {
            semivariance: lags.iter().map(|&h| truth.evaluate(h)).collect(),
            pair_counts: vec![100; lags.len()],
            lags,
        };
        let params = VariogramFitParams {
            initial_partial_sill: 3.0,
            ..Default::default()
        };
        let fit = fit_variogram(&vgm, ModelFamily::Exponential, &params).unwrap();
        assert!((fit.nugget - 0.5).abs() < 0.05, "nugget {}", fit.nugget);
        assert!((fit.sill() - 4.5).abs() < 0.05, "sill {}", fit.sill());
        assert!((fit.range - 30.0).abs() < 1.0, "range {}", fit.range);
    }

    #[test]
    fn test_fit_rejects_constant_field() {
        let vgm = EmpiricalVariogram {
            lags: vec![1.0, 2.0, 3.0, 4.0],
            semivariance: vec![0.0; 4],
            pair_counts: vec![10; 4],
        };
        let params = VariogramFitParams::seeded_from(&[2.0, 2.0, 2.0]);
        for family in ModelFamily::ALL {
            assert!(matches!(
                fit_variogram(&vgm, family, &params),
                Err(Error::FitFailure(_))
            ));
        }
    }

    #[test]
    fn test_fit_rejects_too_few_bins() {
        let vgm = EmpiricalVariogram {
            lags: vec![1.0, 2.0],
            semivariance: vec![0.5, 1.0],
            pair_counts: vec![4, 2],
        };
        let params = VariogramFitParams::default();
        assert!(fit_variogram(&vgm, ModelFamily::Spherical, &params).is_err());
        assert!(fit_first_variogram(&vgm, &ModelFamily::ALL, &params).is_err());
    }

    #[test]
    fn test_spherical_evaluation() {
        let model = VariogramFit::new(ModelFamily::Spherical, 1.0, 9.0, 50.0);
        assert!(model.evaluate(0.0).abs() < 1e-10);
        assert!((model.evaluate(50.0) - 10.0).abs() < 1e-10);
        assert!((model.evaluate(100.0) - 10.0).abs() < 1e-10);
        let mid = model.evaluate(25.0);
        assert!(mid > 1.0 && mid < 10.0, "mid {mid:.2}");
    }

    #[test]
    fn test_exponential_practical_range() {
        let model = VariogramFit::new(ModelFamily::Exponential, 0.0, 10.0, 30.0);
        let at_range = model.evaluate(30.0);
        assert!(at_range > 9.0 && at_range < 10.0, "got {at_range:.2}");
    }

    #[test]
    fn test_range_derivative_matches_finite_difference() {
        for family in ModelFamily::ALL {
            let (h, a, eps) = (12.0, 20.0, 1e-6);
            let fd = (family.shape(h, a + eps) - family.shape(h, a - eps)) / (2.0 * eps);
            let an = family.shape_d_range(h, a);
            assert!((fd - an).abs() < 1e-6, "{family}: fd={fd}, analytic={an}");
        }
    }

    #[test]
    fn test_model_names() {
        let fit = VariogramFit::new(ModelFamily::Gaussian, 0.0, 1.0, 1.0);
        assert_eq!(VariogramModel::Fitted(fit).name(), "Gau");
        assert_eq!(VariogramModel::Idw.name(), "IDW");
        assert_eq!(VariogramModel::Universal.name(), "Universal");
        assert!(VariogramModel::Idw.range().is_none());
        assert_eq!(VariogramModel::Fitted(fit).sill(), Some(1.0));
    }
}
