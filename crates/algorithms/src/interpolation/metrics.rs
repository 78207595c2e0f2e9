//! Accuracy scores for cross-validation and hold-out evaluation
//!
//! - **RSR**: RMSE divided by the (population) standard deviation of the
//!   observations. 0 is a perfect fit; lower is better.
//! - **Bias**: mean signed error, mean(predicted - observed).
//!
//! Reference:
//! Moriasi, D.N. et al. (2007). Model evaluation guidelines for systematic
//! quantification of accuracy in watershed simulations. Trans. ASABE, 50(3).

use serde::Serialize;

/// RSR and Bias over a set of (observed, predicted) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    pub rsr: f64,
    pub bias: f64,
    /// Number of pairs that entered the scores
    pub n: usize,
}

impl AccuracyMetrics {
    pub fn is_finite(&self) -> bool {
        self.rsr.is_finite() && self.bias.is_finite()
    }
}

/// Score predictions against observations.
///
/// Pairs where either side is not finite are ignored. Both scores are
/// `NaN` when no pair remains.
pub fn accuracy(observed: &[f64], predicted: &[f64]) -> AccuracyMetrics {
    let (obs, pred): (Vec<f64>, Vec<f64>) = observed
        .iter()
        .zip(predicted)
        .filter(|(o, p)| o.is_finite() && p.is_finite())
        .map(|(&o, &p)| (o, p))
        .unzip();
    AccuracyMetrics {
        rsr: rsr(&obs, &pred),
        bias: bias(&obs, &pred),
        n: obs.len(),
    }
}

/// RMSE / stddev(observed).
///
/// `NaN` iff the observed standard deviation is exactly 0 or the inputs are
/// empty; otherwise ≥ 0.
pub fn rsr(observed: &[f64], predicted: &[f64]) -> f64 {
    let n = observed.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    let nf = n as f64;
    let mean = observed[..n].iter().sum::<f64>() / nf;
    let var = observed[..n].iter().map(|o| (o - mean).powi(2)).sum::<f64>() / nf;
    let std = var.sqrt();
    if std == 0.0 {
        return f64::NAN;
    }
    let mse = observed[..n]
        .iter()
        .zip(&predicted[..n])
        .map(|(o, p)| (p - o).powi(2))
        .sum::<f64>()
        / nf;
    mse.sqrt() / std
}

/// mean(predicted - observed); `NaN` for empty inputs.
pub fn bias(observed: &[f64], predicted: &[f64]) -> f64 {
    let n = observed.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    observed[..n]
        .iter()
        .zip(&predicted[..n])
        .map(|(o, p)| p - o)
        .sum::<f64>()
        / n as f64
}
