//! End-to-end interpolation run for one partition
//!
//! Stages, strictly in order:
//! configure → densify → holdout_split → per field {variogram_select →
//! predict ∥ regression_kriging} → back_propagate → holdout_evaluate.
//!
//! Fields run in parallel, and within a field the plain prediction and the
//! regression-kriging prediction are joined. Any fatal error is tagged with
//! its stage and aborts the run before the mesh is returned, so a failed
//! run never yields a partially written mesh.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use windmesh_core::{Error, Mesh, PointSet, Result};

use crate::grid::{densify, native_spacing, native_ticks, Densified};
use crate::interpolation::{
    accuracy, empirical_variogram, predict, regression_krige, select_model, AccuracyMetrics,
    EmpiricalVariogram, KdTree, ModelSelection, Prediction, RegressionKrigingParams,
    RegressionKrigingResult, RegressionSummary, SelectionParams, VariogramModel,
};
use crate::maybe_rayon::*;
use crate::sampling::{plan_split, SplitPlan};

/// Bins per cutoff when `bin_width` is derived.
const AUTO_BINS: f64 = 15.0;

/// How each field's model is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStrategy {
    /// Fit and cross-validate variogram families, IDW when none is usable.
    #[default]
    Auto,
    /// Always IDW.
    Idw,
    /// Always drift-only universal kriging.
    Universal,
}

/// Run configuration. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Percentage of data held out for final scoring; 0 disables hold-out.
    pub test_pct: f64,
    /// Percentage of the remaining data used for variogram fitting and CV.
    pub subsample_pct: f64,
    pub seed: u64,
    pub n_folds: usize,
    pub max_neighbors: usize,
    /// Variogram cutoff and search radius; `None` derives it from the extent.
    pub cutoff: Option<f64>,
    /// Lag bin width; `None` uses `cutoff / 15`.
    pub bin_width: Option<f64>,
    pub refinement_factor: usize,
    /// Scalar fields to interpolate.
    pub fields: Vec<String>,
    /// Covariate column for regression kriging.
    pub covariate: String,
    pub regression_kriging: bool,
    pub model_strategy: ModelStrategy,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            test_pct: 10.0,
            subsample_pct: 100.0,
            seed: 42,
            n_folds: 5,
            max_neighbors: 16,
            cutoff: None,
            bin_width: None,
            refinement_factor: 2,
            fields: vec!["u".to_string(), "v".to_string()],
            covariate: "topo".to_string(),
            regression_kriging: true,
            model_strategy: ModelStrategy::Auto,
        }
    }
}

impl SuiteConfig {
    /// Check ranges that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..100.0).contains(&self.test_pct) {
            return Err(Error::invalid("test_pct", self.test_pct, "must be in [0, 100)"));
        }
        if !(self.subsample_pct > 0.0 && self.subsample_pct <= 100.0) {
            return Err(Error::invalid(
                "subsample_pct",
                self.subsample_pct,
                "must be in (0, 100]",
            ));
        }
        if self.n_folds < 2 {
            return Err(Error::invalid("n_folds", self.n_folds, "must be at least 2"));
        }
        if self.max_neighbors < 1 {
            return Err(Error::invalid(
                "max_neighbors",
                self.max_neighbors,
                "must be at least 1",
            ));
        }
        if self.refinement_factor < 1 {
            return Err(Error::invalid(
                "refinement_factor",
                self.refinement_factor,
                "must be at least 1",
            ));
        }
        if self.fields.is_empty() {
            return Err(Error::invalid("fields", "[]", "at least one field is required"));
        }
        for (name, value) in [("cutoff", self.cutoff), ("bin_width", self.bin_width)] {
            if let Some(v) = value
                && !(v > 0.0 && v.is_finite())
            {
                return Err(Error::invalid(name, v, "must be positive and finite"));
            }
        }
        Ok(())
    }
}

/// Per-field results reported alongside the mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    /// Selected model and the cross-validation table
    pub selection: ModelSelection,
    /// Empirical variogram of the CV subsample
    pub empirical: EmpiricalVariogram,
    /// Hold-out RSR/Bias; `None` when hold-out is disabled
    pub holdout: Option<AccuracyMetrics>,
    /// Regression-kriging trend and residual model; `None` when disabled
    pub regression: Option<RegressionSummary>,
}

impl ComponentReport {
    pub fn model(&self) -> &VariogramModel {
        &self.selection.selected
    }
}

/// Output of [`run_suite`].
#[derive(Debug, Clone)]
pub struct SuiteOutput {
    /// Densified mesh with predictions, variances and diagnostics
    pub mesh: Mesh,
    pub grid_spacing: f64,
    pub cutoff: f64,
    pub bin_width: f64,
    /// Number of input data points
    pub input_count: usize,
    pub split: SplitPlan,
    pub components: BTreeMap<String, ComponentReport>,
}

impl SuiteOutput {
    pub fn interpolated_count(&self) -> usize {
        self.mesh.interpolated_count()
    }
}

/// Everything computed for one field before back-propagation.
struct FieldRun {
    field: String,
    selection: ModelSelection,
    empirical: EmpiricalVariogram,
    prediction: Prediction,
    regression: Option<RegressionKrigingResult>,
}

/// Training and CV point sets shared by every field.
struct Partition {
    train: PointSet,
    cv: PointSet,
    test: PointSet,
}

/// Run the interpolation suite over `data`.
///
/// `validation` points are merged into the prediction targets and tagged
/// `test_point` in the mesh.
///
/// # Errors
/// Any fatal error wrapped as [`Error::Stage`] with the failing stage name.
pub fn run_suite(
    data: &PointSet,
    validation: Option<&PointSet>,
    config: &SuiteConfig,
) -> Result<SuiteOutput> {
    // configure
    configure(data, config).map_err(|e| e.in_stage("configure"))?;

    // densify
    let (densified, cutoff, bin_width) =
        densify_stage(data, validation, config).map_err(|e| e.in_stage("densify"))?;
    info!(
        nodes = densified.mesh.len(),
        queries = densified.query_indices.len(),
        grid_spacing = densified.grid_spacing,
        cutoff,
        bin_width,
        "mesh densified"
    );

    // holdout_split
    let (split, partition) = split_stage(data, config).map_err(|e| e.in_stage("holdout_split"))?;
    info!(
        train = split.train.len(),
        test = split.test.len(),
        subsample = split.subsample.len(),
        "data partitioned"
    );

    // per-field selection and prediction
    let queries = densified
        .query_points()
        .map_err(|e| e.in_stage("densify"))?;
    let runs: Vec<FieldRun> = config
        .fields
        .as_slice()
        .into_par_iter()
        .map(|field| run_field(field, &partition, &queries, config, cutoff, bin_width))
        .collect::<Result<_>>()?;

    // back_propagate
    let Densified {
        mut mesh,
        query_indices,
        extra_indices,
        grid_spacing,
    } = densified;
    back_propagate(
        &mut mesh,
        &query_indices,
        extra_indices,
        &runs,
        &partition.train,
        config,
        cutoff,
    )
    .map_err(|e| e.in_stage("back_propagate"))?;
    info!(interpolated = mesh.interpolated_count(), "predictions written to mesh");

    // holdout_evaluate
    let mut components = BTreeMap::new();
    for run in runs {
        let holdout = holdout_evaluate(&run.field, &run.selection.selected, &partition, config, cutoff)
            .map_err(|e| e.in_stage("holdout_evaluate"))?;
        if let Some(m) = &holdout {
            info!(field = %run.field, rsr = m.rsr, bias = m.bias, n = m.n, "hold-out scored");
        }
        components.insert(
            run.field,
            ComponentReport {
                selection: run.selection,
                empirical: run.empirical,
                holdout,
                regression: run.regression.as_ref().map(RegressionKrigingResult::summary),
            },
        );
    }

    Ok(SuiteOutput {
        mesh,
        grid_spacing,
        cutoff,
        bin_width,
        input_count: data.len(),
        split,
        components,
    })
}

fn configure(data: &PointSet, config: &SuiteConfig) -> Result<()> {
    config.validate()?;
    for field in &config.fields {
        data.column(field)?;
    }
    if config.regression_kriging {
        data.column(&config.covariate)?;
    }
    Ok(())
}

fn densify_stage(
    data: &PointSet,
    validation: Option<&PointSet>,
    config: &SuiteConfig,
) -> Result<(Densified, f64, f64)> {
    let (x_ticks, y_ticks) = native_ticks(data)?;
    let densified = densify(data, &x_ticks, &y_ticks, config.refinement_factor, validation)?;
    let cutoff = match config.cutoff {
        Some(c) => c,
        None => auto_cutoff(data, &x_ticks, &y_ticks)?,
    };
    let bin_width = config.bin_width.unwrap_or(cutoff / AUTO_BINS);
    Ok((densified, cutoff, bin_width))
}

/// Half the extent diagonal, at least twice the coarser native spacing.
fn auto_cutoff(data: &PointSet, x_ticks: &[f64], y_ticks: &[f64]) -> Result<f64> {
    let (min_x, min_y, max_x, max_y) = data.extent().ok_or(Error::InsufficientData {
        what: "data points",
        count: 0,
    })?;
    let half_diagonal = 0.5 * (max_x - min_x).hypot(max_y - min_y);
    let coarse = native_spacing(x_ticks)
        .into_iter()
        .chain(native_spacing(y_ticks))
        .fold(0.0_f64, f64::max);
    let cutoff = half_diagonal.max(2.0 * coarse);
    if cutoff > 0.0 {
        Ok(cutoff)
    } else {
        Err(Error::invalid("cutoff", cutoff, "data extent is degenerate"))
    }
}

fn split_stage(data: &PointSet, config: &SuiteConfig) -> Result<(SplitPlan, Partition)> {
    let split = plan_split(data.len(), config.test_pct, config.subsample_pct, config.seed)?;
    let partition = Partition {
        train: data.subset(&split.train)?,
        cv: data.subset(&split.subsample)?,
        test: data.subset(&split.test)?,
    };
    Ok((split, partition))
}

fn run_field(
    field: &str,
    partition: &Partition,
    queries: &PointSet,
    config: &SuiteConfig,
    cutoff: f64,
    bin_width: f64,
) -> Result<FieldRun> {
    let (empirical, selection) = select_stage(field, partition, config, cutoff, bin_width)
        .map_err(|e| e.in_stage("variogram_select"))?;
    info!(field, model = selection.selected.name(), candidates = selection.candidates.len(), "model chosen");

    let model = selection.selected;
    let (prediction, regression) = join(
        || {
            predict(field, &model, &partition.train, queries, cutoff, config.max_neighbors)
                .map_err(|e| e.in_stage("predict"))
        },
        || {
            if !config.regression_kriging {
                return Ok(None);
            }
            let params = RegressionKrigingParams {
                covariate: config.covariate.clone(),
                cutoff,
                bin_width,
                max_neighbors: config.max_neighbors,
            };
            regression_krige(field, &partition.train, queries, &partition.cv, &params)
                .map(Some)
                .map_err(|e| e.in_stage("regression_kriging"))
        },
    );

    Ok(FieldRun {
        field: field.to_string(),
        selection,
        empirical,
        prediction: prediction?,
        regression: regression?,
    })
}

fn select_stage(
    field: &str,
    partition: &Partition,
    config: &SuiteConfig,
    cutoff: f64,
    bin_width: f64,
) -> Result<(EmpiricalVariogram, ModelSelection)> {
    let empirical = empirical_variogram(&partition.cv, field, cutoff, bin_width)?;
    debug!(field, bins = empirical.len(), "empirical variogram");
    let selection = match config.model_strategy {
        ModelStrategy::Auto => {
            let params = SelectionParams {
                n_folds: config.n_folds,
                max_neighbors: config.max_neighbors,
                cutoff: Some(cutoff),
                seed: config.seed.wrapping_add(2),
            };
            select_model(&partition.cv, &empirical, field, &params)?
        }
        ModelStrategy::Idw => ModelSelection {
            selected: VariogramModel::Idw,
            candidates: Vec::new(),
        },
        ModelStrategy::Universal => ModelSelection {
            selected: VariogramModel::Universal,
            candidates: Vec::new(),
        },
    };
    Ok((empirical, selection))
}

fn back_propagate(
    mesh: &mut Mesh,
    query_indices: &[usize],
    extra_indices: Range<usize>,
    runs: &[FieldRun],
    train: &PointSet,
    config: &SuiteConfig,
    cutoff: f64,
) -> Result<()> {
    let mut covariate_written = false;
    for run in runs {
        let field = run.field.as_str();
        mesh.write_predictions(field, query_indices, &run.prediction.values)?;
        mesh.write_predictions(
            &format!("kriging_var_{field}"),
            query_indices,
            &run.prediction.variances,
        )?;

        if let Some(rk) = &run.regression {
            let rkt = format!("{field}_rkt");
            mesh.derive_column(rkt.as_str(), field)?;
            mesh.write_predictions(&rkt, query_indices, &rk.predictions)?;
            if !covariate_written {
                mesh.write_predictions(&config.covariate, query_indices, &rk.covariate_at_targets)?;
                covariate_written = true;
            }
        }
    }

    let tree = KdTree::from_coords(&train.coords().collect::<Vec<_>>());
    let coords: Vec<(f64, f64)> = mesh.points().coords().collect();
    let (nearest, used): (Vec<f64>, Vec<f64>) = coords
        .into_par_iter()
        .map(|(x, y)| {
            let nearest = tree.nearest(x, y).map_or(f64::NAN, |r| r.distance());
            let used = tree.count_within(x, y, cutoff);
            (nearest, used as f64)
        })
        .unzip();
    mesh.add_column("nearest_distance", nearest)?;
    mesh.add_column("neighbors_used", used)?;

    if !extra_indices.is_empty() {
        let tagged = mesh.mark_test_points(extra_indices);
        debug!(tagged, "validation points tagged");
    }
    Ok(())
}

fn holdout_evaluate(
    field: &str,
    model: &VariogramModel,
    partition: &Partition,
    config: &SuiteConfig,
    cutoff: f64,
) -> Result<Option<AccuracyMetrics>> {
    if partition.test.is_empty() {
        return Ok(None);
    }
    let prediction = predict(
        field,
        model,
        &partition.train,
        &partition.test,
        cutoff,
        config.max_neighbors,
    )?;
    let observed = partition.test.column(field)?;
    Ok(Some(accuracy(observed, &prediction.values)))
}
