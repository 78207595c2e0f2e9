//! End-to-end runs of the interpolation suite on synthetic wind lattices.
//!
//! The fields are smooth trends plus a small seeded noise term, so every
//! stage has real spatial structure to work with and results are
//! reproducible without fixtures.

use windmesh_algorithms::export::{export_records, RunSummary};
use windmesh_algorithms::interpolation::{regression_krige, RegressionKrigingParams, VariogramModel};
use windmesh_algorithms::suite::{run_suite, ModelStrategy, SuiteConfig};
use windmesh_core::{Error, InterpolationSource, PointSet};

fn lcg(seed: u64) -> impl FnMut() -> f64 {
    let mut state = seed;
    move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64 - 0.5
    }
}

/// `n`×`n` lattice at `spacing` metres with `u`, `v` and `topo` columns.
fn wind_lattice(n: usize, spacing: f64) -> PointSet {
    let mut noise = lcg(11);
    let (mut ids, mut xs, mut ys) = (Vec::new(), Vec::new(), Vec::new());
    let (mut u, mut v, mut topo) = (Vec::new(), Vec::new(), Vec::new());
    for r in 0..n {
        for c in 0..n {
            let x = 500_000.0 + c as f64 * spacing;
            let y = 4_100_000.0 + r as f64 * spacing;
            let (lx, ly) = (x - 500_000.0, y - 4_100_000.0);
            let t = 200.0 + 0.3 * lx + 20.0 * (lx / 250.0).sin();
            ids.push(format!("st_{r}_{c}"));
            xs.push(x);
            ys.push(y);
            topo.push(t);
            u.push(3.0 + 0.002 * lx + 0.8 * (ly / 400.0).sin() + 0.2 * noise());
            v.push(-1.0 + 0.001 * ly + 0.5 * (lx / 350.0).cos() + 0.01 * t + 0.2 * noise());
        }
    }
    PointSet::new(ids, xs, ys)
        .unwrap()
        .with_column("u", u)
        .unwrap()
        .with_column("v", v)
        .unwrap()
        .with_column("topo", topo)
        .unwrap()
}

fn square_300() -> PointSet {
    PointSet::from_coords(&[
        (1000.0, 2000.0),
        (1300.0, 2000.0),
        (1000.0, 2300.0),
        (1300.0, 2300.0),
    ])
    .unwrap()
    .with_column("u", vec![1.0, 2.0, 3.0, 4.0])
    .unwrap()
    .with_column("v", vec![-1.0; 4])
    .unwrap()
}

#[test]
fn test_two_by_two_falls_back_to_idw() {
    let config = SuiteConfig {
        test_pct: 0.0,
        regression_kriging: false,
        cutoff: Some(1000.0),
        ..Default::default()
    };
    let out = run_suite(&square_300(), None, &config).unwrap();

    // two lag bins only: nothing can be fitted
    for field in ["u", "v"] {
        let report = &out.components[field];
        assert_eq!(report.model(), &VariogramModel::Idw);
        assert!(report.selection.candidates.is_empty());
        assert!(report.holdout.is_none());
    }

    assert_eq!(out.grid_spacing, 150.0);
    assert_eq!(out.mesh.len(), 9);
    assert_eq!(out.input_count, 4);
    assert_eq!(out.interpolated_count(), 5);

    let records = export_records(&out);
    assert_eq!(records.len(), 9);
    let original = records
        .iter()
        .filter(|r| r.interpolation_source == "original")
        .count();
    assert_eq!(original, 4);

    let centre = records
        .iter()
        .find(|r| r.x_local == 150.0 && r.y_local == 150.0)
        .unwrap();
    assert!(!centre.is_orig);
    assert!((centre.u.unwrap() - 2.5).abs() < 1e-12);
    assert!((centre.v.unwrap() + 1.0).abs() < 1e-12);
    assert!((centre.nearest_distance - 150.0 * 2f64.sqrt()).abs() < 1e-9);
    assert_eq!(centre.neighbors_used, 4);
    assert!(centre.kriging_var_u.unwrap().is_nan());
    assert_eq!(centre.cv_model_u, Some("IDW"));
    assert_eq!(centre.vgm_range_u, None);
    assert_eq!(centre.topo, None);
    assert_eq!(centre.u_rkt, None);

    // observations pass through untouched
    let corner = records.iter().find(|r| r.node_id == "3").unwrap();
    assert!(corner.is_orig);
    assert_eq!(corner.u, Some(4.0));
}

#[test]
fn test_full_run_with_holdout_and_regression_kriging() {
    let data = wind_lattice(10, 150.0);
    let out = run_suite(&data, None, &SuiteConfig::default()).unwrap();

    assert_eq!(out.mesh.len(), 19 * 19);
    assert_eq!(out.interpolated_count(), 19 * 19 - 100);
    assert_eq!(out.split.test.len(), 10);
    assert_eq!(out.split.train.len(), 90);

    let points = out.mesh.points();
    for field in ["u", "v", "u_rkt", "v_rkt", "topo"] {
        let column = points.column(field).unwrap();
        for &i in &out.mesh.non_original_indices() {
            assert!(column[i].is_finite(), "{field} missing at node {i}");
        }
    }

    for field in ["u", "v"] {
        let report = &out.components[field];
        let holdout = report.holdout.expect("hold-out enabled by default");
        assert_eq!(holdout.n, 10);
        assert!(holdout.is_finite(), "{field}: {holdout:?}");
        assert!(holdout.rsr < 1.0, "{field}: RSR {}", holdout.rsr);
        assert!(report.regression.is_some());
        assert!(!report.empirical.is_empty());
    }

    // rkt columns keep observed values at original nodes
    let u = points.column("u").unwrap();
    let u_rkt = points.column("u_rkt").unwrap();
    for &i in out.mesh.original_indices() {
        assert_eq!(u[i], u_rkt[i]);
    }
}

#[test]
fn test_same_seed_same_run() {
    let data = wind_lattice(8, 150.0);
    let config = SuiteConfig {
        regression_kriging: false,
        ..Default::default()
    };
    let a = run_suite(&data, None, &config).unwrap();
    let b = run_suite(&data, None, &config).unwrap();
    assert_eq!(a.split, b.split);
    assert_eq!(a.components, b.components);
    let ua = a.mesh.points().column("u").unwrap();
    let ub = b.mesh.points().column("u").unwrap();
    assert!(ua.iter().zip(ub).all(|(x, y)| x == y || (x.is_nan() && y.is_nan())));

    // 64 points at 150 m: 6 held out, scored for both components
    for field in ["u", "v"] {
        let holdout = a.components[field].holdout.unwrap();
        assert_eq!(holdout.n, 6);
        assert!(holdout.rsr.is_finite() && holdout.bias.is_finite());
    }
}

#[test]
fn test_holdout_is_disjoint_from_training() {
    let data = wind_lattice(8, 150.0);
    let config = SuiteConfig {
        test_pct: 20.0,
        subsample_pct: 50.0,
        regression_kriging: false,
        model_strategy: ModelStrategy::Idw,
        ..Default::default()
    };
    let out = run_suite(&data, None, &config).unwrap();
    let split = &out.split;

    assert_eq!(split.test.len(), 13);
    assert_eq!(split.train.len() + split.test.len(), 64);
    assert!(split.test.iter().all(|i| !split.train.contains(i)));
    assert!(split.subsample.iter().all(|i| split.train.contains(i)));
    assert_eq!(split.subsample.len(), 26);
}

#[test]
fn test_validation_points_are_tagged() {
    let data = wind_lattice(6, 150.0);
    let validation = PointSet::new(
        vec!["val_a".to_string(), "val_b".to_string()],
        vec![500_100.0, 500_410.0],
        vec![4_100_220.0, 4_100_333.0],
    )
    .unwrap();
    let config = SuiteConfig {
        test_pct: 0.0,
        regression_kriging: false,
        model_strategy: ModelStrategy::Universal,
        ..Default::default()
    };
    let out = run_suite(&data, Some(&validation), &config).unwrap();

    assert_eq!(out.mesh.len(), 11 * 11 + 2);
    let points = out.mesh.points();
    let u = points.column("u").unwrap();
    for id in ["val_a", "val_b"] {
        let i = points.position(id).unwrap();
        assert_eq!(out.mesh.sources()[i], InterpolationSource::TestPoint);
        assert!(!out.mesh.is_orig()[i]);
        assert!(u[i].is_finite());
    }
    assert_eq!(out.components["u"].model(), &VariogramModel::Universal);
}

#[test]
fn test_validation_point_sharing_a_lattice_id() {
    let data = wind_lattice(6, 150.0);
    // same id as the lattice node at x_local 75, y_local 0
    let validation = PointSet::new(
        vec!["mesh_1_0".to_string()],
        vec![500_100.0],
        vec![4_100_220.0],
    )
    .unwrap();
    let config = SuiteConfig {
        test_pct: 0.0,
        regression_kriging: false,
        model_strategy: ModelStrategy::Idw,
        ..Default::default()
    };
    let out = run_suite(&data, Some(&validation), &config).unwrap();

    let points = out.mesh.points();
    let sources = out.mesh.sources();
    let appended = out.mesh.len() - 1;
    let lattice = points.position("mesh_1_0").unwrap();
    assert!(lattice < appended);
    assert_eq!(out.mesh.x_local()[lattice], 75.0);
    assert_eq!(sources[lattice], InterpolationSource::Interpolated);
    assert_eq!(sources[appended], InterpolationSource::TestPoint);
    let tagged = sources
        .iter()
        .filter(|&&s| s == InterpolationSource::TestPoint)
        .count();
    assert_eq!(tagged, 1);
}

#[test]
fn test_neighbors_used_counts_every_point_in_radius() {
    // 64 stations spanning 1050 m all sit inside a 2000 m radius
    let data = wind_lattice(8, 150.0);
    let config = SuiteConfig {
        test_pct: 0.0,
        regression_kriging: false,
        model_strategy: ModelStrategy::Idw,
        cutoff: Some(2000.0),
        ..Default::default()
    };
    assert!(config.max_neighbors < 64);
    let out = run_suite(&data, None, &config).unwrap();

    let records = export_records(&out);
    let interpolated: Vec<_> = records.iter().filter(|r| !r.is_orig).collect();
    assert_eq!(interpolated.len(), 15 * 15 - 64);
    assert!(interpolated.iter().all(|r| r.neighbors_used == 64));
}

#[test]
fn test_stage_is_reported_on_failure() {
    // 10 % of 4 points rounds to zero hold-out points
    let config = SuiteConfig {
        regression_kriging: false,
        ..Default::default()
    };
    let err = run_suite(&square_300(), None, &config).unwrap_err();
    assert_eq!(err.stage(), Some("holdout_split"));
    assert!(matches!(
        err,
        Error::Stage { ref source, .. } if matches!(**source, Error::InsufficientData { .. })
    ));

    // two stations on one lattice node cannot be densified
    let doubled = PointSet::from_coords(&[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (0.0, 100.0)])
        .unwrap()
        .with_column("u", vec![1.0; 4])
        .unwrap()
        .with_column("v", vec![1.0; 4])
        .unwrap();
    let config = SuiteConfig {
        test_pct: 0.0,
        regression_kriging: false,
        ..Default::default()
    };
    let err = run_suite(&doubled, None, &config).unwrap_err();
    assert_eq!(err.stage(), Some("densify"));
}

#[test]
fn test_regression_kriging_is_trend_plus_residual() {
    let data = wind_lattice(10, 150.0);
    let targets = PointSet::from_coords(&[(500_075.0, 4_100_075.0), (500_660.0, 4_100_910.0)]).unwrap();
    let params = RegressionKrigingParams {
        cutoff: 700.0,
        bin_width: 50.0,
        ..Default::default()
    };
    let rk = regression_krige("v", &data, &targets, &data, &params).unwrap();
    for i in 0..targets.len() {
        let sum = rk.trend[i] + rk.residual.values[i];
        assert!((rk.predictions[i] - sum).abs() < 1e-12);
    }
    // v carries a 0.01·topo term
    assert!(rk.slope > 0.0);
}

#[test]
fn test_export_serializes_non_finite_as_null() {
    let config = SuiteConfig {
        test_pct: 0.0,
        regression_kriging: false,
        cutoff: Some(1000.0),
        ..Default::default()
    };
    let out = run_suite(&square_300(), None, &config).unwrap();
    let records = export_records(&out);
    let json = serde_json::to_value(&records).unwrap();
    let first = &json[0];
    assert_eq!(first["interpolation_source"], "original");
    assert!(first["kriging_var_u"].is_null());
    assert!(first["wind_speed"].is_number());

    let summary = serde_json::to_value(RunSummary::new(&out)).unwrap();
    assert_eq!(summary["input_count"], 4);
    assert_eq!(summary["interpolated_count"], 5);
    assert_eq!(summary["components"]["u"]["selection"]["selected"]["kind"], "idw");
}
