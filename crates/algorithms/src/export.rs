//! Flat per-node records for downstream writers
//!
//! One [`ExportRecord`] per mesh node carries the node's coordinates,
//! predicted wind components, variances, diagnostics and the run-level model
//! metadata for `u` and `v`. Non-finite values serialize as `null`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::suite::{ComponentReport, SuiteOutput};
use crate::wind::speed_direction;

/// One mesh node, flattened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    pub node_id: String,
    pub x: f64,
    pub y: f64,
    pub x_local: f64,
    pub y_local: f64,
    pub is_orig: bool,
    pub topo: Option<f64>,
    pub u: Option<f64>,
    pub v: Option<f64>,
    pub u_rkt: Option<f64>,
    pub v_rkt: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_dir: Option<f64>,
    pub kriging_var_u: Option<f64>,
    pub kriging_var_v: Option<f64>,
    pub nearest_distance: f64,
    pub nearest_distance_km: f64,
    pub neighbors_used: usize,
    pub interpolation_source: &'static str,
    pub input_count: usize,
    pub interpolated_count: usize,

    pub cv_model_u: Option<&'static str>,
    pub cv_rsr_u: Option<f64>,
    pub cv_bias_u: Option<f64>,
    pub test_model_u: Option<&'static str>,
    pub test_rsr_u: Option<f64>,
    pub test_bias_u: Option<f64>,
    pub vgm_model_u: Option<&'static str>,
    pub vgm_range_u: Option<f64>,
    pub vgm_sill_u: Option<f64>,
    pub vgm_nugget_u: Option<f64>,

    pub cv_model_v: Option<&'static str>,
    pub cv_rsr_v: Option<f64>,
    pub cv_bias_v: Option<f64>,
    pub test_model_v: Option<&'static str>,
    pub test_rsr_v: Option<f64>,
    pub test_bias_v: Option<f64>,
    pub vgm_model_v: Option<&'static str>,
    pub vgm_range_v: Option<f64>,
    pub vgm_sill_v: Option<f64>,
    pub vgm_nugget_v: Option<f64>,
}

/// Run-level metadata for one component.
#[derive(Debug, Clone, Copy, Default)]
struct ComponentMeta {
    cv_model: Option<&'static str>,
    cv_rsr: Option<f64>,
    cv_bias: Option<f64>,
    test_model: Option<&'static str>,
    test_rsr: Option<f64>,
    test_bias: Option<f64>,
    vgm_model: Option<&'static str>,
    vgm_range: Option<f64>,
    vgm_sill: Option<f64>,
    vgm_nugget: Option<f64>,
}

impl ComponentMeta {
    fn from_report(report: Option<&ComponentReport>) -> Self {
        let Some(report) = report else {
            return Self::default();
        };
        let model = report.model();
        let cv = report.selection.selected_score();
        Self {
            cv_model: Some(model.name()),
            cv_rsr: cv.map(|c| c.rsr),
            cv_bias: cv.map(|c| c.bias),
            test_model: report.holdout.map(|_| model.name()),
            test_rsr: report.holdout.map(|m| m.rsr),
            test_bias: report.holdout.map(|m| m.bias),
            vgm_model: Some(model.name()),
            vgm_range: model.range(),
            vgm_sill: model.sill(),
            vgm_nugget: model.nugget(),
        }
    }
}

/// Summary of a run, without the per-node records.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input_count: usize,
    pub interpolated_count: usize,
    pub grid_spacing: f64,
    pub cutoff: f64,
    pub bin_width: f64,
    pub components: BTreeMap<String, ComponentReport>,
}

impl RunSummary {
    pub fn new(output: &SuiteOutput) -> Self {
        Self {
            input_count: output.input_count,
            interpolated_count: output.interpolated_count(),
            grid_spacing: output.grid_spacing,
            cutoff: output.cutoff,
            bin_width: output.bin_width,
            components: output.components.clone(),
        }
    }
}

/// Build one record per mesh node, in mesh order.
pub fn export_records(output: &SuiteOutput) -> Vec<ExportRecord> {
    let mesh = &output.mesh;
    let points = mesh.points();
    let column = |name: &str| points.column(name).ok();

    let topo = column("topo");
    let u = column("u");
    let v = column("v");
    let u_rkt = column("u_rkt");
    let v_rkt = column("v_rkt");
    let var_u = column("kriging_var_u");
    let var_v = column("kriging_var_v");
    let nearest = column("nearest_distance");
    let used = column("neighbors_used");

    let meta_u = ComponentMeta::from_report(output.components.get("u"));
    let meta_v = ComponentMeta::from_report(output.components.get("v"));
    let input_count = output.input_count;
    let interpolated_count = output.interpolated_count();

    let at = |col: Option<&[f64]>, i: usize| col.map(|c| c[i]);

    (0..mesh.len())
        .map(|i| {
            let (x, y) = points.coord(i);
            let (ui, vi) = (at(u, i), at(v, i));
            let (wind_speed, wind_dir) = match (ui, vi) {
                (Some(a), Some(b)) => {
                    let (s, d) = speed_direction(a, b);
                    (Some(s), Some(d))
                }
                _ => (None, None),
            };
            let nearest_distance = at(nearest, i).unwrap_or(f64::NAN);

            ExportRecord {
                node_id: points.node_id(i).to_string(),
                x,
                y,
                x_local: mesh.x_local()[i],
                y_local: mesh.y_local()[i],
                is_orig: mesh.is_orig()[i],
                topo: at(topo, i),
                u: ui,
                v: vi,
                u_rkt: at(u_rkt, i),
                v_rkt: at(v_rkt, i),
                wind_speed,
                wind_dir,
                kriging_var_u: at(var_u, i),
                kriging_var_v: at(var_v, i),
                nearest_distance,
                nearest_distance_km: nearest_distance / 1000.0,
                neighbors_used: at(used, i).map_or(0, |n| n as usize),
                interpolation_source: mesh.sources()[i].as_str(),
                input_count,
                interpolated_count,

                cv_model_u: meta_u.cv_model,
                cv_rsr_u: meta_u.cv_rsr,
                cv_bias_u: meta_u.cv_bias,
                test_model_u: meta_u.test_model,
                test_rsr_u: meta_u.test_rsr,
                test_bias_u: meta_u.test_bias,
                vgm_model_u: meta_u.vgm_model,
                vgm_range_u: meta_u.vgm_range,
                vgm_sill_u: meta_u.vgm_sill,
                vgm_nugget_u: meta_u.vgm_nugget,

                cv_model_v: meta_v.cv_model,
                cv_rsr_v: meta_v.cv_rsr,
                cv_bias_v: meta_v.cv_bias,
                test_model_v: meta_v.test_model,
                test_rsr_v: meta_v.test_rsr,
                test_bias_v: meta_v.test_bias,
                vgm_model_v: meta_v.vgm_model,
                vgm_range_v: meta_v.vgm_range,
                vgm_sill_v: meta_v.vgm_sill,
                vgm_nugget_v: meta_v.vgm_nugget,
            }
        })
        .collect()
}
