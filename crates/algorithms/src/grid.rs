//! Grid densification
//!
//! Expands the native sampling lattice into a finer mesh at an integer
//! refinement factor. Work happens in a local frame whose origin is the
//! south-west corner of the native lattice, so ticks span
//! `[0, max(native_local_ticks)]`.
//!
//! Each axis is the regular sequence at `grid_spacing` merged with the
//! native ticks, so every native node is present in the mesh even when the
//! x and y spacings differ or are not multiples of each other.

use std::collections::HashMap;
use std::ops::Range;

use tracing::debug;
use windmesh_core::{Error, Mesh, PointSet, Result};

/// Output of [`densify`].
#[derive(Debug, Clone)]
pub struct Densified {
    /// Full mesh: lattice nodes (row-major, y outer) then merged extra points
    pub mesh: Mesh,
    /// Mesh indices that need a prediction: every non-original node,
    /// including the merged extra points
    pub query_indices: Vec<usize>,
    /// Mesh indices of the merged extra points, after every lattice node
    pub extra_indices: Range<usize>,
    pub grid_spacing: f64,
}

impl Densified {
    /// The nodes at `query_indices` as a standalone point set.
    pub fn query_points(&self) -> Result<PointSet> {
        self.mesh.points().subset(&self.query_indices)
    }
}

/// Sorted unique x and y coordinates of a point set.
///
/// # Errors
/// `InsufficientData` for an empty point set.
pub fn native_ticks(points: &PointSet) -> Result<(Vec<f64>, Vec<f64>)> {
    if points.is_empty() {
        return Err(Error::InsufficientData {
            what: "native lattice points",
            count: 0,
        });
    }
    Ok((unique_sorted(points.x()), unique_sorted(points.y())))
}

/// Minimum positive difference between consecutive sorted ticks.
pub fn native_spacing(ticks: &[f64]) -> Option<f64> {
    ticks
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .min_by(f64::total_cmp)
}

fn unique_sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v.dedup();
    v
}

/// One tick of a densified axis.
#[derive(Debug, Clone, Copy)]
struct Tick {
    local: f64,
    /// Index into the native ticks when this tick lies on one
    native: Option<usize>,
}

/// Regular ticks at `spacing` over `[0, max]` merged with the native ticks.
fn axis_ticks(native_local: &[f64], spacing: f64) -> Vec<Tick> {
    let tol = spacing * 1e-6;
    let max = native_local.last().copied().unwrap_or(0.0);
    let n_regular = (max / spacing + 1e-6).floor() as usize;

    let mut ticks: Vec<Tick> = (0..=n_regular)
        .map(|k| Tick {
            local: k as f64 * spacing,
            native: None,
        })
        .chain(native_local.iter().enumerate().map(|(i, &t)| Tick {
            local: t,
            native: Some(i),
        }))
        .collect();
    ticks.sort_by(|a, b| a.local.total_cmp(&b.local));

    let mut merged: Vec<Tick> = Vec::with_capacity(ticks.len());
    for t in ticks {
        match merged.last_mut() {
            Some(prev) if (t.local - prev.local).abs() <= tol => {
                // native coordinate wins so original nodes keep exact positions
                if t.native.is_some() {
                    *prev = t;
                }
            }
            _ => merged.push(t),
        }
    }
    merged
}

/// Locate `v` in sorted `ticks` within `tol`.
fn find_tick(ticks: &[f64], v: f64, tol: f64) -> Option<usize> {
    let i = ticks.partition_point(|&t| t < v - tol);
    (i < ticks.len() && (ticks[i] - v).abs() <= tol).then_some(i)
}

/// Densify the native lattice of `data_points`.
///
/// `grid_spacing = min(native_x_spacing, native_y_spacing) / refinement_factor`.
/// A node is original when both its ticks are native ticks and the data has
/// an observation there; original nodes carry the data's identifiers and
/// attribute values, every other node starts as `NaN`. `extra_query_points`
/// are appended after the lattice with their own identifiers and are never
/// original.
///
/// # Errors
/// - `InvalidArgument` if `refinement_factor < 1`, the ticks are empty, or a
///   data point does not lie on the native lattice (or two share a node)
/// - `InsufficientData` if neither axis has two distinct ticks
pub fn densify(
    data_points: &PointSet,
    native_x_ticks: &[f64],
    native_y_ticks: &[f64],
    refinement_factor: usize,
    extra_query_points: Option<&PointSet>,
) -> Result<Densified> {
    if refinement_factor < 1 {
        return Err(Error::invalid(
            "refinement_factor",
            refinement_factor,
            "must be at least 1",
        ));
    }
    if native_x_ticks.is_empty() || native_y_ticks.is_empty() {
        return Err(Error::invalid(
            "native_ticks",
            format!("{} x, {} y", native_x_ticks.len(), native_y_ticks.len()),
            "both axes need at least one tick",
        ));
    }

    let xs = unique_sorted(native_x_ticks);
    let ys = unique_sorted(native_y_ticks);
    let native = match (native_spacing(&xs), native_spacing(&ys)) {
        (Some(dx), Some(dy)) => dx.min(dy),
        (Some(d), None) | (None, Some(d)) => d,
        (None, None) => {
            return Err(Error::InsufficientData {
                what: "distinct native ticks",
                count: 1,
            });
        }
    };
    let grid_spacing = native / refinement_factor as f64;
    let origin = (xs[0], ys[0]);
    let tol = native * 1e-6;

    let x_local: Vec<f64> = xs.iter().map(|x| x - origin.0).collect();
    let y_local: Vec<f64> = ys.iter().map(|y| y - origin.1).collect();
    let x_axis = axis_ticks(&x_local, grid_spacing);
    let y_axis = axis_ticks(&y_local, grid_spacing);

    // native (ix, iy) -> data row
    let mut observed: HashMap<(usize, usize), usize> = HashMap::with_capacity(data_points.len());
    for (i, (x, y)) in data_points.coords().enumerate() {
        let (Some(ix), Some(iy)) = (find_tick(&xs, x, tol), find_tick(&ys, y, tol)) else {
            return Err(Error::invalid(
                "data_points",
                format!("({x}, {y})"),
                format!("node `{}` is not on the native lattice", data_points.node_id(i)),
            ));
        };
        if let Some(prev) = observed.insert((ix, iy), i) {
            return Err(Error::invalid(
                "data_points",
                format!("({x}, {y})"),
                format!(
                    "nodes `{}` and `{}` share a lattice position",
                    data_points.node_id(prev),
                    data_points.node_id(i)
                ),
            ));
        }
    }

    let extra_len = extra_query_points.map_or(0, PointSet::len);
    let lattice_len = x_axis.len() * y_axis.len();
    let capacity = lattice_len + extra_len;
    let mut ids = Vec::with_capacity(capacity);
    let mut abs_x = Vec::with_capacity(capacity);
    let mut abs_y = Vec::with_capacity(capacity);
    let mut loc_x = Vec::with_capacity(capacity);
    let mut loc_y = Vec::with_capacity(capacity);
    let mut is_orig = Vec::with_capacity(capacity);
    let mut source_row: Vec<Option<usize>> = Vec::with_capacity(capacity);

    for (iy, ty) in y_axis.iter().enumerate() {
        for (ix, tx) in x_axis.iter().enumerate() {
            let row = match (tx.native, ty.native) {
                (Some(nx), Some(ny)) => observed.get(&(nx, ny)).copied(),
                _ => None,
            };
            ids.push(match row {
                Some(r) => data_points.node_id(r).to_string(),
                None => format!("mesh_{ix}_{iy}"),
            });
            abs_x.push(origin.0 + tx.local);
            abs_y.push(origin.1 + ty.local);
            loc_x.push(tx.local);
            loc_y.push(ty.local);
            is_orig.push(row.is_some());
            source_row.push(row);
        }
    }

    if let Some(extra) = extra_query_points {
        for (i, (x, y)) in extra.coords().enumerate() {
            ids.push(extra.node_id(i).to_string());
            abs_x.push(x);
            abs_y.push(y);
            loc_x.push(x - origin.0);
            loc_y.push(y - origin.1);
            is_orig.push(false);
            source_row.push(None);
        }
    }

    let mut points = PointSet::new(ids, abs_x, abs_y)?;
    for name in data_points.column_names() {
        let column = data_points.column(name)?;
        let values = source_row
            .iter()
            .map(|r| r.map_or(f64::NAN, |r| column[r]))
            .collect();
        points.add_column(name, values)?;
    }

    let mesh = Mesh::new(points, loc_x, loc_y, is_orig, grid_spacing, origin)?;
    let query_indices = mesh.non_original_indices();
    debug!(
        nodes = mesh.len(),
        original = mesh.original_indices().len(),
        queries = query_indices.len(),
        grid_spacing,
        "mesh densified"
    );

    Ok(Densified {
        mesh,
        query_indices,
        extra_indices: lattice_len..lattice_len + extra_len,
        grid_spacing,
    })
}
