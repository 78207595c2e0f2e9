//! Densified interpolation mesh

use serde::{Deserialize, Serialize};

use super::PointSet;
use crate::error::{Error, Result};

/// Provenance of a mesh node's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationSource {
    /// Coincides with a native sample; carries the observed value.
    Original,
    /// Created by refinement and filled by prediction.
    Interpolated,
    /// A user-supplied validation point merged into the mesh.
    TestPoint,
}

impl InterpolationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            InterpolationSource::Original => "original",
            InterpolationSource::Interpolated => "interpolated",
            InterpolationSource::TestPoint => "test_point",
        }
    }
}

impl std::fmt::Display for InterpolationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mesh of nodes stored as one contiguous arena.
///
/// Nodes are addressed by integer index everywhere. Nodes flagged `is_orig`
/// hold observed data and are never overwritten by
/// [`write_predictions`](Self::write_predictions).
#[derive(Debug, Clone)]
pub struct Mesh {
    points: PointSet,
    x_local: Vec<f64>,
    y_local: Vec<f64>,
    is_orig: Vec<bool>,
    source: Vec<InterpolationSource>,
    original: Vec<usize>,
    spacing: f64,
    origin: (f64, f64),
}

impl Mesh {
    /// Assemble a mesh from its nodes.
    ///
    /// `x_local`/`y_local` are offsets from `origin`; `is_orig` marks nodes on
    /// the native lattice. Provenance starts as `original` / `interpolated`.
    pub fn new(
        points: PointSet,
        x_local: Vec<f64>,
        y_local: Vec<f64>,
        is_orig: Vec<bool>,
        spacing: f64,
        origin: (f64, f64),
    ) -> Result<Self> {
        let n = points.len();
        if x_local.len() != n || y_local.len() != n || is_orig.len() != n {
            return Err(Error::invalid(
                "mesh",
                n,
                "local coordinates and flags must match node count",
            ));
        }
        if !(spacing > 0.0 && spacing.is_finite()) {
            return Err(Error::invalid("spacing", spacing, "must be positive and finite"));
        }
        let source = is_orig
            .iter()
            .map(|&o| {
                if o {
                    InterpolationSource::Original
                } else {
                    InterpolationSource::Interpolated
                }
            })
            .collect();
        let original = (0..n).filter(|&i| is_orig[i]).collect();
        Ok(Self {
            points,
            x_local,
            y_local,
            is_orig,
            source,
            original,
            spacing,
            origin,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Node coordinates, identifiers and attribute columns.
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Absolute coordinates of local `(0, 0)`.
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    pub fn x_local(&self) -> &[f64] {
        &self.x_local
    }

    pub fn y_local(&self) -> &[f64] {
        &self.y_local
    }

    pub fn is_orig(&self) -> &[bool] {
        &self.is_orig
    }

    pub fn sources(&self) -> &[InterpolationSource] {
        &self.source
    }

    /// Indices of nodes on the native lattice, ascending.
    pub fn original_indices(&self) -> &[usize] {
        &self.original
    }

    /// Indices of nodes that need a prediction, ascending.
    pub fn non_original_indices(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| !self.is_orig[i]).collect()
    }

    /// Attach a column covering every node (diagnostics, seeded observations).
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        self.points.add_column(name, values)
    }

    /// Create `name` as a copy of the existing column `from`.
    pub fn derive_column(&mut self, name: impl Into<String>, from: &str) -> Result<()> {
        let values = self.points.column(from)?.to_vec();
        self.points.add_column(name, values)
    }

    /// Write predicted values into non-original nodes.
    ///
    /// The column is created (NaN-filled) if missing. Indices that refer to
    /// original nodes are skipped, so observed data is never replaced.
    /// Returns the number of slots written.
    pub fn write_predictions(
        &mut self,
        name: &str,
        indices: &[usize],
        values: &[f64],
    ) -> Result<usize> {
        if indices.len() != values.len() {
            return Err(Error::invalid(
                "values",
                values.len(),
                format!("expected {} values for `{name}`", indices.len()),
            ));
        }
        let n = self.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(Error::invalid("index", bad, format!("mesh has {n} nodes")));
        }
        if !self.points.has_column(name) {
            self.points.add_column(name, vec![f64::NAN; n])?;
        }

        let column = self.points.column_mut(name)?;
        let mut written = 0;
        for (&i, &v) in indices.iter().zip(values) {
            if self.original.binary_search(&i).is_ok() {
                continue;
            }
            column[i] = v;
            written += 1;
        }
        Ok(written)
    }

    /// Tag the non-original nodes at `indices` as test points.
    ///
    /// Out-of-range and original indices are skipped. Returns the number of
    /// nodes tagged.
    pub fn mark_test_points(&mut self, indices: impl IntoIterator<Item = usize>) -> usize {
        let mut tagged = 0;
        for i in indices {
            if i < self.len() && !self.is_orig[i] {
                self.source[i] = InterpolationSource::TestPoint;
                tagged += 1;
            }
        }
        tagged
    }

    /// Number of nodes filled by interpolation (not on the native lattice).
    pub fn interpolated_count(&self) -> usize {
        self.len() - self.original.len()
    }
}
