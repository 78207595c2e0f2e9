//! Columnar point set

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// An ordered collection of planar points with named scalar attributes.
///
/// Coordinates are fixed at construction. Attribute columns are append-only:
/// a column can be added once and is never removed. All points share one
/// distance-preserving planar frame (metres).
///
/// # Example
///
/// ```
/// use windmesh_core::PointSet;
///
/// let pts = PointSet::new(
///     vec!["a".into(), "b".into()],
///     vec![0.0, 300.0],
///     vec![0.0, 0.0],
/// )?
/// .with_column("u", vec![4.5, 5.1])?;
///
/// assert_eq!(pts.column("u")?, &[4.5, 5.1]);
/// # Ok::<(), windmesh_core::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    node_ids: Vec<String>,
    x: Vec<f64>,
    y: Vec<f64>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl PointSet {
    /// Create a point set from identifiers and coordinates.
    ///
    /// Fails if the three sequences differ in length or a coordinate is not finite.
    pub fn new(node_ids: Vec<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if node_ids.len() != x.len() || x.len() != y.len() {
            return Err(Error::invalid(
                "coordinates",
                format!("{} ids, {} x, {} y", node_ids.len(), x.len(), y.len()),
                "ids and coordinate sequences must have equal length",
            ));
        }
        if let Some(i) = (0..x.len()).find(|&i| !x[i].is_finite() || !y[i].is_finite()) {
            return Err(Error::invalid(
                "coordinates",
                format!("({}, {})", x[i], y[i]),
                format!("non-finite coordinate for node `{}`", node_ids[i]),
            ));
        }
        Ok(Self {
            node_ids,
            x,
            y,
            columns: BTreeMap::new(),
        })
    }

    /// Create a point set from bare coordinates, numbering nodes `0..n`.
    pub fn from_coords(coords: &[(f64, f64)]) -> Result<Self> {
        let ids = (0..coords.len()).map(|i| i.to_string()).collect();
        let (x, y) = coords.iter().copied().unzip();
        Self::new(ids, x, y)
    }

    /// Builder form of [`add_column`](Self::add_column).
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.add_column(name, values)?;
        Ok(self)
    }

    /// Attach a new attribute column.
    ///
    /// Fails if the length does not match or the column already exists.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(Error::invalid(
                "column",
                &name,
                format!("expected {} values, got {}", self.len(), values.len()),
            ));
        }
        if self.columns.contains_key(&name) {
            return Err(Error::invalid("column", &name, "column already exists"));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Borrow an attribute column by name.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::invalid("field", name, "no such column in point set"))
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Result<&mut Vec<f64>> {
        self.columns
            .get_mut(name)
            .ok_or_else(|| Error::invalid("field", name, "no such column in point set"))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn node_ids(&self) -> &[String] {
        &self.node_ids
    }

    pub fn node_id(&self, i: usize) -> &str {
        &self.node_ids[i]
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Coordinates of point `i`.
    #[inline]
    pub fn coord(&self, i: usize) -> (f64, f64) {
        (self.x[i], self.y[i])
    }

    /// Iterate over all coordinates in order.
    pub fn coords(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Index of the first point with the given identifier.
    pub fn position(&self, node_id: &str) -> Option<usize> {
        self.node_ids.iter().position(|id| id == node_id)
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`, `None` when empty.
    pub fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let fold = |v: &[f64]| {
            v.iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &a| (lo.min(a), hi.max(a)))
        };
        let (min_x, max_x) = fold(self.x.as_slice());
        let (min_y, max_y) = fold(self.y.as_slice());
        Some((min_x, min_y, max_x, max_y))
    }

    /// New point set holding the given rows (in the given order) with all columns.
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(Error::invalid(
                "index",
                bad,
                format!("out of bounds for point set of {} points", self.len()),
            ));
        }
        let pick = |v: &[f64]| indices.iter().map(|&i| v[i]).collect::<Vec<_>>();
        Ok(Self {
            node_ids: indices.iter().map(|&i| self.node_ids[i].clone()).collect(),
            x: pick(self.x.as_slice()),
            y: pick(self.y.as_slice()),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), pick(v.as_slice())))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> PointSet {
        PointSet::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![0.0, 1.0, 2.0],
            vec![5.0, 6.0, 7.0],
        )
        .unwrap()
        .with_column("u", vec![1.0, 2.0, 3.0])
        .unwrap()
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let r = PointSet::new(vec!["a".into()], vec![0.0, 1.0], vec![0.0]);
        assert!(matches!(r, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let r = PointSet::new(vec!["a".into()], vec![f64::NAN], vec![0.0]);
        assert!(r.is_err());
    }

    #[test]
    fn test_columns_are_append_only() {
        let mut pts = three();
        assert!(pts.add_column("u", vec![0.0; 3]).is_err());
        assert!(pts.add_column("v", vec![0.0; 2]).is_err());
        pts.add_column("v", vec![9.0; 3]).unwrap();
        let names: Vec<&str> = pts.column_names().collect();
        assert_eq!(names, vec!["u", "v"]);
    }

    #[test]
    fn test_missing_column_is_invalid_argument() {
        let pts = three();
        assert!(matches!(pts.column("w"), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_subset_keeps_order_and_columns() {
        let pts = three();
        let sub = pts.subset(&[2, 0]).unwrap();
        assert_eq!(sub.node_ids(), &["c".to_string(), "a".to_string()]);
        assert_eq!(sub.column("u").unwrap(), &[3.0, 1.0]);
        assert_eq!(sub.coord(0), (2.0, 7.0));
        assert!(pts.subset(&[3]).is_err());
    }

    #[test]
    fn test_extent_and_position() {
        let pts = three();
        assert_eq!(pts.extent(), Some((0.0, 5.0, 2.0, 7.0)));
        assert_eq!(pts.position("b"), Some(1));
        assert_eq!(pts.position("z"), None);
        assert!(PointSet::default().extent().is_none());
    }
}
