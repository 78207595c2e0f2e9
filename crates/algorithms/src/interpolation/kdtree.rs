//! 2D k-d tree for spatial indexing
//!
//! Provides O(log n) nearest-neighbour, k-nearest-neighbour and radius
//! queries over a fixed reference set. Used for the mesh diagnostics
//! (distance to and count of nearby observations) and to restrict IDW and
//! kriging to local neighbourhoods.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use windmesh_core::{Error, Result};

use super::SamplePoint;
use crate::maybe_rayon::*;

/// A 2D k-d tree over sample points.
///
/// Indices returned by queries refer to the slice passed to [`KdTree::build`].
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<SamplePoint>,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split dimension: 0 = x, 1 = y
    split_dim: u8,
    left: Option<usize>,
    right: Option<usize>,
}

/// Result of a nearest-neighbour query
#[derive(Debug, Clone, Copy)]
pub struct NearestResult {
    pub point: SamplePoint,
    pub distance_sq: f64,
    pub index: usize,
}

impl NearestResult {
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance_sq.sqrt()
    }
}

/// Candidate in the bounded max-heap used by k-NN search.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance_sq: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq
            .total_cmp(&other.distance_sq)
            .then(self.index.cmp(&other.index))
    }
}

impl KdTree {
    /// Build a k-d tree from sample points.
    ///
    /// Construction is O(n log n) using median selection on alternating axes.
    pub fn build(points: &[SamplePoint]) -> Self {
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        if !points.is_empty() {
            build_recursive(points, &mut indices, 0, &mut nodes);
        }
        Self {
            nodes,
            points: points.to_vec(),
        }
    }

    /// Build a tree over bare coordinates (values are zero).
    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        let pts: Vec<SamplePoint> = coords
            .iter()
            .map(|&(x, y)| SamplePoint::new(x, y, 0.0))
            .collect();
        Self::build(&pts)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find the single nearest point to (qx, qy).
    ///
    /// Returns `None` if the tree is empty.
    pub fn nearest(&self, qx: f64, qy: f64) -> Option<NearestResult> {
        self.k_nearest(qx, qy, 1).into_iter().next()
    }

    /// Find the k nearest points to (qx, qy).
    ///
    /// Returns up to k results sorted by ascending distance.
    /// Complexity: O(k log n) average case.
    pub fn k_nearest(&self, qx: f64, qy: f64, k: usize) -> Vec<NearestResult> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.knn_recursive(0, qx, qy, k, &mut heap);

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| NearestResult {
                point: self.points[c.index],
                distance_sq: c.distance_sq,
                index: c.index,
            })
            .collect()
    }

    /// Find all points within `radius` (inclusive) of (qx, qy).
    ///
    /// Returns results in no particular order.
    pub fn within_radius(&self, qx: f64, qy: f64, radius: f64) -> Vec<NearestResult> {
        let mut results = Vec::new();
        if self.nodes.is_empty() || !(radius >= 0.0) {
            return results;
        }
        self.radius_recursive(0, qx, qy, radius * radius, &mut |idx, dsq| {
            results.push(NearestResult {
                point: self.points[idx],
                distance_sq: dsq,
                index: idx,
            })
        });
        results
    }

    /// Count the points within `radius` (inclusive) of (qx, qy).
    pub fn count_within(&self, qx: f64, qy: f64, radius: f64) -> usize {
        let mut count = 0;
        if self.nodes.is_empty() || !(radius >= 0.0) {
            return count;
        }
        self.radius_recursive(0, qx, qy, radius * radius, &mut |_, _| count += 1);
        count
    }

    fn knn_recursive(
        &self,
        node_idx: usize,
        qx: f64,
        qy: f64,
        k: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        let node = &self.nodes[node_idx];
        let p = &self.points[node.point_idx];

        let dx = qx - p.x;
        let dy = qy - p.y;
        let candidate = Candidate {
            distance_sq: dx * dx + dy * dy,
            index: node.point_idx,
        };

        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }

        let diff = if node.split_dim == 0 { dx } else { dy };
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = near {
            self.knn_recursive(child, qx, qy, k, heap);
        }

        let bound = if heap.len() < k {
            f64::INFINITY
        } else {
            heap.peek().map_or(f64::INFINITY, |c| c.distance_sq)
        };
        if diff * diff <= bound {
            if let Some(child) = far {
                self.knn_recursive(child, qx, qy, k, heap);
            }
        }
    }

    fn radius_recursive(
        &self,
        node_idx: usize,
        qx: f64,
        qy: f64,
        radius_sq: f64,
        visit: &mut impl FnMut(usize, f64),
    ) {
        let node = &self.nodes[node_idx];
        let p = &self.points[node.point_idx];

        let dx = qx - p.x;
        let dy = qy - p.y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq <= radius_sq {
            visit(node.point_idx, dist_sq);
        }

        let diff = if node.split_dim == 0 { dx } else { dy };
        if let Some(left) = node.left {
            if diff > 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(left, qx, qy, radius_sq, visit);
            }
        }
        if let Some(right) = node.right {
            if diff < 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(right, qx, qy, radius_sq, visit);
            }
        }
    }
}

/// Recursively build the tree over `indices`, returning the subtree root.
fn build_recursive(
    points: &[SamplePoint],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let split_dim = (depth % 2) as u8;
    let key = |i: usize| if split_dim == 0 { points[i].x } else { points[i].y };

    let median = indices.len() / 2;
    indices.select_nth_unstable_by(median, |&a, &b| key(a).total_cmp(&key(b)));

    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx: indices[median],
        split_dim,
        left: None,
        right: None,
    });

    let (lower, rest) = indices.split_at_mut(median);
    let upper = &mut rest[1..];
    if !lower.is_empty() {
        let left = build_recursive(points, lower, depth + 1, nodes);
        nodes[node_idx].left = Some(left);
    }
    if !upper.is_empty() {
        let right = build_recursive(points, upper, depth + 1, nodes);
        nodes[node_idx].right = Some(right);
    }

    node_idx
}

/// The k nearest reference points of one query, ascending by distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighbors {
    pub indices: Vec<usize>,
    pub distances: Vec<f64>,
}

/// k-nearest-neighbour search of every query against a reference set.
///
/// Returns `min(k, reference.len())` neighbours per query, sorted by
/// ascending Euclidean distance. Exact ties are broken by reference index.
///
/// # Errors
/// `InvalidArgument` if `k < 1`.
pub fn knn(
    reference: &[(f64, f64)],
    queries: &[(f64, f64)],
    k: usize,
) -> Result<Vec<Neighbors>> {
    if k < 1 {
        return Err(Error::invalid("k", k, "must be at least 1"));
    }
    let tree = KdTree::from_coords(reference);
    Ok((0..queries.len())
        .into_par_iter()
        .map(|q| {
            let (qx, qy) = queries[q];
            let found = tree.k_nearest(qx, qy, k);
            Neighbors {
                indices: found.iter().map(|r| r.index).collect(),
                distances: found.iter().map(NearestResult::distance).collect(),
            }
        })
        .collect())
}
