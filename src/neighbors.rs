//! K-nearest-neighbor candidate lists.
//!
//! For every point the builder ranks all other points by distance and keeps
//! the `k` closest, nearest first. Local search consumers (2-opt, 3-opt) use
//! these lists to restrict the edges they try.
//!
//! The builder knows nothing about TTP instances. It works on any slice of
//! coordinates and any [`DistanceMetric`].

use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::geometry::Euclidean;
use crate::traits::{DistanceMetric, Point};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeighborError {
    /// `k > 0` was requested but fewer than two points exist.
    InvalidArgument { points: usize, k: usize },
}

impl fmt::Display for NeighborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeighborError::InvalidArgument { points, k } => write!(
                f,
                "cannot select {} neighbors from {} point(s)",
                k, points
            ),
        }
    }
}

impl std::error::Error for NeighborError {}

/// Read-only candidate lists, one per point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborList {
    k: usize,
    lists: Vec<Vec<usize>>,
}

impl NeighborList {
    /// The `k` the lists were built with.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of points covered.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Nearest-first candidates of `point`, or `None` if out of range.
    pub fn get(&self, point: usize) -> Option<&[usize]> {
        self.lists.get(point).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.lists.iter().map(Vec::as_slice)
    }

    /// Whether `b` is a candidate of `a` (not necessarily the reverse).
    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.get(a).is_some_and(|list| list.contains(&b))
    }
}

impl Index<usize> for NeighborList {
    type Output = [usize];

    fn index(&self, point: usize) -> &[usize] {
        &self.lists[point]
    }
}

/// Build Euclidean candidate lists sequentially.
pub fn build_neighbors(points: &[Point], k: usize) -> Result<NeighborList, NeighborError> {
    build_neighbors_with(points, k, &Euclidean)
}

/// Build Euclidean candidate lists, splitting the outer loop across the rayon pool.
///
/// Produces exactly the same lists as [`build_neighbors`].
pub fn build_neighbors_par(points: &[Point], k: usize) -> Result<NeighborList, NeighborError> {
    build_neighbors_par_with(points, k, &Euclidean)
}

pub fn build_neighbors_with<M: DistanceMetric>(
    points: &[Point],
    k: usize,
    metric: &M,
) -> Result<NeighborList, NeighborError> {
    check_arguments(points.len(), k)?;
    debug!(points = points.len(), k, parallel = false, "building neighbor lists");

    let lists = (0..points.len())
        .map(|i| nearest_of(points, i, k, metric))
        .collect();

    Ok(NeighborList { k, lists })
}

pub fn build_neighbors_par_with<M: DistanceMetric>(
    points: &[Point],
    k: usize,
    metric: &M,
) -> Result<NeighborList, NeighborError> {
    check_arguments(points.len(), k)?;
    debug!(points = points.len(), k, parallel = true, "building neighbor lists");

    let lists = (0..points.len())
        .into_par_iter()
        .map(|i| nearest_of(points, i, k, metric))
        .collect();

    Ok(NeighborList { k, lists })
}

fn check_arguments(n: usize, k: usize) -> Result<(), NeighborError> {
    if k > 0 && n <= 1 {
        return Err(NeighborError::InvalidArgument { points: n, k });
    }
    Ok(())
}

/// The `k` closest other points to `points[i]`, ties broken by lower index.
fn nearest_of<M: DistanceMetric>(points: &[Point], i: usize, k: usize, metric: &M) -> Vec<usize> {
    let take = k.min(points.len().saturating_sub(1));
    if take == 0 {
        return Vec::new();
    }

    let origin = points[i];
    let mut ranked: Vec<(f64, usize)> = points
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(j, &p)| (metric.distance(origin, p), j))
        .collect();

    // Partial selection first, then order only the kept prefix.
    if take < ranked.len() {
        ranked.select_nth_unstable_by(take - 1, compare_candidates);
        ranked.truncate(take);
    }
    ranked.sort_unstable_by(compare_candidates);

    ranked.into_iter().map(|(_, j)| j).collect()
}

fn compare_candidates(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}
