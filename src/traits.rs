//! Core traits shared by the evaluator and the neighbor index.
//!
//! These are intentionally minimal. The neighbor builder only needs a way to
//! measure two points, so anything that can do that can drive it.

/// A 2D coordinate `(x, y)`.
pub type Point = (f64, f64);

/// Measures the distance between two points.
///
/// Implementations must be symmetric and non-negative for the neighbor
/// index to be meaningful.
pub trait DistanceMetric: Sync {
    fn distance(&self, from: Point, to: Point) -> f64;
}

impl<F> DistanceMetric for F
where
    F: Fn(Point, Point) -> f64 + Sync,
{
    fn distance(&self, from: Point, to: Point) -> f64 {
        self(from, to)
    }
}
