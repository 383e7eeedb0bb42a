//! Planar distances between city coordinates.

use serde::{Deserialize, Serialize};

use crate::traits::{DistanceMetric, Point};

/// Straight-line distance between two points.
pub fn euclidean(from: Point, to: Point) -> f64 {
    let dx = from.0 - to.0;
    let dy = from.1 - to.1;
    (dx * dx + dy * dy).sqrt()
}

/// Plain Euclidean metric, used for candidate lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl DistanceMetric for Euclidean {
    fn distance(&self, from: Point, to: Point) -> f64 {
        euclidean(from, to)
    }
}

/// Edge weight rounding modes understood by the problem loader.
///
/// Only `CEIL_2D` is supported: travel legs are the Euclidean distance
/// rounded up to the next integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeWeightType {
    #[serde(rename = "CEIL_2D")]
    Ceil2d,
}

impl EdgeWeightType {
    /// Parse the token that follows `EDGE_WEIGHT_TYPE :`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "CEIL_2D" => Some(Self::Ceil2d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ceil2d => "CEIL_2D",
        }
    }
}

impl DistanceMetric for EdgeWeightType {
    fn distance(&self, from: Point, to: Point) -> f64 {
        match self {
            Self::Ceil2d => euclidean(from, to).ceil(),
        }
    }
}
