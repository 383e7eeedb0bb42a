//! thief-eval
//!
//! Deterministic evaluation and verification of Traveling Thief Problem
//! solutions, plus the K-nearest-neighbor candidate lists local search
//! builds on.

pub mod traits;
pub mod geometry;
pub mod neighbors;
pub mod problem;
pub mod solution;
pub mod evaluator;
pub mod packing;
pub mod submission;
pub mod verifier;

pub use evaluator::{evaluate, EvaluationError, START_CITY};
pub use neighbors::{build_neighbors, build_neighbors_par, NeighborList};
pub use problem::{Item, LoadError, Problem, ProblemBuilder};
pub use solution::{dominance, PackingPlan, Relation, Solution, Tour};
