//! Evaluated solutions and the two-objective dominance relation.

use serde::{Deserialize, Serialize};

/// Visiting order of all cities, starting at the start city.
pub type Tour = Vec<usize>;

/// One flag per item: `true` if the thief picks it up.
pub type PackingPlan = Vec<bool>;

/// Outcome of comparing two objective vectors where lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    FirstDominates,
    SecondDominates,
    /// Equal, or each is better somewhere.
    Incomparable,
}

/// Pareto dominance between two minimized objective vectors.
///
/// `a` dominates `b` when it is no worse in every component and strictly
/// better in at least one. Components are compared pairwise up to the
/// shorter length.
pub fn dominance(a: &[f64], b: &[f64]) -> Relation {
    let mut relation = Relation::Incomparable;
    for (x, y) in a.iter().zip(b) {
        if x < y {
            if relation == Relation::SecondDominates {
                return Relation::Incomparable;
            }
            relation = Relation::FirstDominates;
        } else if x > y {
            if relation == Relation::FirstDominates {
                return Relation::Incomparable;
            }
            relation = Relation::SecondDominates;
        }
    }
    relation
}

/// A tour and packing plan together with the objectives they produce.
///
/// Only the evaluator builds these, so the objectives always match the
/// design vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub(crate) tour: Tour,
    pub(crate) packing_plan: PackingPlan,
    pub(crate) time: f64,
    pub(crate) profit: f64,
    pub(crate) single_objective: f64,
    pub(crate) objectives: [f64; 2],
    pub(crate) overflowed: bool,
}

impl Solution {
    pub fn tour(&self) -> &[usize] {
        &self.tour
    }

    pub fn packing_plan(&self) -> &[bool] {
        &self.packing_plan
    }

    /// Total travel time, `+inf` when the knapsack overflowed.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Collected profit, `-inf` when the knapsack overflowed.
    pub fn profit(&self) -> f64 {
        self.profit
    }

    /// `profit - R * time`.
    pub fn single_objective(&self) -> f64 {
        self.single_objective
    }

    /// `(time, -profit)`, both minimized.
    pub fn objectives(&self) -> &[f64; 2] {
        &self.objectives
    }

    /// The carried weight never exceeded the knapsack capacity.
    ///
    /// A feasible journey can still take infinite time when the minimum
    /// speed is zero and the knapsack is exactly full.
    pub fn is_feasible(&self) -> bool {
        !self.overflowed
    }

    pub fn relation(&self, other: &Solution) -> Relation {
        dominance(&self.objectives, &other.objectives)
    }

    pub fn dominates(&self, other: &Solution) -> bool {
        self.relation(other) == Relation::FirstDominates
    }

    /// Same tour and same packing plan, regardless of objectives.
    pub fn equals_in_design_space(&self, other: &Solution) -> bool {
        self.tour == other.tour && self.packing_plan == other.packing_plan
    }

    pub fn into_parts(self) -> (Tour, PackingPlan) {
        (self.tour, self.packing_plan)
    }
}
