//! The thief's journey simulation.
//!
//! Evaluation is a pure function of the problem, the tour and the packing
//! plan. It walks the tour once, picks up the selected items at every city,
//! slows the thief down linearly with the carried weight, and accumulates
//! travel time over ceil-rounded legs, closing the loop back to the start.

use std::fmt;

use crate::problem::Problem;
use crate::solution::{PackingPlan, Solution, Tour};

/// Every tour has to begin here.
pub const START_CITY: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// Tour or packing plan length does not match the instance.
    ShapeMismatch {
        tour_len: usize,
        plan_len: usize,
        num_cities: usize,
        num_items: usize,
    },
    StartCityViolation { expected: usize, found: usize },
    CityOutOfRange { position: usize, city: usize },
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationError::ShapeMismatch {
                tour_len,
                plan_len,
                num_cities,
                num_items,
            } => write!(
                f,
                "wrong input for traveling thief evaluation: tour has {} cities (expected {}), packing plan has {} items (expected {})",
                tour_len, num_cities, plan_len, num_items
            ),
            EvaluationError::StartCityViolation { expected, found } => {
                write!(f, "thief must start at city {}, tour starts at {}", expected, found)
            }
            EvaluationError::CityOutOfRange { position, city } => {
                write!(f, "tour position {} names city {} which does not exist", position, city)
            }
        }
    }
}

impl std::error::Error for EvaluationError {}

/// Time and profit of a single journey, before packaging into a [`Solution`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Journey {
    pub time: f64,
    pub profit: f64,
    /// Weight carried when the journey ended (or overflowed).
    pub weight: f64,
    /// The knapsack capacity was exceeded and the walk stopped early.
    pub overflowed: bool,
}

impl Journey {
    pub const INFEASIBLE_TIME: f64 = f64::INFINITY;
    pub const INFEASIBLE_PROFIT: f64 = f64::NEG_INFINITY;
}

/// Simulate the journey without taking ownership of the inputs.
pub fn simulate(problem: &Problem, tour: &[usize], plan: &[bool]) -> Result<Journey, EvaluationError> {
    simulate_from(problem, START_CITY, tour, plan)
}

/// Like [`simulate`], but the tour must begin at `start` instead of [`START_CITY`].
pub fn simulate_from(
    problem: &Problem,
    start: usize,
    tour: &[usize],
    plan: &[bool],
) -> Result<Journey, EvaluationError> {
    check_shape(problem, start, tour, plan)?;

    let n = problem.num_cities();
    let capacity = problem.capacity();
    let max_speed = problem.max_speed();
    let speed_drop = max_speed - problem.min_speed();

    let mut time = 0.0;
    let mut profit = 0.0;
    let mut weight = 0.0;

    for (i, &city) in tour.iter().enumerate() {
        for &item in problem.items_at_city(city) {
            if plan[item] {
                let picked = &problem.items()[item];
                weight += picked.weight;
                profit += picked.profit;
            }
        }

        if weight > capacity {
            return Ok(Journey {
                time: Journey::INFEASIBLE_TIME,
                profit: Journey::INFEASIBLE_PROFIT,
                weight,
                overflowed: true,
            });
        }

        let speed = max_speed - (weight / capacity) * speed_drop;
        let next = tour[(i + 1) % n];
        time += problem.distance(city, next) / speed;
    }

    Ok(Journey {
        time,
        profit,
        weight,
        overflowed: false,
    })
}

/// Evaluate a tour and packing plan into a [`Solution`].
pub fn evaluate(problem: &Problem, tour: Tour, plan: PackingPlan) -> Result<Solution, EvaluationError> {
    let journey = simulate(problem, &tour, &plan)?;
    Ok(Solution {
        tour,
        packing_plan: plan,
        time: journey.time,
        profit: journey.profit,
        single_objective: journey.profit - problem.renting_ratio() * journey.time,
        objectives: [journey.time, -journey.profit],
        overflowed: journey.overflowed,
    })
}

fn check_shape(
    problem: &Problem,
    start: usize,
    tour: &[usize],
    plan: &[bool],
) -> Result<(), EvaluationError> {
    if tour.len() != problem.num_cities() || plan.len() != problem.num_items() {
        return Err(EvaluationError::ShapeMismatch {
            tour_len: tour.len(),
            plan_len: plan.len(),
            num_cities: problem.num_cities(),
            num_items: problem.num_items(),
        });
    }
    if tour[0] != start {
        return Err(EvaluationError::StartCityViolation {
            expected: start,
            found: tour[0],
        });
    }
    if let Some((position, &city)) = tour
        .iter()
        .enumerate()
        .find(|&(_, &city)| city >= problem.num_cities())
    {
        return Err(EvaluationError::CityOutOfRange { position, city });
    }
    Ok(())
}

/// The submitted objectives disagree with a fresh evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveMismatch {
    pub reported: (f64, f64),
    pub evaluated: (f64, f64),
}

impl fmt::Display for ObjectiveMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reported time is {}, evaluated {}; reported profit is {}, evaluated {}",
            self.reported.0, self.evaluated.0, self.reported.1, self.evaluated.1
        )
    }
}

impl std::error::Error for ObjectiveMismatch {}

/// Why [`Problem::verify`] rejected a solution.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    Evaluation(EvaluationError),
    Mismatch(ObjectiveMismatch),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Evaluation(err) => err.fmt(f),
            CheckError::Mismatch(err) => write!(f, "pi and z do not match the objectives: {}", err),
        }
    }
}

impl std::error::Error for CheckError {}

impl From<EvaluationError> for CheckError {
    fn from(err: EvaluationError) -> Self {
        CheckError::Evaluation(err)
    }
}

impl Problem {
    /// See [`evaluate`].
    pub fn evaluate(&self, tour: Tour, plan: PackingPlan) -> Result<Solution, EvaluationError> {
        evaluate(self, tour, plan)
    }

    /// Re-evaluate `solution` and require exactly the same time and profit.
    pub fn verify(&self, solution: &Solution) -> Result<(), CheckError> {
        let journey = simulate(self, solution.tour(), solution.packing_plan())?;
        if !same_value(journey.time, solution.time()) || !same_value(journey.profit, solution.profit()) {
            return Err(CheckError::Mismatch(ObjectiveMismatch {
                reported: (solution.time(), solution.profit()),
                evaluated: (journey.time, journey.profit),
            }));
        }
        Ok(())
    }
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}
