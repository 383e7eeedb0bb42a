//! End-to-end evaluator tests
//!
//! Problems are loaded from rendered descriptions, so these exercise the
//! loader and the evaluator together.

mod fixtures;

use thief_eval::evaluator::{evaluate, EvaluationError};
use thief_eval::packing::greedy_pack_by_ratio;
use thief_eval::problem::LoadError;
use thief_eval::solution::Relation;

// ============================================================================
// Reference Scenario
// ============================================================================

#[test]
fn test_square_scenario() {
    let problem = fixtures::square().problem();
    let solution = problem.evaluate(vec![0, 1, 2, 3], vec![true]).unwrap();

    // ceil(3) + ceil(4) + ceil(3) + ceil(4) at constant speed 1
    assert_eq!(solution.time(), 14.0);
    assert_eq!(solution.profit(), 10.0);
    assert_eq!(solution.single_objective(), -4.0);
    assert_eq!(solution.objectives(), &[14.0, -10.0]);
    assert!(solution.is_feasible());
}

#[test]
fn test_square_reverse_direction_same_length() {
    let problem = fixtures::square().problem();
    let solution = problem.evaluate(vec![0, 3, 2, 1], vec![false]).unwrap();
    assert_eq!(solution.time(), 14.0);
    assert_eq!(solution.profit(), 0.0);
}

#[test]
fn test_square_without_capacity_fails_to_load() {
    let err = fixtures::square()
        .without_capacity()
        .render()
        .parse::<thief_eval::Problem>()
        .unwrap_err();
    assert!(matches!(err, LoadError::MissingField("CAPACITY OF KNAPSACK")));
}

#[test]
fn test_non_ceil_edge_weight_fails_to_load() {
    let err = fixtures::square()
        .edge_weight("GEO")
        .render()
        .parse::<thief_eval::Problem>()
        .unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedEdgeWeight(_)));
}

// ============================================================================
// Speed And Capacity
// ============================================================================

#[test]
fn test_empty_knapsack_travels_at_max_speed() {
    let problem = fixtures::grid(4).problem();
    let tour: Vec<usize> = (0..problem.num_cities()).collect();
    let solution = problem
        .evaluate(tour.clone(), vec![false; problem.num_items()])
        .unwrap();

    let mut expected = 0.0;
    for i in 0..tour.len() {
        expected += problem.distance(tour[i], tour[(i + 1) % tour.len()]) / problem.max_speed();
    }
    assert_eq!(solution.time(), expected);
    assert_eq!(solution.profit(), 0.0);
}

#[test]
fn test_heavier_knapsack_is_slower() {
    let problem = fixtures::grid(3).problem();
    let tour: Vec<usize> = (0..problem.num_cities()).collect();

    let mut light = vec![false; problem.num_items()];
    light[0] = true;
    let mut heavy = light.clone();
    heavy[1] = true;

    let light = problem.evaluate(tour.clone(), light).unwrap();
    let heavy = problem.evaluate(tour, heavy).unwrap();
    assert!(heavy.time() > light.time());
    assert!(heavy.profit() > light.profit());
}

#[test]
fn test_overflow_short_circuits_regardless_of_items() {
    let problem = fixtures::grid(4).problem();
    let tour: Vec<usize> = (0..problem.num_cities()).collect();
    let everything = problem
        .evaluate(tour.clone(), vec![true; problem.num_items()])
        .unwrap();
    assert_eq!(everything.time(), f64::INFINITY);
    assert_eq!(everything.profit(), f64::NEG_INFINITY);

    // Overflowing only at the very last city is still infeasible.
    let mut late = vec![false; problem.num_items()];
    let last_city = *tour.last().unwrap();
    for &item in problem.items_at_city(last_city) {
        late[item] = true;
    }
    let mut carried: f64 = problem.items_at_city(last_city).iter().map(|&i| problem.items()[i].weight).sum();
    for &city in tour.iter().rev().skip(1) {
        if carried > problem.capacity() {
            break;
        }
        for &item in problem.items_at_city(city) {
            late[item] = true;
            carried += problem.items()[item].weight;
        }
    }
    assert!(carried > problem.capacity());
    let late = problem.evaluate(tour, late).unwrap();
    assert!(!late.is_feasible());
}

#[test]
fn test_full_knapsack_at_zero_min_speed_is_feasible() {
    let problem = fixtures::square().speeds(0.0, 1.0).capacity(2).problem();
    let solution = problem.evaluate(vec![0, 1, 2, 3], vec![true]).unwrap();

    // Speed drops to 0 after city 1, but capacity is never exceeded.
    assert_eq!(solution.time(), f64::INFINITY);
    assert_eq!(solution.profit(), 10.0);
    assert!(solution.is_feasible());

    let overflowing = fixtures::square().capacity(1).problem();
    assert!(!overflowing.evaluate(vec![0, 1, 2, 3], vec![true]).unwrap().is_feasible());
}

// ============================================================================
// Preconditions
// ============================================================================

#[test]
fn test_shape_and_start_city_checked() {
    let problem = fixtures::square().problem();
    assert!(matches!(
        evaluate(&problem, vec![0, 1, 2], vec![true]),
        Err(EvaluationError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        evaluate(&problem, vec![0, 1, 2, 3], vec![]),
        Err(EvaluationError::ShapeMismatch { .. })
    ));
    assert_eq!(
        evaluate(&problem, vec![2, 1, 0, 3], vec![true]).unwrap_err(),
        EvaluationError::StartCityViolation { expected: 0, found: 2 }
    );
}

// ============================================================================
// Solutions
// ============================================================================

#[test]
fn test_evaluation_is_deterministic() {
    let problem = fixtures::grid(5).problem();
    let tour: Vec<usize> = (0..problem.num_cities()).collect();
    let plan = greedy_pack_by_ratio(&problem, &tour);

    let first = problem.evaluate(tour.clone(), plan.clone()).unwrap();
    let second = problem.evaluate(tour, plan).unwrap();
    assert_eq!(first.time().to_bits(), second.time().to_bits());
    assert_eq!(first.profit().to_bits(), second.profit().to_bits());
    assert_eq!(first.single_objective().to_bits(), second.single_objective().to_bits());
    assert!(first.equals_in_design_space(&second));
    assert!(problem.verify(&first).is_ok());
}

#[test]
fn test_relations_between_evaluated_solutions() {
    let problem = fixtures::square().problem();
    let take = problem.evaluate(vec![0, 1, 2, 3], vec![true]).unwrap();
    let skip = problem.evaluate(vec![0, 1, 2, 3], vec![false]).unwrap();

    // Speed is constant, so taking the item costs nothing.
    assert_eq!(take.relation(&skip), Relation::FirstDominates);
    assert_eq!(skip.relation(&take), Relation::SecondDominates);
    assert!(take.dominates(&skip));
    assert_eq!(take.relation(&take), Relation::Incomparable);
    assert!(!take.equals_in_design_space(&skip));
}

#[test]
fn test_trade_off_is_incomparable() {
    let problem = fixtures::square().speeds(0.1, 1.0).problem();
    let take = problem.evaluate(vec![0, 1, 2, 3], vec![true]).unwrap();
    let skip = problem.evaluate(vec![0, 1, 2, 3], vec![false]).unwrap();

    assert!(take.time() > skip.time());
    assert_eq!(take.relation(&skip), Relation::Incomparable);
}

#[test]
fn test_greedy_plan_is_feasible_on_any_tour() {
    let problem = fixtures::grid(5).problem();
    let mut tour: Vec<usize> = (0..problem.num_cities()).collect();
    tour[1..].reverse();
    let plan = greedy_pack_by_ratio(&problem, &tour);
    assert!(plan.iter().any(|&picked| picked));
    let solution = problem.evaluate(tour, plan).unwrap();
    assert!(solution.is_feasible());
    assert!(solution.profit() > 0.0);
}
