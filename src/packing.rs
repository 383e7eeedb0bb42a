//! Baseline packing plan construction.

use tracing::debug;

use crate::problem::Problem;
use crate::solution::PackingPlan;

/// Greedy packing by profit/weight ratio.
///
/// Items at the cities of `tour` are ranked by descending profit per unit of
/// weight (zero-weight items first, ties kept in tour order) and taken while
/// they still fit. The result never exceeds the knapsack capacity, so it
/// always evaluates to a feasible solution.
pub fn greedy_pack_by_ratio(problem: &Problem, tour: &[usize]) -> PackingPlan {
    let mut candidates: Vec<usize> = tour
        .iter()
        .flat_map(|&city| problem.items_at_city(city).iter().copied())
        .collect();

    let ratio = |index: usize| {
        let item = &problem.items()[index];
        if item.weight > 0.0 {
            item.profit / item.weight
        } else {
            f64::INFINITY
        }
    };
    candidates.sort_by(|&a, &b| ratio(b).total_cmp(&ratio(a)));

    let mut plan = vec![false; problem.num_items()];
    let mut weight = 0.0;
    for index in candidates {
        let item_weight = problem.items()[index].weight;
        if weight + item_weight <= problem.capacity() {
            plan[index] = true;
            weight += item_weight;
        }
    }

    debug!(
        picked = plan.iter().filter(|&&picked| picked).count(),
        weight,
        capacity = problem.capacity(),
        "greedy packing plan built"
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Item;

    fn problem() -> Problem {
        Problem::builder()
            .cities(vec![(0.0, 0.0), (0.0, 3.0), (4.0, 3.0), (4.0, 0.0)])
            .items(vec![
                Item { city: 1, weight: 4.0, profit: 8.0 },  // ratio 2
                Item { city: 2, weight: 3.0, profit: 9.0 },  // ratio 3
                Item { city: 3, weight: 5.0, profit: 5.0 },  // ratio 1
                Item { city: 3, weight: 0.0, profit: 1.0 },  // free
            ])
            .speeds(0.1, 1.0)
            .capacity(8.0)
            .renting_ratio(0.5)
            .initialize()
            .unwrap()
    }

    #[test]
    fn test_best_ratios_first() {
        let plan = greedy_pack_by_ratio(&problem(), &[0, 1, 2, 3]);
        assert_eq!(plan, vec![true, true, false, true]);
    }

    #[test]
    fn test_plan_is_feasible() {
        let problem = problem();
        let tour = vec![0, 3, 2, 1];
        let plan = greedy_pack_by_ratio(&problem, &tour);
        let solution = problem.evaluate(tour, plan).unwrap();
        assert!(solution.is_feasible());
        assert_eq!(solution.profit(), 18.0);
    }
}
