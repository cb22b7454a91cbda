//! Non-dominated sorting, crowding distances and the crowded order.
//!
//! All functions work on indices into a population slice so that the
//! population itself never has to be reordered or cloned.

use std::cmp::Ordering;

use crate::objective::ObjectiveList;
use crate::subnetwork::Subnetwork;

/// Peel `population` into non-dominated fronts and set every member's rank.
///
/// Peeling stops as soon as the fronts hold at least `target` members, so
/// members past that point keep no assigned front. `fronts[0]` is rank 1.
pub fn fast_non_dominated_sort(
    population: &mut [Subnetwork],
    objectives: &ObjectiveList,
    target: usize,
) -> Vec<Vec<usize>> {
    let n = population.len();
    let mut dominated_count = vec![0usize; n];
    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut first = Vec::new();

    for p in 0..n {
        for q in 0..n {
            if p == q {
                continue;
            }
            let (p_scores, q_scores) = (population[p].scores(), population[q].scores());
            if objectives.dominates(p_scores, q_scores) {
                dominates[p].push(q);
            } else if objectives.dominates(q_scores, p_scores) {
                dominated_count[p] += 1;
            }
        }
        if dominated_count[p] == 0 {
            first.push(p);
        }
    }

    let mut total = first.len();
    let mut fronts = vec![first];
    while total < target {
        let mut next = Vec::new();
        if let Some(current) = fronts.last() {
            for &p in current {
                for &q in &dominates[p] {
                    dominated_count[q] -= 1;
                    if dominated_count[q] == 0 {
                        next.push(q);
                    }
                }
            }
        }
        if next.is_empty() {
            break;
        }
        total += next.len();
        fronts.push(next);
    }

    for (level, front) in fronts.iter().enumerate() {
        for &member in front {
            population[member].set_rank(level + 1);
        }
    }
    fronts
}

/// Assign crowding distances to the members of `front`.
///
/// Boundary members of every objective get `+inf`; interior members sum
/// their normalised neighbour gaps. Objectives without spread are skipped.
/// `front` is left sorted by the last objective.
pub fn assign_crowding_distance(
    population: &mut [Subnetwork],
    front: &mut [usize],
    objective_count: usize,
) {
    for &member in front.iter() {
        population[member].set_crowding_distance(0.0);
    }
    let Some(last) = front.len().checked_sub(1) else {
        return;
    };

    for objective in 0..objective_count {
        front.sort_by(|&a, &b| {
            population[a].scores()[objective].total_cmp(&population[b].scores()[objective])
        });
        population[front[0]].set_crowding_distance(f64::INFINITY);
        population[front[last]].set_crowding_distance(f64::INFINITY);

        let range =
            population[front[last]].scores()[objective] - population[front[0]].scores()[objective];
        if range == 0.0 || !range.is_finite() {
            continue;
        }
        for j in 1..last {
            let gap = population[front[j + 1]].scores()[objective]
                - population[front[j - 1]].scores()[objective];
            let member = &mut population[front[j]];
            member.set_crowding_distance(member.crowding_distance() + gap / range);
        }
    }
}

/// Crowded-comparison order: lower rank first, then larger crowding distance.
#[must_use]
pub fn crowded_order(a: &Subnetwork, b: &Subnetwork) -> Ordering {
    let rank = |network: &Subnetwork| network.rank().unwrap_or(usize::MAX);
    rank(a)
        .cmp(&rank(b))
        .then_with(|| b.crowding_distance().total_cmp(&a.crowding_distance()))
}

/// Sort `indices` by the crowded-comparison order.
pub fn crowded_sort(population: &[Subnetwork], indices: &mut [usize]) {
    indices.sort_by(|&a, &b| crowded_order(&population[a], &population[b]));
}
