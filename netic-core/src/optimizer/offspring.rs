//! Selection, crossover and mutation.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rand::Rng;

use super::sorting::crowded_order;
use super::NsgaOptimizer;
use crate::path::PathId;
use crate::subnetwork::Subnetwork;

/// Attempts at replacing a duplicate child before it is accepted anyway.
const REGENERATION_LIMIT: usize = 10;

impl NsgaOptimizer<'_> {
    /// Fill the offspring population with unique children where possible.
    pub(super) fn generate_offspring(&mut self) {
        let mut offspring = Vec::with_capacity(self.population_size);
        if self.pt.is_empty() {
            self.qt = offspring;
            return;
        }
        let mut regenerations = 0;
        while offspring.len() < self.population_size {
            let child = self.generate_child();
            let duplicate = child.is_duplicate_in(&self.pt) || child.is_duplicate_in(&offspring);
            if duplicate && regenerations < REGENERATION_LIMIT {
                regenerations += 1;
                continue;
            }
            if duplicate {
                tracing::warn!(
                    index = offspring.len(),
                    attempts = regenerations,
                    "duplicate detected, could not find unique child"
                );
            }
            offspring.push(child);
            regenerations = 0;
        }
        self.qt = offspring;
    }

    /// Binary tournament: the crowded-order winner of two random members.
    fn tournament(&mut self) -> usize {
        let first = self.rng.gen_range(0..self.pt.len());
        let second = self.rng.gen_range(0..self.pt.len());
        match crowded_order(&self.pt[first], &self.pt[second]) {
            Ordering::Greater => second,
            Ordering::Less | Ordering::Equal => first,
        }
    }

    /// Path-level crossover of two tournament winners, then an optional
    /// single expansion.
    ///
    /// Paths are drawn alternately from each parent until the child reaches
    /// a freshly sampled target size or both parents are used up.
    fn generate_child(&mut self) -> Subnetwork {
        let parents = [self.tournament(), self.tournament()];
        let mut remaining: [Vec<PathId>; 2] =
            parents.map(|parent| self.pt[parent].selected_paths().keys().copied().collect());

        let target = self.size_control.sample(&mut self.rng);
        let mut added = BTreeSet::new();
        let mut child = Subnetwork::new();
        let mut current = 0;
        loop {
            if remaining[current].is_empty() {
                current = 1 - current;
            }
            if remaining[current].is_empty() {
                break;
            }
            let index = self.rng.gen_range(0..remaining[current].len());
            let id = remaining[current].swap_remove(index);
            if !added.insert(id) {
                continue;
            }
            match self.repositories.path_interaction_set(id) {
                Ok(interactions) => child.add_path(id, interactions),
                Err(err) => tracing::warn!(path = %id, error = %err, "skipping unknown parent path"),
            }
            current = 1 - current;
            if child.size() >= target {
                break;
            }
        }

        if self.rng.gen::<f64>() < self.config.mutation_chance
            && child.size() < self.size_control.current_max()
        {
            child.expand(self.repositories, &mut self.rng);
        }
        child
    }
}
