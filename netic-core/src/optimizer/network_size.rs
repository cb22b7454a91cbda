//! Adaptive control of the target sizes sampled for new subnetworks.

use rand::Rng;

use crate::objective::ObjectiveList;
use crate::subnetwork::Subnetwork;

const SCORE_EXPONENT_STEP: f64 = 0.005;

/// Samples target network sizes from `[current_min, current_max]`, with a
/// narrower focus range that follows the sizes of the best subnetworks.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSizeController {
    current_min: usize,
    current_max: usize,
    focus_min: usize,
    focus_max: usize,
    true_max: usize,
    score_exponent: f64,
    focus_fraction: f64,
}

impl NetworkSizeController {
    #[must_use]
    pub fn new(initial_min: usize, initial_max: usize, true_max: usize, focus_fraction: f64) -> Self {
        let initial_min = initial_min.max(1);
        let initial_max = initial_max.max(initial_min);
        Self {
            current_min: initial_min,
            current_max: initial_max,
            focus_min: initial_min,
            focus_max: initial_max,
            true_max,
            score_exponent: 0.0,
            focus_fraction,
        }
    }

    /// Controller spanning the size range of a loaded population.
    #[must_use]
    pub fn from_population(population: &[Subnetwork], true_max: usize, focus_fraction: f64) -> Self {
        let min = population.iter().map(Subnetwork::size).min().unwrap_or(1);
        let max = population.iter().map(Subnetwork::size).max().unwrap_or(1);
        Self::new(min, max, true_max, focus_fraction)
    }

    #[must_use]
    pub fn current_min(&self) -> usize {
        self.current_min
    }

    #[must_use]
    pub fn current_max(&self) -> usize {
        self.current_max
    }

    #[must_use]
    pub fn focus_range(&self) -> (usize, usize) {
        (self.focus_min, self.focus_max)
    }

    #[must_use]
    pub fn score_exponent(&self) -> f64 {
        self.score_exponent
    }

    /// Draw a target size, from the focus range with probability
    /// `focus_fraction` and from the current range otherwise.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let (low, high) = if rng.gen::<f64>() < self.focus_fraction {
            (self.focus_min, self.focus_max)
        } else {
            (self.current_min, self.current_max)
        };
        rng.gen_range(low..=high.max(low))
    }

    /// Move the focus range toward the sizes of the best subnetworks.
    ///
    /// For every circuit objective the top decile of `population` is taken;
    /// the 10th and 90th percentile of their sizes pull the focus bounds,
    /// each by at most 10% per call. Returns the score exponent.
    pub fn update(&mut self, population: &[Subnetwork], objectives: &ObjectiveList) -> f64 {
        let sizes = top_sizes(population, objectives);
        if sizes.is_empty() {
            return self.score_exponent;
        }
        let low = percentile(&sizes, 0.1);
        let high = percentile(&sizes, 0.9);

        self.focus_min = limited_change(self.focus_min, scaled(low, 0.9) - 10).max(1) as usize;
        let mut focus_max = limited_change(self.focus_max, scaled(high, 1.1) + 10).max(1) as usize;
        if focus_max <= self.focus_min {
            focus_max = self.focus_min + 1;
        }
        self.focus_max = focus_max;

        if self.focus_max > self.true_max {
            self.score_exponent += SCORE_EXPONENT_STEP;
            self.focus_max = self.true_max;
            self.focus_min = 1;
        }
        self.current_min = self.current_min.min(self.focus_min);
        self.current_max = self.current_max.max(self.focus_max);

        tracing::debug!(
            current_min = self.current_min,
            focus_min = self.focus_min,
            focus_max = self.focus_max,
            current_max = self.current_max,
            score_exponent = self.score_exponent,
            "updated network size range"
        );
        self.score_exponent
    }
}

/// Sizes of the top decile per circuit objective, sorted ascending.
fn top_sizes(population: &[Subnetwork], objectives: &ObjectiveList) -> Vec<usize> {
    let scored: Vec<&Subnetwork> = population
        .iter()
        .filter(|network| network.scores().len() == objectives.len())
        .collect();
    let top = (scored.len() / 10).max(1);

    let mut sizes = Vec::new();
    for (index, objective) in objectives.objectives().iter().enumerate() {
        if !objective.is_circuit_coverage() {
            continue;
        }
        let mut ranked = scored.clone();
        ranked.sort_by(|a, b| b.scores()[index].total_cmp(&a.scores()[index]));
        sizes.extend(ranked.iter().take(top).map(|network| network.size()));
    }
    sizes.sort_unstable();
    sizes
}

fn percentile(sorted: &[usize], p: f64) -> usize {
    sorted[((sorted.len() - 1) as f64 * p) as usize]
}

fn scaled(size: usize, factor: f64) -> i64 {
    (size as f64 * factor) as i64
}

/// Move `old` toward `new` by at most 10% of `old`, and at least by 1.
pub(crate) fn limited_change(old: usize, new: i64) -> i64 {
    let old = old as i64;
    if old == new {
        return old;
    }
    let max_change = ((0.1 * old as f64) as i64).max(1);
    if new < old {
        old - (old - new).min(max_change)
    } else {
        old + (new - old).min(max_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Objective;
    use crate::path::PathId;
    use crate::types::{InteractionId, InteractionSet};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scored_network(size: usize, coverage: f64) -> Subnetwork {
        let set: InteractionSet = (1..=size as u32)
            .map(|gene| InteractionId::new(gene, gene + 1, 1).unwrap())
            .collect();
        let mut network = Subnetwork::new();
        network.add_path(PathId::new(0, 0, size).unwrap(), &set);
        network.set_scores(vec![1.0 / size as f64, coverage]);
        network
    }

    fn objectives() -> ObjectiveList {
        ObjectiveList::new(
            vec![Objective::NetworkSize, Objective::CircuitCoverage(0)],
            Vec::new(),
        )
    }

    #[test]
    fn test_limited_change() {
        assert_eq!(limited_change(100, 100), 100);
        assert_eq!(limited_change(100, 500), 110);
        assert_eq!(limited_change(100, 105), 105);
        assert_eq!(limited_change(100, 0), 90);
        assert_eq!(limited_change(5, 50), 6);
        assert_eq!(limited_change(5, -20), 4);
    }

    #[test]
    fn test_sample_stays_in_range() {
        let controller = NetworkSizeController::new(3, 9, 1000, 0.5);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..500 {
            let size = controller.sample(&mut rng);
            assert!((3..=9).contains(&size));
        }
    }

    #[test]
    fn test_focus_follows_large_best_networks() {
        let mut controller = NetworkSizeController::new(1, 100, 1000, 0.5);
        // the best-covering networks are the largest ones
        let population: Vec<Subnetwork> = (1..=40)
            .map(|i| scored_network(i * 10, i as f64))
            .collect();
        controller.update(&population, &objectives());

        // both bounds move by at most 10%, and by at least 1
        assert_eq!(controller.focus_range(), (2, 110));
        assert_eq!(controller.current_min(), 1);
        assert_eq!(controller.current_max(), 110);
        assert_eq!(controller.score_exponent(), 0.0);
    }

    #[test]
    fn test_focus_max_reset_at_ceiling() {
        let mut controller = NetworkSizeController::new(50, 60, 60, 0.5);
        let population: Vec<Subnetwork> = (1..=10)
            .map(|i| scored_network(500 + i, i as f64))
            .collect();
        controller.update(&population, &objectives());

        assert_eq!(controller.focus_range(), (1, 60));
        assert_eq!(controller.current_min(), 1);
        assert!((controller.score_exponent() - SCORE_EXPONENT_STEP).abs() < 1e-12);
    }

    #[test]
    fn test_update_without_circuit_objectives_is_noop() {
        let mut controller = NetworkSizeController::new(1, 100, 1000, 0.5);
        let before = controller.clone();
        let objectives = ObjectiveList::new(vec![Objective::NetworkSize], Vec::new());
        let population = vec![scored_network(5, 1.0)];
        controller.update(&population, &objectives);
        assert_eq!(controller, before);
    }

    #[test]
    fn test_from_population() {
        let population = vec![scored_network(4, 0.0), scored_network(12, 0.0)];
        let controller = NetworkSizeController::from_population(&population, 1000, 0.5);
        assert_eq!(controller.current_min(), 4);
        assert_eq!(controller.current_max(), 12);
    }
}
