//! NSGA-II search over subnetworks.
//!
//! The optimizer keeps a parent population `pt` and an offspring population
//! `qt`. Every generation it breeds `qt` from `pt`, scores both in parallel,
//! and keeps the best `population_size` members of the union by
//! non-domination rank and crowding distance. The hypervolume of the first
//! front drives the stopping rules and selects the population returned at
//! the end of the run.
//!
//! Every generation is checkpointed so that an interrupted run can resume.

pub mod checkpoint;
pub mod network_size;
mod offspring;
pub mod sorting;
pub mod termination;

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::OptimizerConfig;
use crate::hypervolume::HypervolumeCalculator;
use crate::objective::ObjectiveList;
use crate::path::PathRepositories;
use crate::subnetwork::Subnetwork;
use crate::types::NeticError;

use checkpoint::{read_hypervolumes, write_hypervolumes, CheckpointStore, BEST_PREFIX};
use network_size::NetworkSizeController;
use sorting::{assign_crowding_distance, crowded_sort, fast_non_dominated_sort};
use termination::{calculate_generations, Termination};

/// File holding the hypervolume history, inside the `MO` directory.
pub const HYPERVOLUME_FILE: &str = "hyperVolumes";

pub struct NsgaOptimizer<'a> {
    config: &'a OptimizerConfig,
    objectives: &'a ObjectiveList,
    repositories: &'a PathRepositories,
    population_size: usize,
    pt: Vec<Subnetwork>,
    qt: Vec<Subnetwork>,
    hypervolumes: Vec<f64>,
    size_control: NetworkSizeController,
    checkpoints: CheckpointStore,
    hypervolume: HypervolumeCalculator,
    rng: ChaCha8Rng,
    best_hypervolume: f64,
    best_generation: usize,
}

impl<'a> NsgaOptimizer<'a> {
    pub fn new(
        config: &'a OptimizerConfig,
        objectives: &'a ObjectiveList,
        repositories: &'a PathRepositories,
    ) -> Self {
        let rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        Self {
            config,
            objectives,
            repositories,
            population_size: config.even_population_size(),
            pt: Vec::new(),
            qt: Vec::new(),
            hypervolumes: Vec::new(),
            size_control: NetworkSizeController::new(
                1,
                config.target_network_size,
                config.max_network_size,
                config.focus_fraction,
            ),
            checkpoints: CheckpointStore::new(config.population_dir()),
            hypervolume: HypervolumeCalculator::new(
                config.hypervolume_tools.clone(),
                config.fronts_dir(),
            ),
            rng,
            best_hypervolume: 0.0,
            best_generation: 0,
        }
    }

    #[must_use]
    pub fn population(&self) -> &[Subnetwork] {
        &self.pt
    }

    /// Hypervolume of the first front, per generation.
    #[must_use]
    pub fn hypervolumes(&self) -> &[f64] {
        &self.hypervolumes
    }

    /// Generation whose population had the highest hypervolume.
    #[must_use]
    pub fn best_generation(&self) -> usize {
        self.best_generation
    }

    #[must_use]
    pub fn size_control(&self) -> &NetworkSizeController {
        &self.size_control
    }

    /// Run the search and return the best population found.
    ///
    /// # Errors
    ///
    /// Fails on unwritable checkpoints and on corrupt checkpoints when
    /// resuming.
    pub fn optimize(&mut self) -> Result<Vec<Subnetwork>, NeticError> {
        tracing::info!(
            threads = rayon::current_num_threads(),
            population = self.population_size,
            initial_populations = self.config.initial_populations,
            objectives = self.objectives.len(),
            "start optimisation"
        );

        let mut t = match self.resume()? {
            Some(generation) => {
                self.hypervolumes =
                    read_hypervolumes(&self.config.multi_objective_dir().join(HYPERVOLUME_FILE))?;
                self.hypervolumes.resize(generation + 1, 0.0);
                self.best_hypervolume = self.hypervolumes[generation];
                self.best_generation = generation;
                self.checkpoints
                    .write_population(BEST_PREFIX, generation, &self.pt)?;
                tracing::info!(
                    generation,
                    hypervolume = self.best_hypervolume,
                    "loaded population from file"
                );
                generation + 1
            }
            None => {
                self.initial_population()?;
                self.hypervolumes.clear();
                0
            }
        };

        let calculated = calculate_generations(
            self.repositories.number_of_paths(),
            (self.size_control.current_min(), self.size_control.current_max()),
            self.population_size,
            self.config.path_length,
            self.config.mutation_chance,
        );
        let termination = Termination::new(
            self.config.generations,
            calculated,
            self.config.window_count,
            (self.config.min_window_size, self.config.max_window_size),
            self.config.early_termination,
            self.config.required_progress_percentage,
            self.config.time_limit_hours,
        );
        if t >= termination.generations() {
            tracing::info!(generation = t, "nothing to optimize, increase the number of generations");
            return Ok(std::mem::take(&mut self.pt));
        }

        let started = Instant::now();
        let first = t;
        loop {
            self.size_control.update(&self.pt, self.objectives);
            self.compute_generation(t as isize, self.population_size)?;
            self.checkpoints.write_population("", t, &self.pt)?;
            let stop = termination.check(t, &self.hypervolumes, started.elapsed());

            let hypervolume = self.hypervolumes.get(t).copied().unwrap_or(0.0);
            if hypervolume > self.best_hypervolume || self.best_hypervolume == 0.0 {
                self.best_hypervolume = hypervolume;
                self.best_generation = t;
                self.checkpoints.write_population(BEST_PREFIX, t, &self.pt)?;
            }
            t += 1;
            if stop.is_some() {
                break;
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        tracing::info!(
            generations = t,
            seconds = %format!("{elapsed:.3}"),
            seconds_per_generation = %format!("{:.3}", elapsed / (t - first) as f64),
            "finished optimization"
        );

        let best = self.checkpoints.file(BEST_PREFIX, self.best_generation);
        self.pt = self.checkpoints.read_population(&best, self.repositories)?;
        tracing::info!(
            generation = self.best_generation,
            hypervolume = self.best_hypervolume,
            "best population"
        );
        write_hypervolumes(
            &self.config.multi_objective_dir().join(HYPERVOLUME_FILE),
            &self.hypervolumes,
        )?;
        Ok(std::mem::take(&mut self.pt))
    }

    /// Load the latest checkpoint when resuming. Returns its generation.
    fn resume(&mut self) -> Result<Option<usize>, NeticError> {
        if !self.config.resume {
            return Ok(None);
        }
        let Some((generation, file)) = self.checkpoints.latest() else {
            tracing::info!(dir = %self.checkpoints.dir().display(), "no population file found");
            return Ok(None);
        };
        tracing::info!(generation, file = %file.display(), "found population file");
        let population = self.checkpoints.read_population(&file, self.repositories)?;
        if population.is_empty() {
            tracing::warn!(file = %file.display(), "population file is empty, starting over");
            return Ok(None);
        }
        self.size_control = NetworkSizeController::from_population(
            &population,
            self.config.max_network_size,
            self.config.focus_fraction,
        );
        self.pt = population;
        self.qt.clear();
        Ok(Some(generation))
    }

    /// Build the initial population in waves. Each wave creates a full
    /// population of random subnetworks and keeps its best fraction.
    fn initial_population(&mut self) -> Result<(), NeticError> {
        let waves = self.config.initial_populations.max(1);
        let keep = (self.population_size / waves).max(1);
        let mut initial = Vec::with_capacity(self.population_size);
        for wave in 0..waves {
            self.qt = self.random_population();
            self.pt = Vec::with_capacity(keep);
            let size = self.qt.len();
            self.compute_generation(wave as isize - waves as isize, keep)?;
            initial.append(&mut self.pt);
            tracing::info!(id = wave + 1, size, total = initial.len(), "initial population");
        }
        self.pt = initial;
        Ok(())
    }

    fn random_population(&mut self) -> Vec<Subnetwork> {
        let mut population = Vec::with_capacity(self.population_size);
        let mut undersized = 0;
        for _ in 0..self.population_size {
            let target = self.size_control.sample(&mut self.rng);
            let mut network = Subnetwork::new();
            let mut attempts = 0;
            while network.size() < target && attempts < 10 * target {
                network.expand(self.repositories, &mut self.rng);
                attempts += 1;
            }
            if network.size() < target {
                undersized += 1;
            }
            population.push(network);
        }
        if undersized > 0 {
            tracing::warn!(
                networks = undersized,
                "could not reach the target size for every initial network"
            );
        }
        population
    }

    /// Breed (for `t >= 0`), score and select the next `target` members.
    fn compute_generation(&mut self, t: isize, target: usize) -> Result<(), NeticError> {
        tracing::debug!(generation = t, "start generation");
        if t >= 0 {
            self.generate_offspring();
        }
        self.score_populations();

        let mut combined = std::mem::take(&mut self.pt);
        combined.append(&mut self.qt);
        let mut fronts = fast_non_dominated_sort(&mut combined, self.objectives, target);

        let mut selected = Vec::with_capacity(target);
        for (level, front) in fronts.iter_mut().enumerate() {
            assign_crowding_distance(&mut combined, front, self.objectives.len());
            if selected.len() + front.len() > target {
                crowded_sort(&combined, front);
                let length = target.saturating_sub(selected.len()).min(front.len());
                if level == 0 {
                    front.truncate(length);
                }
                selected.extend_from_slice(&front[..length]);
            } else {
                selected.extend_from_slice(front);
            }
            if selected.len() >= target {
                break;
            }
        }

        let first_front: Vec<Vec<f64>> = fronts
            .first()
            .map(|front| {
                front
                    .iter()
                    .map(|&member| combined[member].scores().to_vec())
                    .collect()
            })
            .unwrap_or_default();

        let mut members: Vec<Option<Subnetwork>> = combined.into_iter().map(Some).collect();
        self.pt = selected
            .iter()
            .filter_map(|&member| members[member].take())
            .collect();

        if t >= 0 {
            let hypervolume = self.hypervolume.calculate(&t.to_string(), &first_front);
            self.hypervolumes.push(hypervolume);
        }
        Ok(())
    }

    /// Score every unscored member of both populations, one task per member.
    fn score_populations(&mut self) {
        let objectives = self.objectives;
        self.pt
            .par_iter_mut()
            .chain(self.qt.par_iter_mut())
            .for_each(|network| objectives.set_scores(network));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::test_support::{chain, diamond};
    use crate::objective::SampleMode;
    use crate::path::test_support::path;
    use crate::path::{CircuitHeader, PathRepository};
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::tempdir;

    /// Ten paths over two samples.
    fn repositories() -> PathRepositories {
        let s1 = [
            vec![(1, 2), (2, 3)],
            vec![(1, 2), (2, 4)],
            vec![(1, 3), (3, 4)],
            vec![(2, 3)],
            vec![(3, 4), (4, 5)],
        ];
        let s2 = [
            vec![(1, 2), (2, 3)],
            vec![(5, 6)],
            vec![(6, 7), (7, 8)],
            vec![(1, 3)],
            vec![(2, 4), (4, 5)],
        ];
        let mut grouped: BTreeMap<CircuitHeader, Vec<_>> = BTreeMap::new();
        for (condition, edges) in [("s1", &s1), ("s2", &s2)] {
            for (index, edges) in edges.iter().enumerate() {
                grouped
                    .entry(CircuitHeader::new(condition, edges[0].0))
                    .or_default()
                    .push(path(index, condition, edges));
            }
        }
        let mut repositories = PathRepositories::new();
        repositories.add(PathRepository::new("mutation", grouped));
        repositories
    }

    fn objectives() -> ObjectiveList {
        ObjectiveList::standard(
            vec![vec![chain("s1"), chain("s2"), diamond("s1")]],
            true,
            Some(SampleMode::Entropy),
        )
    }

    fn config(output: &Path, generations: usize) -> OptimizerConfig {
        OptimizerConfig {
            output_folder: output.to_path_buf(),
            population_size: 20,
            generations: Some(generations),
            target_network_size: 6,
            early_termination: false,
            seed: Some(7),
            ..Default::default()
        }
    }

    fn run(output: &Path) -> (Vec<String>, Vec<f64>, usize) {
        let config = config(output, 5);
        let objectives = objectives();
        let repositories = repositories();
        let mut optimizer = NsgaOptimizer::new(&config, &objectives, &repositories);
        let population = optimizer.optimize().unwrap();
        (
            population.iter().map(ToString::to_string).collect(),
            optimizer.hypervolumes().to_vec(),
            optimizer.best_generation(),
        )
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let (population, hypervolumes, best) = run(first.path());
        assert_eq!(run(second.path()), (population.clone(), hypervolumes.clone(), best));

        assert_eq!(hypervolumes.len(), 5);
        assert!(hypervolumes.iter().all(|&hypervolume| hypervolume >= 0.0));
        assert!(!population.is_empty());
        assert!(population.len() <= 20);
        assert!(first.path().join("MO").join(HYPERVOLUME_FILE).exists());
        assert!(first
            .path()
            .join("MO")
            .join("population")
            .join(format!("{BEST_PREFIX}{best}"))
            .exists());
    }

    #[test]
    fn test_generation_keeps_population_size() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), 5);
        let objectives = objectives();
        let repositories = repositories();
        let mut optimizer = NsgaOptimizer::new(&config, &objectives, &repositories);

        optimizer.initial_population().unwrap();
        assert_eq!(optimizer.population().len(), 20);
        assert!(optimizer.population().iter().all(|network| network.size() > 0));

        optimizer.compute_generation(0, 20).unwrap();
        assert_eq!(optimizer.population().len(), 20);
        assert_eq!(optimizer.hypervolumes().len(), 1);
        assert!(optimizer
            .population()
            .iter()
            .all(|network| network.scores().len() == objectives.len() && network.rank().is_some()));
    }

    #[test]
    fn test_offspring_are_built_from_parent_paths() {
        let dir = tempdir().unwrap();
        let config = OptimizerConfig {
            mutation_chance: 0.0,
            ..config(dir.path(), 5)
        };
        let objectives = objectives();
        let repositories = repositories();
        let mut optimizer = NsgaOptimizer::new(&config, &objectives, &repositories);
        optimizer.initial_population().unwrap();

        let parent_paths: std::collections::BTreeSet<_> = optimizer
            .population()
            .iter()
            .flat_map(|network| network.selected_paths().keys().copied())
            .collect();
        optimizer.generate_offspring();
        assert_eq!(optimizer.qt.len(), 20);
        for child in &optimizer.qt {
            assert!(child
                .selected_paths()
                .keys()
                .all(|id| parent_paths.contains(id)));
        }
    }

    #[test]
    fn test_resume_continues_after_latest_checkpoint() {
        let dir = tempdir().unwrap();
        let objectives = objectives();
        let repositories = repositories();

        let short = config(dir.path(), 3);
        NsgaOptimizer::new(&short, &objectives, &repositories)
            .optimize()
            .unwrap();

        let resumed = OptimizerConfig {
            resume: true,
            ..config(dir.path(), 5)
        };
        let mut optimizer = NsgaOptimizer::new(&resumed, &objectives, &repositories);
        optimizer.optimize().unwrap();
        assert_eq!(optimizer.hypervolumes().len(), 5);
        assert!(dir.path().join("MO").join("population").join("4").exists());
    }

    #[test]
    fn test_resume_with_nothing_left_to_do() {
        let dir = tempdir().unwrap();
        let objectives = objectives();
        let repositories = repositories();
        let short = config(dir.path(), 3);
        NsgaOptimizer::new(&short, &objectives, &repositories)
            .optimize()
            .unwrap();

        let again = OptimizerConfig {
            resume: true,
            ..config(dir.path(), 3)
        };
        let mut optimizer = NsgaOptimizer::new(&again, &objectives, &repositories);
        let population = optimizer.optimize().unwrap();
        assert!(!population.is_empty());
        assert!(!dir.path().join("MO").join("population").join("3").exists());
    }
}
