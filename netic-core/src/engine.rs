use std::fs;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;

use crate::circuit::load_circuits;
use crate::config::OptimizerConfig;
use crate::interaction_store::{GeneIdMap, InteractionStore, InteractionTypeMap};
use crate::objective::ObjectiveList;
use crate::optimizer::NsgaOptimizer;
use crate::output::{append_run_time, write_results};
use crate::path::io::{read_path_list, PathFilter};
use crate::path::{PathRepositories, PathRepository};
use crate::results::OptimizationResults;
use crate::subnetwork::Subnetwork;
use crate::types::NeticError;

/// Gene index file inside the index directory.
pub const GENE_INDEX_FILE: &str = "gene-ids";
/// Interaction type index file inside the index directory.
pub const INTERACTION_TYPE_INDEX_FILE: &str = "interaction-type-ids";
/// Run time log inside the `MO` directory, one line per run.
pub const RUN_TIME_FILE: &str = "runTime";

/// Everything an optimization run reads from earlier pipeline stages.
#[derive(Debug, Clone)]
pub struct RunInputs {
    /// Interaction types, regulatory flags and the loaded topology
    pub store: InteractionStore,
    /// Candidate paths, one repository per path type
    pub repositories: PathRepositories,
    /// Active objectives and the circuits they evaluate
    pub objectives: ObjectiveList,
}

/// Drives a complete optimization: input loading, the NSGA-II search, and
/// result files.
///
/// The runner owns a dedicated rayon pool sized by
/// [`OptimizerConfig::num_threads`]; circuit loading and scoring run on it.
///
/// # Examples
///
/// ```rust,no_run
/// use netic_core::config::OptimizerConfig;
/// use netic_core::engine::MultiObjectiveRunner;
///
/// let config = OptimizerConfig {
///     output_folder: "run1".into(),
///     path_types: vec!["mutation".into(), "expression".into()],
///     population_size: 200,
///     num_threads: Some(4),
///     ..Default::default()
/// };
///
/// let runner = MultiObjectiveRunner::new(config)?;
/// let results = runner.run()?;
/// println!("{} networks written", results.files.len());
/// # Ok::<(), netic_core::types::NeticError>(())
/// ```
#[derive(Debug)]
pub struct MultiObjectiveRunner {
    config: OptimizerConfig,
    pool: rayon::ThreadPool,
}

impl MultiObjectiveRunner {
    /// Validate `config` and build the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`NeticError::ConfigError`] for invalid options and
    /// [`NeticError::ThreadPoolError`] if the pool cannot be built.
    pub fn new(config: OptimizerConfig) -> Result<Self, NeticError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads.unwrap_or(0))
            .build()
            .map_err(|e| NeticError::ThreadPoolError(format!("Failed to configure thread pool: {e}")))?;
        Ok(Self { config, pool })
    }

    #[must_use]
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Read the indexes, path lists and circuits of every path type.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed inputs, unknown regulatory types and
    /// duplicate path ids.
    pub fn load_inputs(&self) -> Result<RunInputs, NeticError> {
        self.pool.install(|| self.read_inputs())
    }

    fn read_inputs(&self) -> Result<RunInputs, NeticError> {
        let index_dir = self.config.index_dir();
        let genes = GeneIdMap::read(index_dir.join(GENE_INDEX_FILE))?;
        let mut store =
            InteractionStore::new(InteractionTypeMap::read(index_dir.join(INTERACTION_TYPE_INDEX_FILE))?);
        for name in &self.config.regulatory_types {
            store.set_regulatory(name)?;
        }

        let filter = PathFilter {
            cutoff: self.config.path_cutoff,
            max_paths: self.config.max_paths,
        };
        let mut repositories = PathRepositories::new();
        let mut circuits = Vec::with_capacity(self.config.path_types.len());
        for path_type in &self.config.path_types {
            let paths_file = self.config.paths_file(path_type);
            tracing::info!(path_type, file = %paths_file.display(), "reading paths");
            let grouped = read_path_list(&paths_file, &genes, &mut store, filter)?;
            repositories.add(PathRepository::new(path_type, grouped));
            circuits.push(load_circuits(self.config.circuits_dir(path_type))?);
        }
        tracing::info!(
            genes = genes.len(),
            interactions = store.interaction_count(),
            paths = repositories.number_of_paths(),
            circuits = circuits.iter().map(Vec::len).sum::<usize>(),
            "loaded inputs"
        );

        let objectives = ObjectiveList::standard(
            circuits,
            self.config.optimize_network_size,
            self.config
                .optimize_sample_count
                .then_some(self.config.sample_objective),
        );
        Ok(RunInputs {
            store,
            repositories,
            objectives,
        })
    }

    /// Load inputs, optimize, and write one result file per distinct network.
    ///
    /// Without any candidate path nothing is optimized and empty results are
    /// returned.
    ///
    /// # Errors
    ///
    /// Input errors from [`load_inputs`](Self::load_inputs), fatal
    /// checkpoint errors, and failures to write result files.
    pub fn run(&self) -> Result<OptimizationResults, NeticError> {
        let started = Instant::now();
        self.pool.install(|| {
            let inputs = self.read_inputs()?;
            if inputs.repositories.number_of_paths() == 0 {
                tracing::error!(
                    path_types = ?self.config.path_types,
                    "there are no paths to optimize, aborting"
                );
                return Ok(OptimizationResults::default());
            }
            if !self.config.resume {
                self.clear_previous_run()?;
            }

            let mut optimizer =
                NsgaOptimizer::new(&self.config, &inputs.objectives, &inputs.repositories);
            let mut population = optimizer.optimize()?;
            population
                .par_iter_mut()
                .for_each(|network| network.set_scores(inputs.objectives.score(network)));
            let networks = distinct(population);

            let files = write_results(&self.config.optimization_dir(), &networks, &inputs.store)?;
            let elapsed = started.elapsed();
            append_run_time(
                &self.config.multi_objective_dir().join(RUN_TIME_FILE),
                elapsed.as_secs_f64(),
            )?;
            tracing::info!(
                networks = networks.len(),
                best_generation = optimizer.best_generation(),
                seconds = %format!("{:.3}", elapsed.as_secs_f64()),
                "optimization finished"
            );

            Ok(OptimizationResults {
                networks,
                hypervolumes: optimizer.hypervolumes().to_vec(),
                best_generation: optimizer.best_generation(),
                files,
                elapsed,
            })
        })
    }

    /// Remove checkpoints and fronts left by an earlier run.
    fn clear_previous_run(&self) -> Result<(), NeticError> {
        for dir in [self.config.population_dir(), self.config.fronts_dir()] {
            remove_dir(&dir)?;
        }
        Ok(())
    }
}

fn remove_dir(dir: &Path) -> Result<(), NeticError> {
    if !dir.exists() {
        return Ok(());
    }
    tracing::debug!(dir = %dir.display(), "removing previous run output");
    fs::remove_dir_all(dir).map_err(|err| NeticError::output_write(dir, err))
}

/// Keep the first network of every distinct interaction set.
fn distinct(population: Vec<Subnetwork>) -> Vec<Subnetwork> {
    let mut networks: Vec<Subnetwork> = Vec::with_capacity(population.len());
    for network in population {
        if !network.is_duplicate_in(&networks) {
            networks.push(network);
        }
    }
    networks
}
