use std::path::PathBuf;

use crate::objective::SampleMode;
use crate::types::NeticError;

/// Locations of precomputed artifacts from earlier pipeline stages.
///
/// Each artifact depends on the previous one: circuits were compiled from
/// paths, which were found using the gene and interaction-type index. A
/// later artifact can therefore only be supplied together with every
/// earlier one.
///
/// # Examples
///
/// ```rust
/// use netic_core::config::ArtifactPaths;
///
/// let artifacts = ArtifactPaths {
///     index: Some("run1".into()),
///     paths: Some("run1/paths_4".into()),
///     circuits: None,
/// };
/// assert!(artifacts.validate().is_ok());
///
/// let broken = ArtifactPaths { circuits: Some("NF_4".into()), ..Default::default() };
/// assert!(broken.validate().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Directory holding `gene-ids` and `interaction-type-ids`.
    ///
    /// **Default**: `None` (the output folder)
    pub index: Option<PathBuf>,

    /// Directory holding one `<path type>/paths.txt` per path type.
    ///
    /// **Default**: `None` (`<output>/paths_<path length>`)
    pub paths: Option<PathBuf>,

    /// Directory holding one directory of compiled circuits per path type.
    ///
    /// **Default**: `None` (`<output>/NF_<path length>[_<max paths>]`)
    pub circuits: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Check the circuits -> paths -> index dependency chain.
    ///
    /// # Errors
    ///
    /// Returns [`NeticError::ConfigError`] if circuits are given without paths
    /// or index, or paths without index.
    pub fn validate(&self) -> Result<(), NeticError> {
        let broken = (self.circuits.is_some() && self.paths.is_none())
            || (self.circuits.is_some() && self.index.is_none())
            || (self.paths.is_some() && self.index.is_none());
        if broken {
            tracing::error!(
                circuits = ?self.circuits,
                paths = ?self.paths,
                index = ?self.index,
                "precomputed circuits require paths, which require an index"
            );
            return Err(NeticError::ConfigError(
                "invalid use of precomputed files: circuits require paths, which require an index"
                    .into(),
            ));
        }
        Ok(())
    }
}

/// Configuration of an optimization run.
///
/// # Examples
///
/// ## Default configuration
///
/// ```rust
/// use netic_core::config::OptimizerConfig;
///
/// let config = OptimizerConfig::default();
/// assert_eq!(config.population_size, 500);
/// ```
///
/// ## Small reproducible run
///
/// ```rust
/// use netic_core::config::OptimizerConfig;
///
/// let config = OptimizerConfig {
///     population_size: 20,
///     generations: Some(5),
///     seed: Some(7),
///     num_threads: Some(2),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Root directory for checkpoints, fronts and results.
    ///
    /// **Default**: `"."`
    pub output_folder: PathBuf,

    /// Path types to optimize over; one circuit objective each.
    ///
    /// **Default**: `["mutation"]`
    pub path_types: Vec<String>,

    /// Precomputed artifact locations.
    pub artifacts: ArtifactPaths,

    /// Names of interaction types flagged as regulatory in result files.
    ///
    /// **Default**: empty
    pub regulatory_types: Vec<String>,

    /// Number of subnetworks kept per generation. Rounded down to even.
    ///
    /// **Default**: `500`
    pub population_size: usize,

    /// Fixed number of generations.
    ///
    /// **Default**: `None` (derived from the size of the path universe)
    pub generations: Option<usize>,

    /// Probability that a child receives one expansion.
    ///
    /// **Default**: `0.5`
    pub mutation_chance: f64,

    /// Number of progress windows the generation budget is split into.
    ///
    /// **Default**: `20`
    pub window_count: usize,

    /// **Default**: `2`
    pub min_window_size: usize,

    /// **Default**: `100`
    pub max_window_size: usize,

    /// Minimal hypervolume progress per window, in percent.
    ///
    /// **Default**: `0.25`
    pub required_progress_percentage: f64,

    /// Stop when windowed progress falls below the requirement.
    ///
    /// **Default**: `true`
    pub early_termination: bool,

    /// Wall-clock limit in hours, `0` for none.
    ///
    /// **Default**: `0.0`
    pub time_limit_hours: f64,

    /// Include the network size objective.
    ///
    /// **Default**: `true`
    pub optimize_network_size: bool,

    /// Include the sample coverage objective.
    ///
    /// **Default**: `true`
    pub optimize_sample_count: bool,

    /// Scoring mode of the sample coverage objective.
    ///
    /// **Default**: [`SampleMode::Entropy`]
    pub sample_objective: SampleMode,

    /// Upper bound of the initial network size range.
    ///
    /// **Default**: `100`
    pub target_network_size: usize,

    /// Hard ceiling on the focus range of network sizes.
    ///
    /// **Default**: `1000`
    pub max_network_size: usize,

    /// Probability of sampling a target size from the focus range.
    ///
    /// **Default**: `0.5`
    pub focus_fraction: f64,

    /// Number of waves used to build the initial population.
    ///
    /// **Default**: `10`
    pub initial_populations: usize,

    /// Maximal path length used by the path search.
    ///
    /// **Default**: `4`
    pub path_length: usize,

    /// Paths below this probability are ignored.
    ///
    /// **Default**: `0.0`
    pub path_cutoff: f64,

    /// Keep only the best paths, `0` keeps all.
    ///
    /// **Default**: `0`
    pub max_paths: usize,

    /// Number of worker threads.
    ///
    /// **Default**: `None` (all cores)
    pub num_threads: Option<usize>,

    /// Seed of the optimizer's random generator.
    ///
    /// **Default**: `None` (seeded from system entropy)
    pub seed: Option<u64>,

    /// Continue from the latest checkpoint in the output folder.
    ///
    /// **Default**: `false`
    pub resume: bool,

    /// Directory with the external hypervolume tools `wfg0` and `wfg2`.
    ///
    /// **Default**: `None` (compute hypervolumes in-process)
    pub hypervolume_tools: Option<PathBuf>,

    /// Suppress the completion summary.
    ///
    /// **Default**: `false`
    pub quiet: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            output_folder: PathBuf::from("."),
            path_types: vec!["mutation".to_string()],
            artifacts: ArtifactPaths::default(),
            regulatory_types: Vec::new(),
            population_size: 500,
            generations: None,
            mutation_chance: 0.5,
            window_count: 20,
            min_window_size: 2,
            max_window_size: 100,
            required_progress_percentage: 0.25,
            early_termination: true,
            time_limit_hours: 0.0,
            optimize_network_size: true,
            optimize_sample_count: true,
            sample_objective: SampleMode::Entropy,
            target_network_size: 100,
            max_network_size: 1000,
            focus_fraction: 0.5,
            initial_populations: 10,
            path_length: 4,
            path_cutoff: 0.0,
            max_paths: 0,
            num_threads: None,
            seed: None,
            resume: false,
            hypervolume_tools: None,
            quiet: false,
        }
    }
}

impl OptimizerConfig {
    /// Check option ranges and the artifact dependency chain.
    pub fn validate(&self) -> Result<(), NeticError> {
        self.artifacts.validate()?;
        if self.population_size < 2 {
            return Err(NeticError::ConfigError(
                "population size must be at least 2".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(NeticError::ConfigError(format!(
                "mutation chance {} is outside [0, 1]",
                self.mutation_chance
            )));
        }
        if !(0.0..=1.0).contains(&self.focus_fraction) {
            return Err(NeticError::ConfigError(format!(
                "focus fraction {} is outside [0, 1]",
                self.focus_fraction
            )));
        }
        if self.window_count == 0 {
            return Err(NeticError::ConfigError("window count must be positive".into()));
        }
        if self.min_window_size > self.max_window_size {
            return Err(NeticError::ConfigError(format!(
                "minimum window size {} exceeds maximum {}",
                self.min_window_size, self.max_window_size
            )));
        }
        if self.target_network_size == 0 || self.initial_populations == 0 {
            return Err(NeticError::ConfigError(
                "target network size and initial populations must be positive".into(),
            ));
        }
        if self.path_types.is_empty() {
            return Err(NeticError::ConfigError("no path types given".into()));
        }
        Ok(())
    }

    /// Population size rounded down to an even number.
    #[must_use]
    pub fn even_population_size(&self) -> usize {
        self.population_size - self.population_size % 2
    }

    /// Directory with the gene and interaction-type indexes.
    #[must_use]
    pub fn index_dir(&self) -> PathBuf {
        self.artifacts
            .index
            .clone()
            .unwrap_or_else(|| self.output_folder.clone())
    }

    /// Path list of `path_type`.
    #[must_use]
    pub fn paths_file(&self, path_type: &str) -> PathBuf {
        self.artifacts
            .paths
            .clone()
            .unwrap_or_else(|| {
                self.output_folder
                    .join(format!("paths_{}", self.path_length))
            })
            .join(path_type)
            .join("paths.txt")
    }

    /// Directory of compiled circuits of `path_type`.
    #[must_use]
    pub fn circuits_dir(&self, path_type: &str) -> PathBuf {
        let base = self.artifacts.circuits.clone().unwrap_or_else(|| {
            let name = if self.max_paths == 0 {
                format!("NF_{}", self.path_length)
            } else {
                format!("NF_{}_{}", self.path_length, self.max_paths)
            };
            self.output_folder.join(name)
        });
        base.join(path_type)
    }

    #[must_use]
    pub fn multi_objective_dir(&self) -> PathBuf {
        self.output_folder.join("MO")
    }

    #[must_use]
    pub fn population_dir(&self) -> PathBuf {
        self.multi_objective_dir().join("population")
    }

    #[must_use]
    pub fn fronts_dir(&self) -> PathBuf {
        self.output_folder.join("fronts")
    }

    /// Results directory, `<output>/optimization_<population size>`.
    #[must_use]
    pub fn optimization_dir(&self) -> PathBuf {
        self.output_folder
            .join(format!("optimization_{}", self.population_size))
    }
}
