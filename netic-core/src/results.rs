use std::path::PathBuf;
use std::time::Duration;

use crate::subnetwork::Subnetwork;

/// Outcome of a [`MultiObjectiveRunner`](crate::engine::MultiObjectiveRunner) run.
///
/// # Examples
///
/// ```rust,no_run
/// use netic_core::config::OptimizerConfig;
/// use netic_core::engine::MultiObjectiveRunner;
///
/// let runner = MultiObjectiveRunner::new(OptimizerConfig::default())?;
/// let results = runner.run()?;
/// for network in &results.networks {
///     println!("{} interactions, scores {:?}", network.size(), network.scores());
/// }
/// println!("best generation {}", results.best_generation);
/// # Ok::<(), netic_core::types::NeticError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptimizationResults {
    /// Distinct networks of the best population, scored.
    pub networks: Vec<Subnetwork>,

    /// Hypervolume of the first front, per generation.
    pub hypervolumes: Vec<f64>,

    /// Generation whose population was returned.
    pub best_generation: usize,

    /// Result files, one per network in `networks`.
    pub files: Vec<PathBuf>,

    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl OptimizationResults {
    /// Highest hypervolume reached, or 0 when no generation ran.
    #[must_use]
    pub fn best_hypervolume(&self) -> f64 {
        self.hypervolumes.iter().copied().fold(0.0, f64::max)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
